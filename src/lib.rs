//! OpenID Connect relying party gateway.
//!
//! [`Gateway`] exposes the three entry points a transport layer calls: login,
//! callback and userinfo. It owns the service [`AppState`], that is the client
//! registry and the session store, and delegates to the `domain` use cases.
//!
//! ```rust,ignore
//! let gateway = Gateway::from_config(Config::new())?;
//! let auth_url = gateway.login("github", None).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::*;
use tokio::task::JoinHandle;
use url::Url;

pub use domain::callback::{CallbackOutcome, DEFAULT_REDIRECT_URL};
pub use domain::error::{DomainErrorKind, Error};
pub use domain::User;
pub use service::{config::Config, AppState};

/// Scopes requested when the caller names none.
pub const DEFAULT_SCOPES: [&str; 5] = ["openid", "profile", "email", "phone", "address"];

#[derive(Clone)]
pub struct Gateway {
    app_state: AppState,
}

impl Gateway {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Build the client registry and an in-memory session store from `config`.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let app_state = AppState::from_config(config)?;
        info!(
            "OIDC gateway ready with providers: {}",
            app_state.registry_ref().provider_names().join(", ")
        );
        Ok(Self::new(app_state))
    }

    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Purge expired sessions every `every` in a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session_cleanup(&self, every: Duration) -> JoinHandle<()> {
        service::spawn_session_cleanup(Arc::clone(&self.app_state.sessions), every)
    }

    /// Start a login with the default scopes.
    pub async fn login(&self, provider_name: &str, back_url: Option<String>) -> Result<Url, Error> {
        let scopes: Vec<String> = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        self.login_with_scopes(provider_name, &scopes, back_url)
            .await
    }

    /// Start a login and return the provider URL to redirect the caller to.
    pub async fn login_with_scopes(
        &self,
        provider_name: &str,
        scopes: &[String],
        back_url: Option<String>,
    ) -> Result<Url, Error> {
        domain::login::login(
            self.app_state.registry_ref(),
            self.app_state.sessions_ref(),
            provider_name,
            scopes,
            back_url,
        )
        .await
        .map_err(|e| log_failure("login", e))
    }

    /// Finish a login from the parameters the provider redirected back with.
    pub async fn callback(
        &self,
        provider_name: &str,
        code: &str,
        state: &str,
        temp_session_id: &str,
    ) -> Result<CallbackOutcome, Error> {
        domain::callback::callback(
            self.app_state.registry_ref(),
            self.app_state.sessions_ref(),
            provider_name,
            code,
            state,
            temp_session_id,
        )
        .await
        .map_err(|e| log_failure("callback", e))
    }

    /// Current profile of the user owning `session_id`.
    ///
    /// On failure the caller should forget its reference to the session.
    pub async fn userinfo(&self, session_id: &str) -> Result<User, Error> {
        domain::userinfo::userinfo(
            self.app_state.registry_ref(),
            self.app_state.sessions_ref(),
            session_id,
        )
        .await
        .map_err(|e| log_failure("userinfo", e))
    }
}

fn log_failure(action: &str, err: Error) -> Error {
    match err.error_kind {
        DomainErrorKind::Internal(_) => error!("oidc {} failed: {}", action, err),
        _ => warn!("oidc {} failed: {}", action, err),
    }
    err
}

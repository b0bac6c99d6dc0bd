//! Complete an authorization code flow and open a persistent session.

use log::*;
use oidc_auth::client::UrlParam;
use oidc_auth::session::{AuthData, Manager, Session, SessionData};
use oidc_auth::User;

use crate::error::{DomainErrorKind, Error};
use crate::{session_lookup_error, Registry};

/// Redirect target used when the login carried none.
pub const DEFAULT_REDIRECT_URL: &str = "/";

/// Result of a successful callback.
#[derive(Debug)]
pub struct CallbackOutcome {
    /// The new persistent session, owned by `user`.
    pub session: Session,
    /// The profile fetched with the freshly issued tokens.
    pub user: User,
    /// Where the caller asked to land after login.
    pub redirect_url: String,
}

fn unauthorized(message: &str) -> Error {
    Error::new(DomainErrorKind::UserUnauthorized, message)
}

/// Exchange the authorization code delivered to the callback for tokens, fetch
/// the user and store both in a new persistent session.
///
/// The temporary session named by `temp_session_id` is consumed: it is taken out
/// of the store in one step before any call to the provider, so that of several
/// callbacks racing on the same id only one proceeds.
pub async fn callback(
    registry: &Registry,
    sessions: &dyn Manager,
    provider_name: &str,
    code: &str,
    state: &str,
    temp_session_id: &str,
) -> Result<CallbackOutcome, Error> {
    let client = registry
        .get_client(provider_name)
        .map_err(|e| Error::from(e).with_kind(DomainErrorKind::EntityNotFound))?;

    let temp = sessions
        .take_temp(temp_session_id)
        .await
        .map_err(|e| session_lookup_error(e, "tempSessId", temp_session_id))?;
    let pending = match temp.data {
        SessionData::Pending(pending) => pending,
        SessionData::Authenticated(_) => {
            return Err(unauthorized("session is not a temporary session")
                .with_field("tempSessId", temp_session_id))
        }
    };

    if code.is_empty() {
        return Err(unauthorized("authorization code is empty")
            .with_field("providerName", provider_name)
            .with_field("tempSessId", temp_session_id));
    }

    let security = client.security();
    let mut params = Vec::new();
    if security.supports_state && pending.state.as_deref() != Some(state) {
        return Err(unauthorized("state doesn't match")
            .with_field("providerName", provider_name)
            .with_field("tempSessId", temp_session_id));
    }
    if security.supports_pkce {
        let verifier = pending.code_verifier.ok_or_else(|| {
            unauthorized("code verifier missing from temporary session")
                .with_field("providerName", provider_name)
                .with_field("tempSessId", temp_session_id)
        })?;
        params.push(UrlParam::new("code_verifier", verifier));
    }

    let token = client
        .fetch_token_by_code(code, temp_session_id, &params)
        .await
        .map_err(|e| {
            Error::from(e)
                .with_kind(DomainErrorKind::UserUnauthorized)
                .with_field("tempSessId", temp_session_id)
                .with_field("oidcCode", code)
        })?;

    let user = client.fetch_user_by_token(&token).await.map_err(|e| {
        Error::from(e)
            .with_kind(DomainErrorKind::UserUnauthorized)
            .with_field("tempSessId", temp_session_id)
    })?;
    if user.id.is_empty() {
        return Err(unauthorized("provider returned a user without id")
            .with_field("providerName", provider_name));
    }

    let session = sessions
        .create(&user.id, AuthData::new(provider_name, &token))
        .await
        .map_err(|e| {
            Error::from(e)
                .with_field("providerName", provider_name)
                .with_field("userId", &user.id)
        })?;

    info!(
        "User {} logged in with provider {} in session {}",
        user.id, provider_name, session.id
    );

    let redirect_url = pending
        .back_url
        .filter(|back_url| !back_url.is_empty())
        .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());

    Ok(CallbackOutcome {
        session,
        user,
        redirect_url,
    })
}

//! Start an authorization code flow with a provider.

use log::*;
use oidc_auth::client::UrlParam;
use oidc_auth::session::{Manager, PendingLogin};
use url::Url;

use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::{destroy_quietly, Registry};

/// Create a temporary session for a new login and return the provider's
/// authorization URL to redirect the caller to.
///
/// The state value and PKCE verifier, when the client asks for them, are kept
/// in the temporary session so that [`crate::callback::callback`] can check them.
pub async fn login(
    registry: &Registry,
    sessions: &dyn Manager,
    provider_name: &str,
    scopes: &[String],
    back_url: Option<String>,
) -> Result<Url, Error> {
    let client = registry
        .get_client(provider_name)
        .map_err(|e| Error::from(e).with_kind(DomainErrorKind::EntityNotFound))?;

    let security = client.security();
    let mut pending = PendingLogin {
        back_url,
        ..PendingLogin::default()
    };
    let mut state = String::new();
    let mut params = Vec::new();

    if security.supports_state || security.supports_pkce {
        let generator = security.generator.as_ref().ok_or_else(|| {
            Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                "client requires state or PKCE but has no generator",
            )
            .with_field("providerName", provider_name)
        })?;

        if security.supports_state {
            state = generator.state();
            pending.state = Some(state.clone());
        }
        if security.supports_pkce {
            let challenge = generator.code_challenge_verifier();
            params.push(UrlParam::new("code_challenge", challenge.challenge));
            params.push(UrlParam::new("code_challenge_method", challenge.method));
            pending.code_verifier = Some(challenge.verifier);
        }
    }

    let session = sessions
        .create_temp(pending)
        .await
        .map_err(|e| Error::from(e).with_field("providerName", provider_name))?;

    match client.build_auth_url(&state, scopes, &session.id, &params) {
        Ok(auth_url) => {
            debug!(
                "Started login with provider {} in temporary session {}",
                provider_name, session.id
            );
            Ok(auth_url)
        }
        Err(e) => {
            destroy_quietly(sessions, &session.id).await;
            Err(Error::from(e)
                .with_field("providerName", provider_name)
                .with_field("tempSessId", &session.id))
        }
    }
}

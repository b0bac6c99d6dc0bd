//! Provider clients for the OAuth 2.0 authorization code flow.

mod config;
mod generic;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::Error;
use crate::pkce::Generator;
use crate::token::Token;
use crate::user::User;

pub use config::{ProviderConfig, UserInfoMethod};
pub use generic::{GenericClient, REDIRECT_TOKEN_PARAM};

/// Extra query or form parameter passed along with a provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParam {
    pub key: String,
    pub value: String,
}

impl UrlParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// State and PKCE capabilities of a client.
///
/// Flow code queries this instead of assuming a client binds state or uses PKCE.
#[derive(Clone, Default)]
pub struct Security {
    pub supports_state: bool,
    pub supports_pkce: bool,
    /// Present whenever either capability is enabled.
    pub generator: Option<Arc<dyn Generator>>,
}

impl Security {
    /// A client with neither state binding nor PKCE.
    pub fn none() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Security")
            .field("supports_state", &self.supports_state)
            .field("supports_pkce", &self.supports_pkce)
            .field(
                "generator",
                &self.generator.as_ref().map(|generator| generator.method()),
            )
            .finish()
    }
}

/// Trait for authorization code flow clients, one per identity provider.
#[async_trait]
pub trait Client: Send + Sync {
    /// Name of the provider this client talks to.
    fn provider_name(&self) -> &str;

    /// Build the authorization endpoint URL the browser is redirected to.
    ///
    /// # Arguments
    ///
    /// * `state` - CSRF state value, omitted from the URL when empty
    /// * `scopes` - Requested scopes, space-joined, omitted when empty
    /// * `temp_session_id` - Embedded in the redirect URL as the `token` parameter
    /// * `params` - Extra parameters such as the PKCE challenge
    fn build_auth_url(
        &self,
        state: &str,
        scopes: &[String],
        temp_session_id: &str,
        params: &[UrlParam],
    ) -> Result<Url, Error>;

    /// Exchange an authorization code for tokens.
    async fn fetch_token_by_code(
        &self,
        code: &str,
        temp_session_id: &str,
        params: &[UrlParam],
    ) -> Result<Token, Error>;

    /// Fetch the user profile with an access token.
    async fn fetch_user_by_token(&self, token: &Token) -> Result<User, Error>;

    /// Obtain new tokens with the refresh token of `token`.
    async fn refresh_token(&self, token: &Token) -> Result<Token, Error>;

    /// State and PKCE capabilities of this client.
    fn security(&self) -> Security {
        Security::none()
    }
}

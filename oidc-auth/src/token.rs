//! OAuth token types.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{client_error, ClientErrorKind, Error};

/// Tokens issued by a provider's token endpoint.
///
/// A token is valid when the access token is non-empty and the refresh token,
/// if present, is non-empty too.
#[derive(Debug, Clone)]
pub struct Token {
    /// Access token for userinfo requests.
    pub access: SecretString,
    /// Refresh token for obtaining new access tokens.
    pub refresh: Option<SecretString>,
}

impl Token {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: SecretString::new(access.into()),
            refresh: refresh.map(SecretString::new),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.access.expose_secret().is_empty()
            && self
                .refresh
                .as_ref()
                .map_or(true, |refresh| !refresh.expose_secret().is_empty())
    }

    pub fn access_token(&self) -> &str {
        self.access.expose_secret()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh.as_ref().map(|refresh| refresh.expose_secret().as_str())
    }
}

/// Raw token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Convert into a validated [`Token`]. An empty refresh token counts as absent.
    pub(crate) fn into_token(self) -> Result<Token, Error> {
        let refresh = self.refresh_token.filter(|refresh| !refresh.is_empty());
        let token = Token::new(self.access_token, refresh);
        if !token.is_valid() {
            return Err(client_error(
                ClientErrorKind::InvalidToken,
                "token data is invalid",
            ));
        }
        Ok(token)
    }
}

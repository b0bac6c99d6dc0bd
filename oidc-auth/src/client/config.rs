//! Per-provider configuration, loaded once at startup.

use secrecy::SecretString;
use serde::Deserialize;

use crate::decoder;
use crate::pkce::{MIN_LENGTH, METHOD_S256};

/// HTTP method used against a provider's userinfo endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserInfoMethod {
    #[default]
    Get,
    Post,
}

/// Configuration of a single identity provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Unique provider name, used in routes and in the redirect URL.
    pub provider_name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Authorization endpoint the browser is redirected to.
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Userinfo endpoint queried with the access token.
    pub user_info_url: String,
    #[serde(default)]
    pub use_state: bool,
    #[serde(default, alias = "usePKCE")]
    pub use_pkce: bool,
    /// `plain` or `S256`; anything else is treated as `S256`.
    #[serde(default = "default_pkce_method", alias = "PKCEMethod")]
    pub pkce_method: String,
    #[serde(default = "default_length")]
    pub state_length: usize,
    #[serde(default = "default_length", alias = "PKCEChallengeLength")]
    pub pkce_challenge_length: usize,
    /// Name of the registered user-info decoder.
    #[serde(default = "default_decoder", alias = "userInfoUnmarshaler")]
    pub user_info_decoder: String,
    #[serde(default)]
    pub user_info_method: UserInfoMethod,
    #[serde(default)]
    pub disable_tls_verify: bool,
}

fn default_pkce_method() -> String {
    METHOD_S256.to_string()
}

fn default_length() -> usize {
    MIN_LENGTH
}

fn default_decoder() -> String {
    decoder::JSON.to_string()
}

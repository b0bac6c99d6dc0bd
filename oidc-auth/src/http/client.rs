//! HTTP client builder for provider token and userinfo calls.

use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Skip TLS certificate verification. Only meant for development providers.
    pub disable_tls_verify: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("oidc-auth/{}", env!("CARGO_PKG_VERSION")),
            disable_tls_verify: false,
        }
    }
}

/// Builder for the HTTP clients used by provider clients.
///
/// Outbound calls are never retried here; a failed call is reported to the caller.
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Toggle TLS certificate verification.
    pub fn with_disable_tls_verify(mut self, disable: bool) -> Self {
        self.config.disable_tls_verify = disable;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .danger_accept_invalid_certs(self.config.disable_tls_verify)
            .build()
    }
}

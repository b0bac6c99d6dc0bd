//! Fixtures shared by the use case tests.

use std::sync::Arc;

use async_trait::async_trait;
use oidc_auth::client::{Client, ProviderConfig, UrlParam, UserInfoMethod};
use oidc_auth::decoder;
use oidc_auth::error::{client_error, ClientErrorKind, Error};
use oidc_auth::http::HttpClientConfig;
use oidc_auth::registry::{Registry, RegistryOptions};
use oidc_auth::session::{AuthData, InMemoryManager, Manager, PendingLogin, Session};
use oidc_auth::{Token, User};
use secrecy::SecretString;
use url::Url;

pub(crate) fn provider_config(name: &str, server_url: &str) -> ProviderConfig {
    ProviderConfig {
        provider_name: name.to_string(),
        client_id: "client_id".to_string(),
        client_secret: SecretString::new("client_secret".to_string()),
        auth_url: format!("{}/authorize", server_url),
        token_url: format!("{}/token", server_url),
        user_info_url: format!("{}/userinfo", server_url),
        use_state: true,
        use_pkce: true,
        pkce_method: "S256".to_string(),
        state_length: 32,
        pkce_challenge_length: 43,
        user_info_decoder: "json".to_string(),
        user_info_method: UserInfoMethod::Get,
        disable_tls_verify: false,
    }
}

pub(crate) fn registry(configs: &[ProviderConfig]) -> Registry {
    let options = RegistryOptions {
        service_domain: "https://gateway.test".to_string(),
        callback_path: "/oauth/callback".to_string(),
        http: HttpClientConfig::default(),
    };
    Registry::build(configs, &options, &decoder::Registry::new()).unwrap()
}

pub(crate) fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// The temporary session id embedded in the redirect URL of an authorization URL.
pub(crate) fn temp_session_id(auth_url: &Url) -> String {
    let redirect = query_value(auth_url, "redirect_uri").unwrap();
    query_value(&Url::parse(&redirect).unwrap(), "token").unwrap()
}

/// A client whose every operation fails.
struct FailingClient {
    provider_name: String,
}

#[async_trait]
impl Client for FailingClient {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn build_auth_url(
        &self,
        _state: &str,
        _scopes: &[String],
        _temp_session_id: &str,
        _params: &[UrlParam],
    ) -> Result<Url, Error> {
        Err(client_error(ClientErrorKind::InvalidUrl, "cannot build url"))
    }

    async fn fetch_token_by_code(
        &self,
        _code: &str,
        _temp_session_id: &str,
        _params: &[UrlParam],
    ) -> Result<Token, Error> {
        Err(client_error(ClientErrorKind::TokenExchangeFailed, "exchange failed"))
    }

    async fn fetch_user_by_token(&self, _token: &Token) -> Result<User, Error> {
        Err(client_error(ClientErrorKind::UserInfoFailed, "userinfo failed"))
    }

    async fn refresh_token(&self, _token: &Token) -> Result<Token, Error> {
        Err(client_error(ClientErrorKind::TokenRefreshFailed, "refresh failed"))
    }
}

pub(crate) fn failing_client(name: &str) -> Arc<dyn Client> {
    Arc::new(FailingClient {
        provider_name: name.to_string(),
    })
}

/// Session store that yields to the scheduler before every operation, the way a
/// store behind a network round trip would.
pub(crate) struct YieldingManager {
    inner: InMemoryManager,
}

impl YieldingManager {
    pub(crate) fn new(inner: InMemoryManager) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &InMemoryManager {
        &self.inner
    }
}

#[async_trait]
impl Manager for YieldingManager {
    async fn create_temp(&self, data: PendingLogin) -> Result<Session, Error> {
        tokio::task::yield_now().await;
        self.inner.create_temp(data).await
    }

    async fn create(&self, user_id: &str, data: AuthData) -> Result<Session, Error> {
        tokio::task::yield_now().await;
        self.inner.create(user_id, data).await
    }

    async fn get(&self, id: &str) -> Result<Session, Error> {
        tokio::task::yield_now().await;
        self.inner.get(id).await
    }

    async fn take_temp(&self, id: &str) -> Result<Session, Error> {
        tokio::task::yield_now().await;
        self.inner.take_temp(id).await
    }

    async fn destroy(&self, id: &str) -> Result<(), Error> {
        tokio::task::yield_now().await;
        self.inner.destroy(id).await
    }
}

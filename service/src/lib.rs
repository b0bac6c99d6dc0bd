use config::Config;
use log::info;
use oidc_auth::decoder;
use oidc_auth::error::Error;
use oidc_auth::http::HttpClientConfig;
use oidc_auth::registry::{Registry, RegistryOptions};
use oidc_auth::session::{InMemoryManager, Manager};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// Build the client registry from the configured providers.
pub fn init_registry(config: &Config, decoders: &decoder::Registry) -> Result<Registry, Error> {
    let options = RegistryOptions {
        service_domain: config.service_domain().to_string(),
        callback_path: config.callback_path().to_string(),
        http: HttpClientConfig {
            timeout: config.http_timeout(),
            disable_tls_verify: config.disable_tls_verify,
            ..HttpClientConfig::default()
        },
    };
    info!(
        "Provider client config: service_domain={}, callback_path={}, http_timeout={}s",
        options.service_domain,
        options.callback_path,
        config.http_timeout_secs,
    );

    Registry::build(&config.oidc_providers()?, &options, decoders)
}

/// Build the in-memory session store with the configured lifetimes.
pub fn init_sessions(config: &Config) -> Result<InMemoryManager, Error> {
    Ok(InMemoryManager::with_ttl(
        config.temp_session_ttl()?,
        config.session_expiry()?,
    ))
}

/// Periodically purge expired sessions until the runtime shuts down.
///
/// Must be called from within a tokio runtime.
pub fn spawn_session_cleanup(
    sessions: Arc<dyn Manager>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            sessions.cleanup_expired().await;
        }
    })
}

// Service-level state containing only infrastructure concerns
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<Registry>,
    pub sessions: Arc<dyn Manager>,
}

impl AppState {
    pub fn new(app_config: Config, registry: Registry, sessions: Arc<dyn Manager>) -> Self {
        Self {
            config: app_config,
            registry: Arc::new(registry),
            sessions,
        }
    }

    /// Build the registry and an in-memory session store from configuration.
    pub fn from_config(app_config: Config) -> Result<Self, Error> {
        let registry = init_registry(&app_config, &decoder::Registry::new())?;
        let sessions = init_sessions(&app_config)?;
        Ok(Self::new(app_config, registry, Arc::new(sessions)))
    }

    pub fn registry_ref(&self) -> &Registry {
        self.registry.as_ref()
    }

    pub fn sessions_ref(&self) -> &dyn Manager {
        self.sessions.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use oidc_auth::error::{ErrorKind, RegistryErrorKind, SessionErrorKind};
    use oidc_auth::session::PendingLogin;

    const PROVIDERS: &str = r#"[{
        "providerName": "github",
        "clientId": "id",
        "clientSecret": "secret",
        "authUrl": "https://github.com/login/oauth/authorize",
        "tokenUrl": "https://github.com/login/oauth/access_token",
        "userInfoUrl": "https://api.github.com/user",
        "usePkce": true
    }]"#;

    fn config(providers: &str) -> Config {
        Config::parse_from([
            "oidc_gateway_rs",
            "--service-domain",
            "https://gateway.test",
            "--oidc-providers",
            providers,
        ])
    }

    #[test]
    fn test_from_config_builds_registry() {
        let app_state = AppState::from_config(config(PROVIDERS)).unwrap();
        let client = app_state.registry_ref().get_client("github").unwrap();
        assert!(client.security().supports_pkce);
        assert!(!client.security().supports_state);
    }

    #[test]
    fn test_from_config_without_providers_fails() {
        let err = AppState::from_config(config("[]")).err().unwrap();
        assert_eq!(err.error_kind, ErrorKind::Registry(RegistryErrorKind::NoProviders));
    }

    #[tokio::test]
    async fn test_sessions_use_configured_temp_ttl() {
        let config = Config::parse_from(["oidc_gateway_rs", "--temp-session-ttl-seconds", "0"]);
        let sessions = init_sessions(&config).unwrap();
        let session = sessions.create_temp(PendingLogin::default()).await.unwrap();
        assert!(sessions.get(&session.id).await.is_err());
        assert_eq!(sessions.cleanup_expired().await, 1);
    }

    #[tokio::test]
    async fn test_spawned_cleanup_purges_expired_sessions() {
        let config = Config::parse_from(["oidc_gateway_rs", "--temp-session-ttl-seconds", "0"]);
        let sessions = init_sessions(&config).unwrap();
        sessions.create_temp(PendingLogin::default()).await.unwrap();

        let handle = spawn_session_cleanup(
            Arc::new(sessions.clone()),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(sessions.is_empty().await);
    }

    #[test]
    fn test_from_config_rejects_out_of_range_lifetimes() {
        for (flag, value) in [
            ("--temp-session-ttl-seconds", "100000000000000"),
            ("--session-expiry-seconds", "18446744073709551615"),
        ] {
            let config = Config::parse_from([
                "oidc_gateway_rs",
                "--service-domain",
                "https://gateway.test",
                "--oidc-providers",
                PROVIDERS,
                flag,
                value,
            ]);
            let err = AppState::from_config(config).err().unwrap();
            assert_eq!(err.error_kind, ErrorKind::Session(SessionErrorKind::Storage));
        }
    }
}

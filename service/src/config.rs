use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use oidc_auth::client::ProviderConfig;
use oidc_auth::error::{session_error, Error, ErrorKind, RegistryErrorKind, SessionErrorKind};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default public base URL of the gateway.
pub const DEFAULT_SERVICE_DOMAIN: &str = "http://localhost:8080";

/// Default path of the OAuth callback route.
pub const DEFAULT_CALLBACK_PATH: &str = "/oauth/callback";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Public base URL of this service, used to build each provider's redirect URL.
    #[arg(long, env, default_value = DEFAULT_SERVICE_DOMAIN)]
    service_domain: String,

    /// Path of the OAuth callback route appended to the service domain.
    #[arg(long, env, default_value = DEFAULT_CALLBACK_PATH)]
    callback_path: String,

    /// JSON array of identity provider configurations.
    #[arg(long, env, default_value = "[]")]
    oidc_providers: String,

    /// Skip TLS certificate verification for every provider. Development only.
    #[arg(long, env, default_value_t = false)]
    pub disable_tls_verify: bool,

    /// Timeout in seconds for outbound token and userinfo requests
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Seconds a login may stay in progress before its temporary session expires
    #[arg(long, env, default_value_t = 600)]
    pub temp_session_ttl_seconds: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Session expiry duration in seconds (default: 24 hours = 86400 seconds)
    #[arg(long, env, default_value_t = 86400)]
    pub session_expiry_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    pub fn set_oidc_providers(mut self, oidc_providers: String) -> Self {
        self.oidc_providers = oidc_providers;
        self
    }

    /// Parses the configured provider list.
    pub fn oidc_providers(&self) -> Result<Vec<ProviderConfig>, Error> {
        serde_json::from_str(&self.oidc_providers).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Registry(RegistryErrorKind::InvalidProvider),
            fields: vec![("setting".to_string(), "OIDC_PROVIDERS".to_string())],
        })
    }

    /// Lifetime of the temporary session opened by each login.
    pub fn temp_session_ttl(&self) -> Result<chrono::Duration, Error> {
        ttl_setting(self.temp_session_ttl_seconds, "TEMP_SESSION_TTL_SECONDS")
    }

    /// Lifetime of a persistent session.
    pub fn session_expiry(&self) -> Result<chrono::Duration, Error> {
        ttl_setting(self.session_expiry_seconds, "SESSION_EXPIRY_SECONDS")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

// A TTL must fit a chrono duration and still leave room to be added to the current time.
fn ttl_setting(seconds: u64, setting: &str) -> Result<chrono::Duration, Error> {
    i64::try_from(seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| {
            session_error(SessionErrorKind::Storage, "session lifetime out of range")
                .with_field("setting", setting)
                .with_field("seconds", seconds)
        })
}

//! Error types for the `domain` layer.
use oidc_auth::error::{Error as OidcAuthError, ErrorKind as OidcAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// The flow use cases own the final classification of every failure: errors from
/// `oidc_auth` arrive as `Internal` and each flow step reassigns the kind that
/// describes what went wrong from the caller's point of view. The `source` keeps
/// the original error and `fields` carry the contextual annotations (provider
/// name, session id, ...) gathered on the way up. Only `error_kind` and
/// `public_message()` are meant to reach a caller.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
    pub fields: Vec<(String, String)>,
}

/// Caller-facing taxonomy of flow failures.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    /// Unknown provider, or a provider that is no longer configured.
    EntityNotFound,
    /// Missing temporary or persistent session, state mismatch, failed code
    /// exchange or profile fetch.
    UserUnauthorized,
    /// A persistent session exists but its authentication data is unusable.
    SessionInterrupt,
    Internal(InternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Network,
    Session,
    Provider,
    Other(String),
}

impl DomainErrorKind {
    /// Stable numeric code of this kind.
    pub fn code(&self) -> u32 {
        match self {
            DomainErrorKind::UserUnauthorized => 30401,
            DomainErrorKind::EntityNotFound => 30404,
            DomainErrorKind::Internal(_) => 30500,
            DomainErrorKind::SessionInterrupt => 30501,
        }
    }
}

impl Error {
    pub fn new(error_kind: DomainErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind,
            fields: Vec::new(),
        }
    }

    /// Reassign the kind while keeping source and fields.
    pub fn with_kind(mut self, error_kind: DomainErrorKind) -> Self {
        self.error_kind = error_kind;
        self
    }

    pub fn with_field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up a field attached here or in the `oidc_auth` error this one wraps.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn code(&self) -> u32 {
        self.error_kind.code()
    }

    /// Generic message that is safe to show to a caller.
    pub fn public_message(&self) -> &'static str {
        match self.error_kind {
            DomainErrorKind::EntityNotFound => "providerName is missing or invalid",
            DomainErrorKind::UserUnauthorized => "unauthorized",
            DomainErrorKind::SessionInterrupt => "session interrupted, please log in again",
            DomainErrorKind::Internal(_) => "internal server error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error {}: {:?}", self.code(), self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `oidc_auth` layer to the `domain` layer.
impl From<OidcAuthError> for Error {
    fn from(err: OidcAuthError) -> Self {
        let internal_kind = match &err.error_kind {
            OidcAuthErrorKind::Pkce(_) | OidcAuthErrorKind::Registry(_) => InternalErrorKind::Config,
            OidcAuthErrorKind::Http(_) => InternalErrorKind::Network,
            OidcAuthErrorKind::Session(_) => InternalErrorKind::Session,
            OidcAuthErrorKind::Client(_) | OidcAuthErrorKind::Decoder(_) => {
                InternalErrorKind::Provider
            }
        };
        let fields = err.fields.clone();
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(internal_kind),
            fields,
        }
    }
}

//! Error types for the `oidc-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.
//! Each error also carries a list of contextual fields (provider name, session id, ...)
//! that upper layers extend while the error travels up, without losing the original cause.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for oidc-auth crate.
/// Holds error kind, contextual fields and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
    pub fields: Vec<(String, String)>,
}

/// Major categories of errors in oidc-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Pkce(PkceErrorKind),
    Client(ClientErrorKind),
    Decoder(DecoderErrorKind),
    Registry(RegistryErrorKind),
    Session(SessionErrorKind),
    Http(HttpErrorKind),
}

/// Errors from PKCE/state generator construction.
#[derive(Debug, PartialEq)]
pub enum PkceErrorKind {
    InvalidStateLength,
    InvalidChallengeLength,
}

/// Errors from provider client operations.
#[derive(Debug, PartialEq)]
pub enum ClientErrorKind {
    InvalidUrl,
    InvalidToken,
    MissingRefreshToken,
    TokenExchangeFailed,
    TokenRefreshFailed,
    UserInfoFailed,
    InvalidResponse,
}

/// Errors from user-info decoding.
#[derive(Debug, PartialEq)]
pub enum DecoderErrorKind {
    UnknownDecoder,
    MalformedPayload,
}

/// Errors from client registry construction and lookup.
#[derive(Debug, PartialEq)]
pub enum RegistryErrorKind {
    NoProviders,
    DuplicateProvider,
    InvalidProvider,
    NotFound,
}

/// Errors from session manager operations.
#[derive(Debug, PartialEq)]
pub enum SessionErrorKind {
    NotFound,
    Storage,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Timeout,
    Network,
}

impl Error {
    /// Attach a contextual key/value annotation to this error.
    pub fn with_field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up the most recently attached value for `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Pkce(kind) => write!(f, "PKCE error: {:?}", kind)?,
            ErrorKind::Client(kind) => write!(f, "Client error: {:?}", kind)?,
            ErrorKind::Decoder(kind) => write!(f, "Decoder error: {:?}", kind)?,
            ErrorKind::Registry(kind) => write!(f, "Registry error: {:?}", kind)?,
            ErrorKind::Session(kind) => write!(f, "Session error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
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

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
            fields: Vec::new(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Client(ClientErrorKind::InvalidUrl),
            fields: Vec::new(),
        }
    }
}

fn error_with_message(error_kind: ErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind,
        fields: Vec::new(),
    }
}

/// Helper function to create PKCE errors.
pub fn pkce_error(kind: PkceErrorKind, message: &str) -> Error {
    error_with_message(ErrorKind::Pkce(kind), message)
}

/// Helper function to create provider client errors.
pub fn client_error(kind: ClientErrorKind, message: &str) -> Error {
    error_with_message(ErrorKind::Client(kind), message)
}

/// Helper function to create decoder errors.
pub fn decoder_error(kind: DecoderErrorKind, message: &str) -> Error {
    error_with_message(ErrorKind::Decoder(kind), message)
}

/// Helper function to create registry errors.
pub fn registry_error(kind: RegistryErrorKind, message: &str) -> Error {
    error_with_message(ErrorKind::Registry(kind), message)
}

/// Helper function to create session errors.
pub fn session_error(kind: SessionErrorKind, message: &str) -> Error {
    error_with_message(ErrorKind::Session(kind), message)
}

//! Sessions tying an in-progress login to the authenticated session it becomes.
//!
//! A temporary session holds [`PendingLogin`] data between the redirect to the
//! provider and the callback. A persistent session is owned by a user and holds
//! [`AuthData`]. Both share one [`Session`] representation and one [`Manager`].

mod memory;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;
use crate::token::Token;

pub use memory::InMemoryManager;

/// Login state carried by a temporary session.
#[derive(Debug, Clone, Default)]
pub struct PendingLogin {
    /// Expected `state` value when the provider binds state.
    pub state: Option<String>,
    /// PKCE verifier to present at the token endpoint.
    pub code_verifier: Option<String>,
    /// Where to send the caller once logged in.
    pub back_url: Option<String>,
}

impl PendingLogin {
    /// Seed data carrying only a post-login redirect target.
    pub fn with_back_url(back_url: impl Into<String>) -> Self {
        Self {
            back_url: Some(back_url.into()),
            ..Self::default()
        }
    }
}

/// Authentication data carried by a persistent session.
#[derive(Debug, Clone)]
pub struct AuthData {
    pub provider_name: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

impl AuthData {
    pub fn new(provider_name: impl Into<String>, token: &Token) -> Self {
        Self {
            provider_name: provider_name.into(),
            access_token: token.access.clone(),
            refresh_token: token.refresh.clone(),
        }
    }

    /// Valid when both the provider name and the access token are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.provider_name.is_empty() && !self.access_token.expose_secret().is_empty()
    }

    /// The stored tokens. An empty stored refresh token reads as absent.
    pub fn token(&self) -> Token {
        Token {
            access: self.access_token.clone(),
            refresh: self
                .refresh_token
                .clone()
                .filter(|refresh| !refresh.expose_secret().is_empty()),
        }
    }
}

/// Phase-specific session payload.
#[derive(Debug, Clone)]
pub enum SessionData {
    Pending(PendingLogin),
    Authenticated(AuthData),
}

/// A stored session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque, unguessable identifier.
    pub id: String,
    /// Owning user; `None` for temporary sessions.
    pub user_id: Option<String>,
    pub data: SessionData,
}

impl Session {
    pub fn is_temporary(&self) -> bool {
        self.user_id.is_none()
    }

    /// Pending login data, if this is a temporary session.
    pub fn pending(&self) -> Option<&PendingLogin> {
        match &self.data {
            SessionData::Pending(pending) => Some(pending),
            SessionData::Authenticated(_) => None,
        }
    }

    /// Authentication data, if this is a persistent session.
    pub fn auth_data(&self) -> Option<&AuthData> {
        match &self.data {
            SessionData::Authenticated(auth) => Some(auth),
            SessionData::Pending(_) => None,
        }
    }
}

/// Trait for storing temporary and persistent sessions.
///
/// Implementations own id generation and must be safe for concurrent use.
/// Ids must carry enough entropy that they can be neither guessed nor enumerated.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Store a temporary session with no owner.
    async fn create_temp(&self, data: PendingLogin) -> Result<Session, Error>;

    /// Store a persistent session owned by `user_id`.
    async fn create(&self, user_id: &str, data: AuthData) -> Result<Session, Error>;

    /// Retrieve a session, failing with `Session(NotFound)` when absent or expired.
    async fn get(&self, id: &str) -> Result<Session, Error>;

    /// Remove a temporary session and return it, as a single step.
    ///
    /// Of several concurrent calls for the same id at most one succeeds. Fails
    /// with `Session(NotFound)` when the id is absent, expired or names a
    /// persistent session; a persistent session is left in place.
    async fn take_temp(&self, id: &str) -> Result<Session, Error>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn destroy(&self, id: &str) -> Result<(), Error>;

    /// Purge expired sessions and return how many were removed.
    ///
    /// Stores that expire entries on their own keep the default.
    async fn cleanup_expired(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_data_validity() {
        let token = Token::new("AT", None);
        assert!(AuthData::new("github", &token).is_valid());
        assert!(!AuthData::new("", &token).is_valid());

        let missing_access = AuthData {
            provider_name: "github".to_string(),
            access_token: SecretString::new(String::new()),
            refresh_token: None,
        };
        assert!(!missing_access.is_valid());
    }

    #[test]
    fn test_auth_data_token_round_trip() {
        let token = Token::new("AT", Some("RT".to_string()));
        let auth = AuthData::new("github", &token);
        let restored = auth.token();
        assert_eq!(restored.access_token(), "AT");
        assert_eq!(restored.refresh_token(), Some("RT"));
    }

    #[test]
    fn test_auth_data_empty_refresh_reads_as_absent() {
        let auth = AuthData {
            provider_name: "github".to_string(),
            access_token: SecretString::new("AT".to_string()),
            refresh_token: Some(SecretString::new(String::new())),
        };
        assert_eq!(auth.token().refresh_token(), None);
        assert!(auth.token().is_valid());
    }

    #[test]
    fn test_session_phase_accessors() {
        let temp = Session {
            id: "t".to_string(),
            user_id: None,
            data: SessionData::Pending(PendingLogin::with_back_url("/home")),
        };
        assert!(temp.is_temporary());
        assert_eq!(
            temp.pending().and_then(|p| p.back_url.as_deref()),
            Some("/home")
        );
        assert!(temp.auth_data().is_none());

        let persistent = Session {
            id: "p".to_string(),
            user_id: Some("u1".to_string()),
            data: SessionData::Authenticated(AuthData::new("github", &Token::new("AT", None))),
        };
        assert!(!persistent.is_temporary());
        assert!(persistent.pending().is_none());
        assert!(persistent.auth_data().is_some());
    }
}

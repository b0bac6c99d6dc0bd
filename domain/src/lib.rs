//! The login, callback and userinfo use cases of the relying party.
//!
//! Each use case is a plain async function over the client [`Registry`] and a
//! session [`Manager`]. Items from `oidc_auth` that callers need are re-exported
//! here so that upper layers do not depend on that crate directly.

use log::*;
use oidc_auth::error::{Error as OidcAuthError, ErrorKind, SessionErrorKind};

use crate::error::{DomainErrorKind, Error};

pub use oidc_auth::{
    registry::Registry,
    session::{Manager, Session},
    User,
};

pub mod callback;
pub mod error;
pub mod login;
pub mod userinfo;

#[cfg(test)]
pub(crate) mod test_support;

/// Destroy a session, logging instead of returning a failure.
pub(crate) async fn destroy_quietly(sessions: &dyn Manager, session_id: &str) {
    if let Err(e) = sessions.destroy(session_id).await {
        warn!("Failed to destroy session {}: {}", session_id, e);
    }
}

/// A missing session is unauthorized; any other store failure stays internal.
pub(crate) fn session_lookup_error(err: OidcAuthError, key: &str, session_id: &str) -> Error {
    let missing = err.error_kind == ErrorKind::Session(SessionErrorKind::NotFound);
    let err = Error::from(err).with_field(key, session_id);
    if missing {
        err.with_kind(DomainErrorKind::UserUnauthorized)
    } else {
        err
    }
}

//! Resolve the user behind a persistent session.

use log::*;
use oidc_auth::session::Manager;
use oidc_auth::User;

use crate::error::{DomainErrorKind, Error};
use crate::{destroy_quietly, session_lookup_error, Registry};

/// Re-fetch the current profile of the user owning `session_id` from the provider.
///
/// Sessions with unusable authentication data, or whose provider is no longer
/// configured, are destroyed. A failing provider call leaves the session in place.
/// The stored token is sent as is; refreshing it is left to the caller.
pub async fn userinfo(
    registry: &Registry,
    sessions: &dyn Manager,
    session_id: &str,
) -> Result<User, Error> {
    let session = sessions
        .get(session_id)
        .await
        .map_err(|e| session_lookup_error(e, "sessId", session_id))?;

    let auth = match session.auth_data() {
        Some(auth) if auth.is_valid() => auth,
        _ => {
            destroy_quietly(sessions, session_id).await;
            return Err(Error::new(
                DomainErrorKind::SessionInterrupt,
                "session authentication data not found or invalid",
            )
            .with_field("sessId", session_id));
        }
    };

    let client = match registry.get_client(&auth.provider_name) {
        Ok(client) => client,
        Err(e) => {
            destroy_quietly(sessions, session_id).await;
            return Err(Error::from(e)
                .with_kind(DomainErrorKind::EntityNotFound)
                .with_field("sessId", session_id));
        }
    };

    let user = client
        .fetch_user_by_token(&auth.token())
        .await
        .map_err(|e| Error::from(e).with_field("sessId", session_id))?;

    debug!("Fetched user {} for session {}", user.id, session_id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InternalErrorKind;
    use crate::test_support::*;
    use mockito::Server;
    use oidc_auth::session::{AuthData, InMemoryManager, PendingLogin};
    use oidc_auth::Token;
    use secrecy::SecretString;

    #[tokio::test]
    async fn test_userinfo_fetches_fresh_profile() {
        let mut server = Server::new_async().await;
        let registry = registry(&[provider_config("github", &server.url())]);
        let sessions = InMemoryManager::new();
        let session = sessions
            .create("u1", AuthData::new("github", &Token::new("AT1", None)))
            .await
            .unwrap();
        let userinfo_mock = server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer AT1")
            .with_status(200)
            .with_body(r#"{"id":"u1","login":"bob","email":"bob@example.com"}"#)
            .expect(2)
            .create_async()
            .await;

        let first = userinfo(&registry, &sessions, &session.id).await.unwrap();
        let second = userinfo(&registry, &sessions, &session.id).await.unwrap();

        userinfo_mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first.email, "bob@example.com");
    }

    #[tokio::test]
    async fn test_userinfo_missing_session() {
        let registry = registry(&[provider_config("github", "https://idp.test")]);
        let sessions = InMemoryManager::new();

        for session_id in ["", "unknown"] {
            let err = userinfo(&registry, &sessions, session_id)
                .await
                .err()
                .unwrap();
            assert_eq!(err.error_kind, DomainErrorKind::UserUnauthorized);
        }
    }

    #[tokio::test]
    async fn test_userinfo_invalid_auth_data_interrupts_session() {
        let registry = registry(&[provider_config("github", "https://idp.test")]);
        let sessions = InMemoryManager::new();
        let session = sessions
            .create(
                "u1",
                AuthData {
                    provider_name: "github".to_string(),
                    access_token: SecretString::new(String::new()),
                    refresh_token: None,
                },
            )
            .await
            .unwrap();

        let err = userinfo(&registry, &sessions, &session.id)
            .await
            .err()
            .unwrap();

        assert_eq!(err.error_kind, DomainErrorKind::SessionInterrupt);
        assert_eq!(err.code(), 30501);
        let err = sessions.get(&session.id).await.err().unwrap();
        assert_eq!(err.field("sessId"), Some(session.id.as_str()));
    }

    #[tokio::test]
    async fn test_userinfo_with_temporary_session_interrupts() {
        let registry = registry(&[provider_config("github", "https://idp.test")]);
        let sessions = InMemoryManager::new();
        let temp = sessions.create_temp(PendingLogin::default()).await.unwrap();

        let err = userinfo(&registry, &sessions, &temp.id).await.err().unwrap();

        assert_eq!(err.error_kind, DomainErrorKind::SessionInterrupt);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_userinfo_removed_provider_destroys_session() {
        let registry = registry(&[provider_config("github", "https://idp.test")]);
        let sessions = InMemoryManager::new();
        let session = sessions
            .create("u1", AuthData::new("gitlab", &Token::new("AT1", None)))
            .await
            .unwrap();

        let err = userinfo(&registry, &sessions, &session.id)
            .await
            .err()
            .unwrap();

        assert_eq!(err.error_kind, DomainErrorKind::EntityNotFound);
        assert_eq!(err.field("providerName"), Some("gitlab"));
        assert!(sessions.get(&session.id).await.is_err());
    }

    #[tokio::test]
    async fn test_userinfo_provider_failure_keeps_session() {
        let mut server = Server::new_async().await;
        let registry = registry(&[provider_config("github", &server.url())]);
        let sessions = InMemoryManager::new();
        let session = sessions
            .create("u1", AuthData::new("github", &Token::new("AT1", None)))
            .await
            .unwrap();
        let _userinfo_mock = server
            .mock("GET", "/userinfo")
            .with_status(503)
            .create_async()
            .await;

        let err = userinfo(&registry, &sessions, &session.id)
            .await
            .err()
            .unwrap();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Provider)
        );
        assert_eq!(err.field("status"), Some("503"));
        assert!(sessions.get(&session.id).await.is_ok());
    }
}

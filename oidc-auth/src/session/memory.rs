//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::*;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthData, Manager, PendingLogin, Session, SessionData};
use crate::error::{session_error, Error, SessionErrorKind};

struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Session manager keeping every session in a map behind a reader/writer lock.
///
/// Reads proceed concurrently; creation and destruction take the write lock.
/// Temporary and persistent sessions expire after their own time-to-live.
#[derive(Clone)]
pub struct InMemoryManager {
    store: Arc<RwLock<HashMap<String, StoredSession>>>,
    temp_ttl: Duration,
    session_ttl: Duration,
}

impl InMemoryManager {
    /// Create a manager with a 10 minute temporary and 24 hour persistent session TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10), Duration::hours(24))
    }

    /// Create a manager with custom time-to-live values.
    pub fn with_ttl(temp_ttl: Duration, session_ttl: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            temp_ttl,
            session_ttl,
        }
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    async fn insert(&self, user_id: Option<String>, data: SessionData) -> Result<Session, Error> {
        let ttl = if user_id.is_some() {
            self.session_ttl
        } else {
            self.temp_ttl
        };
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            session_error(SessionErrorKind::Storage, "session expiry out of range")
                .with_field("ttlSeconds", ttl.num_seconds())
        })?;
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            data,
        };

        let stored = StoredSession {
            session: session.clone(),
            expires_at,
        };
        self.store.write().await.insert(session.id.clone(), stored);

        Ok(session)
    }
}

fn not_found(id: &str) -> Error {
    session_error(
        SessionErrorKind::NotFound,
        &format!("session not found by id {}", id),
    )
    .with_field("sessId", id)
}

impl Default for InMemoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Manager for InMemoryManager {
    async fn create_temp(&self, data: PendingLogin) -> Result<Session, Error> {
        let session = self.insert(None, SessionData::Pending(data)).await?;
        debug!("Created temporary session {}", session.id);
        Ok(session)
    }

    async fn create(&self, user_id: &str, data: AuthData) -> Result<Session, Error> {
        let session = self
            .insert(Some(user_id.to_string()), SessionData::Authenticated(data))
            .await?;
        debug!("Created session {} for user {}", session.id, user_id);
        Ok(session)
    }

    async fn get(&self, id: &str) -> Result<Session, Error> {
        let store = self.store.read().await;
        match store.get(id) {
            Some(stored) if stored.expires_at > Utc::now() => Ok(stored.session.clone()),
            _ => Err(not_found(id)),
        }
    }

    async fn take_temp(&self, id: &str) -> Result<Session, Error> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let entry = store
            .get(id)
            .map(|stored| (stored.expires_at > now, stored.session.pending().is_some()));

        match entry {
            Some((true, true)) => {
                let stored = store.remove(id).ok_or_else(|| not_found(id))?;
                debug!("Consumed temporary session {}", id);
                Ok(stored.session)
            }
            Some((true, false)) => Err(session_error(
                SessionErrorKind::NotFound,
                "session is not a temporary session",
            )
            .with_field("sessId", id)),
            Some((false, _)) => {
                store.remove(id);
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    async fn destroy(&self, id: &str) -> Result<(), Error> {
        if self.store.write().await.remove(id).is_some() {
            debug!("Destroyed session {}", id);
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let before = store.len();
        store.retain(|_, stored| stored.expires_at > now);
        let removed = before - store.len();
        if removed > 0 {
            debug!("Removed {} expired sessions", removed);
        }
        removed
    }
}

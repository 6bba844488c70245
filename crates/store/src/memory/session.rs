//! In-memory session storage keyed by hashed refresh token.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use meridian_core::auth::types::Session;
use meridian_core::store::{SessionStore, StoreError};
use meridian_shared::types::{SessionId, UserId};

/// Session storage with a refresh-token digest index.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, Session>,
    by_token: DashMap<String, SessionId>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        self.by_token
            .insert(session.refresh_token_hash.clone(), session.id);
        self.sessions.insert(session.id, session);
        Ok(())
    }

    async fn find_by_token_hash(&self, hash: &str) -> Result<Option<Session>, StoreError> {
        let Some(id) = self.by_token.get(hash) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&*id).map(|entry| entry.value().clone()))
    }

    async fn revoke(&self, id: SessionId) -> Result<(), StoreError> {
        let mut session = self.sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if session.revoked_at.is_none() {
            session.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user: UserId) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut revoked = 0;
        for mut entry in self.sessions.iter_mut() {
            let session = entry.value_mut();
            if session.user_id == user && session.is_active(now) {
                session.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

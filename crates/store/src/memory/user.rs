//! In-memory user, security-question, and backup-code storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use meridian_core::auth::types::{BackupCode, SecurityQuestion, User};
use meridian_core::store::{StoreError, UserStore};
use meridian_shared::types::{BackupCodeId, UserId};

/// User storage over concurrent maps, with an email uniqueness index.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    questions: DashMap<UserId, Vec<SecurityQuestion>>,
    codes: DashMap<UserId, Vec<BackupCode>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: User) -> Result<(), StoreError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(&email.to_lowercase()) else {
            return Ok(None);
        };
        Ok(self.users.get(&*id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_credential(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), StoreError> {
        let mut user = self.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash;
        Ok(())
    }

    async fn security_questions(
        &self,
        user: UserId,
    ) -> Result<Vec<SecurityQuestion>, StoreError> {
        Ok(self
            .questions
            .get(&user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn set_security_questions(
        &self,
        user: UserId,
        questions: Vec<SecurityQuestion>,
    ) -> Result<(), StoreError> {
        if !self.users.contains_key(&user) {
            return Err(StoreError::NotFound);
        }
        self.questions.insert(user, questions);
        Ok(())
    }

    async fn backup_codes(&self, user: UserId) -> Result<Vec<BackupCode>, StoreError> {
        Ok(self
            .codes
            .get(&user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn mark_backup_code_used(&self, id: BackupCodeId) -> Result<(), StoreError> {
        // The shard guard makes the read-check-flip atomic, which is what
        // enforces at-most-one-use under racing attempts.
        for mut entry in self.codes.iter_mut() {
            if let Some(code) = entry.value_mut().iter_mut().find(|c| c.id == id) {
                if code.used {
                    return Err(StoreError::Conflict(format!(
                        "backup code {id} already consumed"
                    )));
                }
                code.used = true;
                return Ok(());
            }
        }
        Err(StoreError::NotFound)
    }

    async fn replace_backup_codes(
        &self,
        user: UserId,
        codes: Vec<BackupCode>,
    ) -> Result<(), StoreError> {
        if !self.users.contains_key(&user) {
            return Err(StoreError::NotFound);
        }
        self.codes.insert(user, codes);
        Ok(())
    }
}

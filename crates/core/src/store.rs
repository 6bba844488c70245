//! Storage port traits.
//!
//! The core consumes persistence through these narrow async interfaces.
//! Adapters (the in-memory store crate, or a real database layer) implement
//! them; the core never performs a read-modify-write across two calls.

use async_trait::async_trait;
use thiserror::Error;

use meridian_shared::types::{
    AccountId, BackupCodeId, PendingVerificationId, SessionId, TransactionId, UserId,
};

use crate::auth::types::{BackupCode, PendingVerification, SecurityQuestion, Session, User};
use crate::ledger::types::{Account, BalanceWrite, CommitOutcome, EntryKey};
use crate::workflow::types::{Transaction, TransactionStatus, WorkflowAction};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// A compare-and-swap failed: the record changed under the caller.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// User, security-question, and backup-code storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user.
    async fn create(&self, user: User) -> Result<(), StoreError>;

    /// Looks a user up by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Replaces the stored credential hash.
    async fn update_credential(&self, id: UserId, password_hash: String)
    -> Result<(), StoreError>;

    /// Returns the user's configured security questions.
    async fn security_questions(&self, user: UserId) -> Result<Vec<SecurityQuestion>, StoreError>;

    /// Replaces the user's security questions.
    async fn set_security_questions(
        &self,
        user: UserId,
        questions: Vec<SecurityQuestion>,
    ) -> Result<(), StoreError>;

    /// Returns all backup codes for the user, consumed ones included.
    async fn backup_codes(&self, user: UserId) -> Result<Vec<BackupCode>, StoreError>;

    /// Marks a backup code consumed.
    ///
    /// Atomic: fails with [`StoreError::Conflict`] if the code was already
    /// consumed, which is how the at-most-one-use invariant holds under
    /// concurrent attempts.
    async fn mark_backup_code_used(&self, id: BackupCodeId) -> Result<(), StoreError>;

    /// Replaces the user's backup codes with a freshly issued batch.
    async fn replace_backup_codes(
        &self,
        user: UserId,
        codes: Vec<BackupCode>,
    ) -> Result<(), StoreError>;
}

/// Pending stage-2 verification storage.
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// Stores a pending verification.
    async fn put(&self, pending: PendingVerification) -> Result<(), StoreError>;

    /// Fetches a pending verification, expired or not.
    async fn get(
        &self,
        id: PendingVerificationId,
    ) -> Result<Option<PendingVerification>, StoreError>;

    /// Removes a pending verification.
    async fn remove(&self, id: PendingVerificationId) -> Result<(), StoreError>;
}

/// Session storage keyed by hashed refresh token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a newly issued session.
    async fn create(&self, session: Session) -> Result<(), StoreError>;

    /// Finds a session by refresh-token digest.
    async fn find_by_token_hash(&self, hash: &str) -> Result<Option<Session>, StoreError>;

    /// Revokes a session.
    async fn revoke(&self, id: SessionId) -> Result<(), StoreError>;

    /// Revokes every session belonging to a user. Returns the count revoked.
    async fn revoke_all_for_user(&self, user: UserId) -> Result<u64, StoreError>;
}

/// Account balance storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account.
    async fn create(&self, account: Account) -> Result<(), StoreError>;

    /// Fetches an account.
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lists the accounts owned by a user.
    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>, StoreError>;

    /// Applies a set of balance writes atomically, gated by `key`.
    ///
    /// All writes land or none do. A key that was already applied returns
    /// [`CommitOutcome::AlreadyApplied`] and changes nothing. A write whose
    /// `expected_balance` no longer matches fails with
    /// [`StoreError::Conflict`] and nothing is applied.
    async fn commit(
        &self,
        key: EntryKey,
        writes: Vec<BalanceWrite>,
    ) -> Result<CommitOutcome, StoreError>;
}

/// Transaction storage with compare-and-swap status updates.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new transaction.
    async fn create(&self, transaction: Transaction) -> Result<(), StoreError>;

    /// Fetches a transaction.
    async fn get(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Lists transactions owned by a user, newest first.
    async fn for_user(&self, user: UserId) -> Result<Vec<Transaction>, StoreError>;

    /// Applies a workflow action to the transaction iff its current status
    /// equals `expected`.
    ///
    /// Fails with [`StoreError::Conflict`] on a status mismatch - never a
    /// silent no-op. This single atomic step is what serializes concurrent
    /// decisions on the same transaction.
    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        action: WorkflowAction,
    ) -> Result<Transaction, StoreError>;
}

//! In-memory account storage with atomic multi-account commits.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use meridian_core::ledger::types::{Account, BalanceWrite, CommitOutcome, EntryKey};
use meridian_core::store::{AccountStore, StoreError};
use meridian_shared::types::{AccountId, UserId};

#[derive(Debug, Default)]
struct AccountState {
    accounts: HashMap<AccountId, Account>,
    applied: HashSet<EntryKey>,
}

/// Account storage.
///
/// A single lock covers both balances and the applied-key set, so a commit
/// is one atomic step: idempotency check, balance-expectation checks, and
/// writes all happen under it. No await points occur while it is held.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    state: Mutex<AccountState>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: Account) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!(
                "account {} already exists",
                account.id
            )));
        }
        state.accounts.insert(account.id, account);
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|account| account.owner == user)
            .cloned()
            .collect())
    }

    async fn commit(
        &self,
        key: EntryKey,
        writes: Vec<BalanceWrite>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut state = self.lock();

        if state.applied.contains(&key) {
            debug!(%key, "commit replayed under an applied key");
            return Ok(CommitOutcome::AlreadyApplied);
        }

        // Validate every write before touching anything: both-or-neither.
        for write in &writes {
            let account = state
                .accounts
                .get(&write.account_id)
                .ok_or(StoreError::NotFound)?;
            if account.balance != write.expected_balance {
                return Err(StoreError::Conflict(format!(
                    "account {} balance is {}, caller computed from {}",
                    write.account_id, account.balance, write.expected_balance
                )));
            }
        }

        for write in writes {
            if let Some(account) = state.accounts.get_mut(&write.account_id) {
                account.balance = write.new_balance;
                account.available_balance = write.new_available;
            }
        }
        state.applied.insert(key);
        Ok(CommitOutcome::Applied)
    }
}

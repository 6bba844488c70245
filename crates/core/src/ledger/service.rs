//! Idempotent balance application.
//!
//! [`LedgerService`] is the only writer of account balances. Every mutation
//! is an entry (one account) or an entry pair (debit + credit) committed
//! atomically under an idempotency key.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use meridian_shared::types::AccountId;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Account, BalanceWrite, CommitOutcome, EntryKey};
use crate::store::AccountStore;

/// Applies balance deltas to accounts, exactly once per key.
#[derive(Clone)]
pub struct LedgerService {
    accounts: Arc<dyn AccountStore>,
}

impl LedgerService {
    /// Creates a new ledger service over an account store.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Applies a single signed delta to an account.
    ///
    /// Returns the resulting balance. Re-applying the same `key` is a no-op
    /// that returns the current balance unchanged.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientFunds` if a debit would drive the
    /// balance below zero, `LedgerError::AccountNotFound` if the account
    /// does not exist, and `LedgerError::Conflict` if the balance moved
    /// between read and commit.
    pub async fn apply_entry(
        &self,
        account_id: AccountId,
        delta: Decimal,
        key: EntryKey,
    ) -> Result<Decimal, LedgerError> {
        let account = self.load(account_id).await?;
        let write = Self::plan_write(&account, delta)?;
        let new_balance = write.new_balance;

        match self.accounts.commit(key, vec![write]).await? {
            CommitOutcome::Applied => {
                info!(account_id = %account_id, %delta, %key, "ledger entry applied");
                Ok(new_balance)
            }
            CommitOutcome::AlreadyApplied => {
                debug!(%key, "ledger entry replayed, balance untouched");
                Ok(account.balance)
            }
        }
    }

    /// Debits one account and credits another in a single atomic commit.
    ///
    /// Both legs land or neither does. Re-applying the same `key` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CurrencyMismatch` if the legs are denominated
    /// differently, plus every error `apply_entry` can return.
    pub async fn apply_pair(
        &self,
        debit_account: AccountId,
        credit_account: AccountId,
        amount: Decimal,
        key: EntryKey,
    ) -> Result<(), LedgerError> {
        let debit = self.load(debit_account).await?;
        let credit = self.load(credit_account).await?;

        if debit.currency != credit.currency {
            return Err(LedgerError::CurrencyMismatch {
                debit: debit.currency,
                credit: credit.currency,
            });
        }

        let writes = vec![
            Self::plan_write(&debit, -amount)?,
            Self::plan_write(&credit, amount)?,
        ];

        match self.accounts.commit(key, writes).await? {
            CommitOutcome::Applied => {
                info!(
                    debit_account = %debit_account,
                    credit_account = %credit_account,
                    %amount,
                    %key,
                    "ledger pair applied"
                );
            }
            CommitOutcome::AlreadyApplied => {
                debug!(%key, "ledger pair replayed, balances untouched");
            }
        }
        Ok(())
    }

    async fn load(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .get(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Computes the balance write for a signed delta, rejecting debits that
    /// would leave either balance negative.
    fn plan_write(account: &Account, delta: Decimal) -> Result<BalanceWrite, LedgerError> {
        let new_balance = account.balance + delta;
        let new_available = account.available_balance + delta;

        if new_balance < Decimal::ZERO || new_available < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                account: account.id,
                requested: -delta,
                available: account.available_balance,
            });
        }

        Ok(BalanceWrite {
            account_id: account.id,
            expected_balance: account.balance,
            new_balance,
            new_available,
        })
    }
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService").finish_non_exhaustive()
    }
}

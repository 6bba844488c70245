//! Transaction workflow engine.
//!
//! Validates and persists submissions, and carries out settlement and
//! reversal ledger mutations for approved transactions. Status transitions
//! themselves are decided by [`ApprovalGate`](crate::workflow::approval),
//! which delegates the money movement here.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use meridian_shared::types::{TransactionId, UserId};

use crate::auth::stepup::{AuthenticatedUser, StepUpAuthenticator};
use crate::ledger::service::LedgerService;
use crate::ledger::types::{Account, EntryKey};
use crate::store::{AccountStore, TransactionStore};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    SubmitTransaction, Transaction, TransactionKind, TransactionStatus,
};

/// Validates, gates, and settles money-moving transactions.
pub struct TransactionEngine {
    transactions: Arc<dyn TransactionStore>,
    accounts: Arc<dyn AccountStore>,
    ledger: LedgerService,
    stepup: Arc<StepUpAuthenticator>,
}

impl TransactionEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        accounts: Arc<dyn AccountStore>,
        ledger: LedgerService,
        stepup: Arc<StepUpAuthenticator>,
    ) -> Self {
        Self {
            transactions,
            accounts,
            ledger,
            stepup,
        }
    }

    /// Submits a transaction on behalf of the authenticated caller.
    ///
    /// Validation, the step-up gate, and the available-balance pre-check
    /// all run before anything is persisted; on success the transaction is
    /// stored as PENDING with a generated reference and no ledger effect.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::Validation` - non-positive amount, foreign or
    ///   missing accounts, malformed destination, or a missing backup code
    /// * `WorkflowError::Verification` - the backup code did not verify or
    ///   was already consumed
    pub async fn submit(
        &self,
        caller: &AuthenticatedUser,
        request: SubmitTransaction,
    ) -> Result<Transaction, WorkflowError> {
        if !request.amount.is_positive() {
            return Err(WorkflowError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        let source = self.owned_account(caller.id, &request).await?;

        if request.amount.currency != source.currency {
            return Err(WorkflowError::Validation(format!(
                "amount currency {} does not match account currency {}",
                request.amount.currency, source.currency
            )));
        }

        let destination = self.validate_destination(&source, &request.kind).await?;

        // Internal transfers between the caller's own accounts are the one
        // step-up-exempt type; everything else requires a backup code.
        let exempt = matches!(&request.kind, TransactionKind::InternalTransfer { .. })
            && destination.as_ref().is_some_and(|d| d.owner == caller.id);

        if !exempt {
            let code = request.backup_code.as_deref().ok_or_else(|| {
                WorkflowError::Validation(
                    "a backup code is required for this transaction type".to_string(),
                )
            })?;
            self.stepup
                .verify_transaction_code(caller.id, code)
                .await
                .map_err(WorkflowError::Verification)?;
        }

        // Advisory only: balances may move before the admin decides, so the
        // authoritative check happens at settlement.
        if request.kind.is_outbound() && !source.has_available(request.amount.amount) {
            warn!(
                account_id = %source.id,
                requested = %request.amount.amount,
                available = %source.available_balance,
                "transaction queued despite insufficient available balance"
            );
        }

        let transaction = Transaction {
            id: TransactionId::new(),
            reference: Transaction::generate_reference(),
            owner: caller.id,
            source_account: source.id,
            kind: request.kind,
            amount: request.amount,
            description: request.description,
            status: TransactionStatus::Pending,
            admin_notes: None,
            decline_reason: None,
            reversal_reason: None,
            created_at: Utc::now(),
            approved_at: None,
            approved_by: None,
            declined_at: None,
            declined_by: None,
            reversed_at: None,
            reversed_by: None,
        };

        self.transactions.create(transaction.clone()).await?;
        info!(
            transaction_id = %transaction.id,
            reference = %transaction.reference,
            kind = %transaction.kind,
            amount = %transaction.amount,
            "transaction queued for approval"
        );
        Ok(transaction)
    }

    /// Fetches a transaction.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::TransactionNotFound` if it does not exist.
    pub async fn get(&self, id: TransactionId) -> Result<Transaction, WorkflowError> {
        self.transactions
            .get(id)
            .await?
            .ok_or(WorkflowError::TransactionNotFound(id))
    }

    /// Lists the caller's transactions, newest first.
    pub async fn transactions_for(
        &self,
        caller: &AuthenticatedUser,
    ) -> Result<Vec<Transaction>, WorkflowError> {
        Ok(self.transactions.for_user(caller.id).await?)
    }

    /// Applies the transaction's monetary effect to the ledger.
    ///
    /// Keyed by `Settlement(id)`, so a retry can never double-apply.
    pub(crate) async fn settle(&self, transaction: &Transaction) -> Result<(), WorkflowError> {
        let amount = transaction.amount.amount;
        let key = EntryKey::Settlement(transaction.id);

        match &transaction.kind {
            TransactionKind::Deposit => {
                self.ledger
                    .apply_entry(transaction.source_account, amount, key)
                    .await?;
            }
            TransactionKind::Withdrawal
            | TransactionKind::DomesticTransfer { .. }
            | TransactionKind::BillPayment { .. } => {
                self.ledger
                    .apply_entry(transaction.source_account, -amount, key)
                    .await?;
            }
            TransactionKind::InternalTransfer { to } => {
                self.ledger
                    .apply_pair(transaction.source_account, *to, amount, key)
                    .await?;
            }
        }
        Ok(())
    }

    /// Applies the exact inverse of [`settle`](Self::settle).
    ///
    /// Keyed by `Reversal(id)`, itself at-most-once.
    pub(crate) async fn unwind(&self, transaction: &Transaction) -> Result<(), WorkflowError> {
        let amount = transaction.amount.amount;
        let key = EntryKey::Reversal(transaction.id);

        match &transaction.kind {
            TransactionKind::Deposit => {
                self.ledger
                    .apply_entry(transaction.source_account, -amount, key)
                    .await?;
            }
            TransactionKind::Withdrawal
            | TransactionKind::DomesticTransfer { .. }
            | TransactionKind::BillPayment { .. } => {
                self.ledger
                    .apply_entry(transaction.source_account, amount, key)
                    .await?;
            }
            TransactionKind::InternalTransfer { to } => {
                self.ledger
                    .apply_pair(*to, transaction.source_account, amount, key)
                    .await?;
            }
        }
        Ok(())
    }

    pub(crate) fn transactions(&self) -> &Arc<dyn TransactionStore> {
        &self.transactions
    }

    /// Resolves the source account and checks ownership. The same error
    /// covers "missing" and "not yours" so callers cannot probe for
    /// account ids.
    async fn owned_account(
        &self,
        caller: UserId,
        request: &SubmitTransaction,
    ) -> Result<Account, WorkflowError> {
        self.accounts
            .get(request.source_account)
            .await?
            .filter(|account| account.owner == caller)
            .ok_or_else(|| {
                WorkflowError::Validation(
                    "source account not found or not owned by caller".to_string(),
                )
            })
    }

    /// Kind-specific destination validation. Returns the internal
    /// destination account when there is one.
    async fn validate_destination(
        &self,
        source: &Account,
        kind: &TransactionKind,
    ) -> Result<Option<Account>, WorkflowError> {
        match kind {
            TransactionKind::Deposit | TransactionKind::Withdrawal => Ok(None),
            TransactionKind::InternalTransfer { to } => {
                if *to == source.id {
                    return Err(WorkflowError::Validation(
                        "destination account must differ from source".to_string(),
                    ));
                }
                let destination = self
                    .accounts
                    .get(*to)
                    .await?
                    .ok_or_else(|| {
                        WorkflowError::Validation("destination account not found".to_string())
                    })?;
                if destination.currency != source.currency {
                    return Err(WorkflowError::Validation(format!(
                        "cannot transfer {} into a {} account",
                        source.currency, destination.currency
                    )));
                }
                Ok(Some(destination))
            }
            TransactionKind::DomesticTransfer {
                bank_name,
                routing_number,
                account_number,
                account_holder,
            } => {
                let fields = [bank_name, routing_number, account_number, account_holder];
                if fields.iter().any(|f| f.trim().is_empty()) {
                    return Err(WorkflowError::Validation(
                        "domestic transfer requires bank, routing, account, and holder".to_string(),
                    ));
                }
                Ok(None)
            }
            TransactionKind::BillPayment {
                biller_name,
                biller_account,
            } => {
                if biller_name.trim().is_empty() || biller_account.trim().is_empty() {
                    return Err(WorkflowError::Validation(
                        "bill payment requires biller name and account".to_string(),
                    ));
                }
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for TransactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionEngine").finish_non_exhaustive()
    }
}

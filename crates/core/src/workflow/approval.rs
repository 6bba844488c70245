//! The administrative approval gate.
//!
//! Thin orchestration over the workflow state machine: each decision
//! re-validates the current status, wins (or loses) the compare-and-swap
//! on it, and only then lets the engine touch the ledger. The CAS is what
//! guarantees that two racing decisions on one transaction produce exactly
//! one ledger mutation and one `AlreadyProcessed` response.

use std::sync::Arc;
use tracing::{error, info};

use meridian_shared::types::TransactionId;

use crate::auth::stepup::AuthenticatedUser;
use crate::store::StoreError;
use crate::workflow::engine::TransactionEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{Transaction, TransactionStatus, WorkflowAction};

/// Admin decision point for queued transactions.
pub struct ApprovalGate {
    engine: Arc<TransactionEngine>,
}

impl ApprovalGate {
    /// Creates a new approval gate over the engine.
    #[must_use]
    pub fn new(engine: Arc<TransactionEngine>) -> Self {
        Self { engine }
    }

    /// Approves a pending transaction and settles it to the ledger.
    ///
    /// If settlement fails after the status was won (balances moved since
    /// submission), the transaction is restored to PENDING and the ledger
    /// error surfaces to the admin - never a partial application.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::NotAuthorized` - caller is not an admin
    /// * `WorkflowError::AlreadyProcessed` - a concurrent decision won
    /// * `WorkflowError::InvalidTransition` - transaction is terminal
    /// * `WorkflowError::Ledger` - settlement failed; status stays PENDING
    pub async fn approve(
        &self,
        caller: &AuthenticatedUser,
        transaction_id: TransactionId,
        admin_notes: Option<String>,
    ) -> Result<Transaction, WorkflowError> {
        Self::require_admin(caller)?;

        let transaction = self.engine.get(transaction_id).await?;
        let action = WorkflowService::approve(
            transaction_id,
            transaction.status,
            caller.id,
            admin_notes,
        )?;

        let approved = self
            .commit(transaction_id, TransactionStatus::Pending, action)
            .await?;

        if let Err(err) = self.engine.settle(&approved).await {
            self.restore(transaction_id, TransactionStatus::Approved, TransactionStatus::Pending)
                .await;
            return Err(err);
        }

        info!(
            transaction_id = %transaction_id,
            admin_id = %caller.id,
            "transaction approved and settled"
        );
        Ok(approved)
    }

    /// Declines a pending transaction with a required reason. No ledger
    /// effect.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::DeclineReasonRequired` - empty reason
    /// * `WorkflowError::AlreadyProcessed` - a concurrent decision won
    /// * `WorkflowError::InvalidTransition` - not pending
    pub async fn decline(
        &self,
        caller: &AuthenticatedUser,
        transaction_id: TransactionId,
        reason: String,
    ) -> Result<Transaction, WorkflowError> {
        Self::require_admin(caller)?;

        let transaction = self.engine.get(transaction_id).await?;
        let action =
            WorkflowService::decline(transaction_id, transaction.status, caller.id, reason)?;

        let declined = self
            .commit(transaction_id, TransactionStatus::Pending, action)
            .await?;

        info!(
            transaction_id = %transaction_id,
            admin_id = %caller.id,
            "transaction declined"
        );
        Ok(declined)
    }

    /// Reverses an approved transaction, applying the inverse ledger
    /// mutation exactly once.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::ReversalReasonRequired` - empty reason
    /// * `WorkflowError::AlreadyProcessed` - a concurrent reversal won
    /// * `WorkflowError::InvalidTransition` - not approved
    /// * `WorkflowError::Ledger` - unwind failed; status stays APPROVED
    pub async fn reverse(
        &self,
        caller: &AuthenticatedUser,
        transaction_id: TransactionId,
        reason: String,
    ) -> Result<Transaction, WorkflowError> {
        Self::require_admin(caller)?;

        let transaction = self.engine.get(transaction_id).await?;
        let action =
            WorkflowService::reverse(transaction_id, transaction.status, caller.id, reason)?;

        let reversed = self
            .commit(transaction_id, TransactionStatus::Approved, action)
            .await?;

        if let Err(err) = self.engine.unwind(&reversed).await {
            self.restore(transaction_id, TransactionStatus::Reversed, TransactionStatus::Approved)
                .await;
            return Err(err);
        }

        info!(
            transaction_id = %transaction_id,
            admin_id = %caller.id,
            "transaction reversed"
        );
        Ok(reversed)
    }

    fn require_admin(caller: &AuthenticatedUser) -> Result<(), WorkflowError> {
        if caller.role.can_decide() {
            Ok(())
        } else {
            Err(WorkflowError::NotAuthorized { user_id: caller.id })
        }
    }

    /// Commits an action with a compare-and-swap on the expected status.
    /// A conflict means another decision got there first.
    async fn commit(
        &self,
        transaction_id: TransactionId,
        expected: TransactionStatus,
        action: WorkflowAction,
    ) -> Result<Transaction, WorkflowError> {
        match self
            .engine
            .transactions()
            .update_status(transaction_id, expected, action)
            .await
        {
            Ok(transaction) => Ok(transaction),
            Err(StoreError::Conflict(_)) => Err(WorkflowError::AlreadyProcessed(transaction_id)),
            Err(StoreError::NotFound) => Err(WorkflowError::TransactionNotFound(transaction_id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Rolls the status back after a failed ledger mutation.
    async fn restore(
        &self,
        transaction_id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    ) {
        let result = self
            .engine
            .transactions()
            .update_status(transaction_id, from, WorkflowAction::Restore { new_status: to })
            .await;
        if let Err(err) = result {
            // The transaction is stuck in a decided status with no ledger
            // effect; operator intervention required.
            error!(
                transaction_id = %transaction_id,
                %err,
                "failed to restore status after settlement failure"
            );
        }
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate").finish_non_exhaustive()
    }
}

//! In-memory transaction storage with compare-and-swap status updates.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use meridian_core::store::{StoreError, TransactionStore};
use meridian_core::workflow::types::{Transaction, TransactionStatus, WorkflowAction};
use meridian_shared::types::{TransactionId, UserId};

/// Transaction storage.
///
/// `update_status` performs its status check and stamp application under
/// the entry's shard guard - the single atomic step that serializes
/// concurrent decisions on one transaction.
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    transactions: DashMap<TransactionId, Transaction>,
}

impl MemoryTransactionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_action(transaction: &mut Transaction, action: WorkflowAction) {
        match action {
            WorkflowAction::Approve {
                new_status,
                approved_by,
                approved_at,
                admin_notes,
            } => {
                transaction.status = new_status;
                transaction.approved_by = Some(approved_by);
                transaction.approved_at = Some(approved_at);
                transaction.admin_notes = admin_notes;
            }
            WorkflowAction::Decline {
                new_status,
                declined_by,
                declined_at,
                reason,
            } => {
                transaction.status = new_status;
                transaction.declined_by = Some(declined_by);
                transaction.declined_at = Some(declined_at);
                transaction.decline_reason = Some(reason);
            }
            WorkflowAction::Reverse {
                new_status,
                reversed_by,
                reversed_at,
                reason,
            } => {
                transaction.status = new_status;
                transaction.reversed_by = Some(reversed_by);
                transaction.reversed_at = Some(reversed_at);
                transaction.reversal_reason = Some(reason);
            }
            WorkflowAction::Restore { new_status } => {
                transaction.status = new_status;
                match new_status {
                    TransactionStatus::Pending => {
                        transaction.approved_by = None;
                        transaction.approved_at = None;
                        transaction.admin_notes = None;
                    }
                    TransactionStatus::Approved => {
                        transaction.reversed_by = None;
                        transaction.reversed_at = None;
                        transaction.reversal_reason = None;
                    }
                    TransactionStatus::Declined | TransactionStatus::Reversed => {}
                }
            }
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    async fn get(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Transaction>, StoreError> {
        let mut result: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().owner == user)
            .map(|entry| entry.value().clone())
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        action: WorkflowAction,
    ) -> Result<Transaction, StoreError> {
        let mut entry = self.transactions.get_mut(&id).ok_or(StoreError::NotFound)?;
        let transaction = entry.value_mut();

        if transaction.status != expected {
            debug!(
                transaction_id = %id,
                actual = %transaction.status,
                %expected,
                "status compare-and-swap lost"
            );
            return Err(StoreError::Conflict(format!(
                "transaction {id} status is {}, expected {expected}",
                transaction.status
            )));
        }

        Self::apply_action(transaction, action);
        Ok(transaction.clone())
    }
}

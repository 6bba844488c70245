//! Workflow service for transaction state transitions.
//!
//! This module implements the core state machine logic for
//! transitioning transactions through the approval workflow.

use chrono::Utc;

use meridian_shared::types::{TransactionId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{TransactionStatus, WorkflowAction};

/// Stateless service for validating transaction workflow transitions.
///
/// All methods are associated functions that validate a transition from
/// the observed current status and return the [`WorkflowAction`] carrying
/// the audit trail. The caller commits the action with a compare-and-swap
/// against the same observed status, which is what makes concurrent
/// decisions race-safe.
pub struct WorkflowService;

impl WorkflowService {
    /// Approve a pending transaction.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` if the transition is valid
    /// * `Err(WorkflowError::AlreadyProcessed)` if already approved
    /// * `Err(WorkflowError::InvalidTransition)` from a terminal status
    pub fn approve(
        transaction_id: TransactionId,
        current_status: TransactionStatus,
        approved_by: UserId,
        admin_notes: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            TransactionStatus::Pending => Ok(WorkflowAction::Approve {
                new_status: TransactionStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                admin_notes,
            }),
            TransactionStatus::Approved => Err(WorkflowError::AlreadyProcessed(transaction_id)),
            TransactionStatus::Declined | TransactionStatus::Reversed => {
                Err(WorkflowError::InvalidTransition {
                    from: current_status,
                    to: TransactionStatus::Approved,
                })
            }
        }
    }

    /// Decline a pending transaction with a required reason.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Decline)` if the transition is valid
    /// * `Err(WorkflowError::DeclineReasonRequired)` if the reason is empty
    /// * `Err(WorkflowError::AlreadyProcessed)` if already declined
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn decline(
        transaction_id: TransactionId,
        current_status: TransactionStatus,
        declined_by: UserId,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::DeclineReasonRequired);
        }

        match current_status {
            TransactionStatus::Pending => Ok(WorkflowAction::Decline {
                new_status: TransactionStatus::Declined,
                declined_by,
                declined_at: Utc::now(),
                reason,
            }),
            TransactionStatus::Declined => Err(WorkflowError::AlreadyProcessed(transaction_id)),
            TransactionStatus::Approved | TransactionStatus::Reversed => {
                Err(WorkflowError::InvalidTransition {
                    from: current_status,
                    to: TransactionStatus::Declined,
                })
            }
        }
    }

    /// Reverse an approved transaction with a required reason.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reverse)` if the transition is valid
    /// * `Err(WorkflowError::ReversalReasonRequired)` if the reason is empty
    /// * `Err(WorkflowError::AlreadyProcessed)` if already reversed
    /// * `Err(WorkflowError::InvalidTransition)` otherwise
    pub fn reverse(
        transaction_id: TransactionId,
        current_status: TransactionStatus,
        reversed_by: UserId,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReversalReasonRequired);
        }

        match current_status {
            TransactionStatus::Approved => Ok(WorkflowAction::Reverse {
                new_status: TransactionStatus::Reversed,
                reversed_by,
                reversed_at: Utc::now(),
                reason,
            }),
            TransactionStatus::Reversed => Err(WorkflowError::AlreadyProcessed(transaction_id)),
            TransactionStatus::Pending | TransactionStatus::Declined => {
                Err(WorkflowError::InvalidTransition {
                    from: current_status,
                    to: TransactionStatus::Reversed,
                })
            }
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Declined (decline)
    /// - Approved → Reversed (reverse)
    #[must_use]
    pub const fn is_valid_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
        matches!(
            (from, to),
            (
                TransactionStatus::Pending,
                TransactionStatus::Approved | TransactionStatus::Declined
            ) | (TransactionStatus::Approved, TransactionStatus::Reversed)
        )
    }
}

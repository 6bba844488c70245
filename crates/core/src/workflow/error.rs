//! Workflow error types for the transaction lifecycle.

use thiserror::Error;

use meridian_shared::error::AppError;
use meridian_shared::types::{TransactionId, UserId};

use crate::auth::error::AuthError;
use crate::ledger::error::LedgerError;
use crate::store::StoreError;
use crate::workflow::types::TransactionStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request validation failed before a transaction was created.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The step-up credential did not verify.
    #[error(transparent)]
    Verification(#[from] AuthError),

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: TransactionStatus,
        /// The attempted target status.
        to: TransactionStatus,
    },

    /// A concurrent decision already settled this transaction.
    #[error("Transaction {0} has already been processed")]
    AlreadyProcessed(TransactionId),

    /// Settlement failed at the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Decline reason is required but not provided.
    #[error("Decline reason is required")]
    DeclineReasonRequired,

    /// Reversal reason is required but not provided.
    #[error("Reversal reason is required")]
    ReversalReasonRequired,

    /// Caller does not hold the admin role.
    #[error("User {user_id} is not authorized to decide transactions")]
    NotAuthorized {
        /// The user who attempted the decision.
        user_id: UserId,
    },

    /// Transaction not found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::DeclineReasonRequired | Self::ReversalReasonRequired => 400,
            Self::Verification(err) => err.status_code(),
            Self::InvalidTransition { .. } | Self::AlreadyProcessed(_) => 409,
            Self::Ledger(err) => err.status_code(),
            Self::NotAuthorized { .. } => 403,
            Self::TransactionNotFound(_) => 404,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Verification(err) => err.error_code(),
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            Self::Ledger(err) => err.error_code(),
            Self::DeclineReasonRequired => "DECLINE_REASON_REQUIRED",
            Self::ReversalReasonRequired => "REVERSAL_REASON_REQUIRED",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => Self::Validation(msg),
            WorkflowError::Verification(auth) => auth.into(),
            WorkflowError::InvalidTransition { from, to } => {
                Self::InvalidStateTransition(format!("{from} to {to}"))
            }
            WorkflowError::AlreadyProcessed(_) => Self::AlreadyProcessed,
            WorkflowError::Ledger(ledger) => ledger.into(),
            WorkflowError::DeclineReasonRequired | WorkflowError::ReversalReasonRequired => {
                Self::Validation(err.to_string())
            }
            WorkflowError::NotAuthorized { user_id } => {
                Self::Forbidden(format!("user {user_id} cannot decide transactions"))
            }
            WorkflowError::TransactionNotFound(id) => Self::NotFound(format!("transaction {id}")),
            WorkflowError::Storage(msg) => Self::Storage(msg),
        }
    }
}

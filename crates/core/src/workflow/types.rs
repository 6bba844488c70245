//! Workflow domain types for the transaction lifecycle.
//!
//! This module defines the transaction entity, its tagged-union payload
//! (one variant per transaction type), and the status state machine types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use meridian_shared::types::{AccountId, Money, TransactionId, UserId};

/// Transaction status in the approval workflow.
///
/// Transactions are persisted as Pending and move through:
/// - Pending → Approved (admin approves, ledger settles)
/// - Pending → Declined (admin rejects with a reason)
/// - Approved → Reversed (admin unwinds with a reason)
///
/// Declined and Reversed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Queued for administrative review; no ledger effect yet.
    Pending,
    /// Approved and settled to the ledger.
    Approved,
    /// Rejected by an admin; no ledger effect (terminal).
    Declined,
    /// Settlement unwound by an admin (terminal).
    Reversed,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Returns true if no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Reversed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-type transaction payload.
///
/// One variant per transaction type, sharing the common envelope on
/// [`Transaction`]. This removes the "required field missing for this
/// type" class of bugs that a flat record with optionals invites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credit the source account.
    Deposit,
    /// Debit the source account.
    Withdrawal,
    /// Move funds between two internal accounts.
    InternalTransfer {
        /// Destination account.
        to: AccountId,
    },
    /// Funded transfer to an external domestic bank.
    DomesticTransfer {
        /// Receiving bank name.
        bank_name: String,
        /// Receiving bank routing number.
        routing_number: String,
        /// Receiving account number.
        account_number: String,
        /// Name on the receiving account.
        account_holder: String,
    },
    /// Payment to a registered biller.
    BillPayment {
        /// Biller name.
        biller_name: String,
        /// Customer reference with the biller.
        biller_account: String,
    },
}

impl TransactionKind {
    /// Returns the type name used in references and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::InternalTransfer { .. } => "internal_transfer",
            Self::DomesticTransfer { .. } => "domestic_transfer",
            Self::BillPayment { .. } => "bill_payment",
        }
    }

    /// Returns true if settlement debits the source account.
    #[must_use]
    pub const fn is_outbound(&self) -> bool {
        !matches!(self, Self::Deposit)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A money-moving transaction.
///
/// Created by the owner of the source account, decided by an admin, and
/// never deleted - terminal states are stamped, not erased, to preserve
/// the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier; doubles as the settlement idempotency key.
    pub id: TransactionId,
    /// Human-readable unique reference.
    pub reference: String,
    /// The user who submitted the transaction.
    pub owner: UserId,
    /// The account money moves from (or into, for deposits).
    pub source_account: AccountId,
    /// Per-type payload.
    pub kind: TransactionKind,
    /// Amount, strictly positive.
    pub amount: Money,
    /// Free-form description.
    pub description: Option<String>,
    /// Current workflow status.
    pub status: TransactionStatus,
    /// Notes recorded by the approving admin.
    pub admin_notes: Option<String>,
    /// Reason recorded on decline.
    pub decline_reason: Option<String>,
    /// Reason recorded on reversal.
    pub reversal_reason: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// The admin who approved.
    pub approved_by: Option<UserId>,
    /// Decline timestamp.
    pub declined_at: Option<DateTime<Utc>>,
    /// The admin who declined.
    pub declined_by: Option<UserId>,
    /// Reversal timestamp.
    pub reversed_at: Option<DateTime<Utc>>,
    /// The admin who reversed.
    pub reversed_by: Option<UserId>,
}

impl Transaction {
    /// Generates a unique human-readable reference.
    #[must_use]
    pub fn generate_reference() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("TXN-{}", hex[..10].to_uppercase())
    }
}

/// A transaction submission request.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTransaction {
    /// The caller's source account.
    pub source_account: AccountId,
    /// Per-type payload.
    pub kind: TransactionKind,
    /// Amount to move.
    pub amount: Money,
    /// Free-form description.
    pub description: Option<String>,
    /// Step-up credential; required for everything except transfers
    /// between the caller's own accounts.
    pub backup_code: Option<String>,
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Approve a pending transaction.
    Approve {
        /// The new status after approval.
        new_status: TransactionStatus,
        /// The admin who approved.
        approved_by: UserId,
        /// When the transaction was approved.
        approved_at: DateTime<Utc>,
        /// Optional notes from the approver.
        admin_notes: Option<String>,
    },
    /// Decline a pending transaction.
    Decline {
        /// The new status after decline.
        new_status: TransactionStatus,
        /// The admin who declined.
        declined_by: UserId,
        /// When the transaction was declined.
        declined_at: DateTime<Utc>,
        /// The reason for declining.
        reason: String,
    },
    /// Reverse an approved transaction.
    Reverse {
        /// The new status after reversal.
        new_status: TransactionStatus,
        /// The admin who reversed.
        reversed_by: UserId,
        /// When the transaction was reversed.
        reversed_at: DateTime<Utc>,
        /// The reason for reversing.
        reason: String,
    },
    /// Restore a transaction to an earlier status after a failed
    /// settlement, clearing the stamps of the transition being undone.
    Restore {
        /// The status to restore.
        new_status: TransactionStatus,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> TransactionStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Decline { new_status, .. }
            | Self::Reverse { new_status, .. }
            | Self::Restore { new_status } => *new_status,
        }
    }
}

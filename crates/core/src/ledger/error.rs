//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

use meridian_shared::error::AppError;
use meridian_shared::types::{AccountId, Currency};

use crate::store::StoreError;

/// Errors that can occur during settlement.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced account does not exist.
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    /// A debit would drive the balance below zero.
    #[error("Insufficient funds in account {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The account being debited.
        account: AccountId,
        /// The amount requested.
        requested: Decimal,
        /// The balance available.
        available: Decimal,
    },

    /// The two legs of a pair are denominated in different currencies.
    #[error("Currency mismatch: {debit} vs {credit}")]
    CurrencyMismatch {
        /// Currency of the debit leg.
        debit: Currency,
        /// Currency of the credit leg.
        credit: Currency,
    },

    /// A balance moved between read and commit.
    #[error("Balance conflict: {0}")]
    Conflict(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::InsufficientFunds { .. } => 422,
            Self::CurrencyMismatch { .. } => 400,
            Self::Conflict(_) => 409,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::Conflict(_) => "BALANCE_CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds,
            LedgerError::AccountNotFound(id) => Self::NotFound(format!("account {id}")),
            LedgerError::CurrencyMismatch { .. } => Self::Validation(err.to_string()),
            LedgerError::Conflict(msg) => Self::Internal(msg),
            LedgerError::Storage(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_error() {
        let err = LedgerError::InsufficientFunds {
            account: AccountId::new(),
            requested: dec!(100),
            available: dec!(50),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn test_account_not_found_error() {
        let err = LedgerError::AccountNotFound(AccountId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "ACCOUNT_NOT_FOUND");
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: LedgerError = StoreError::Conflict("balance moved".into()).into();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }
}

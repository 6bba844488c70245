//! Application-wide error types.
//!
//! Every error surfaced to a caller carries a stable error code and a
//! message that never reveals which internal check failed. Module-level
//! errors in the core crate convert into this type at the boundary.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Stage-1 login failed. Never distinguishes bad email from bad password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The pending verification record is missing or past its TTL.
    #[error("Authentication expired, please log in again")]
    AuthenticationExpired,

    /// The supplied answer or code did not verify.
    #[error("Verification failed")]
    VerificationFailed,

    /// The backup code was already consumed.
    #[error("This backup code has already been used")]
    CodeAlreadyUsed,

    /// Request validation failed (bad amount, missing fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A debit would drive the account balance below zero.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// The requested status transition is not permitted.
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A concurrent decision already settled this transaction.
    #[error("Transaction has already been processed")]
    AlreadyProcessed,

    /// Caller lacks the required role.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::AuthenticationExpired
            | Self::VerificationFailed
            | Self::CodeAlreadyUsed => 401,
            Self::Validation(_) => 400,
            Self::InsufficientFunds => 422,
            Self::InvalidStateTransition(_) | Self::AlreadyProcessed => 409,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AuthenticationExpired => "AUTHENTICATION_EXPIRED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::CodeAlreadyUsed => "CODE_ALREADY_USED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::AlreadyProcessed => "ALREADY_PROCESSED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

//! Authentication error types.

use thiserror::Error;

use meridian_shared::error::AppError;

use crate::auth::secret::SecretError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Stage-1 failure. Deliberately silent about which field was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The pending verification is missing or past its TTL.
    #[error("authentication expired")]
    AuthenticationExpired,

    /// The supplied answer or code did not verify.
    #[error("verification failed")]
    VerificationFailed,

    /// The backup code was already consumed.
    #[error("backup code already used")]
    CodeAlreadyUsed,

    /// The refresh token does not resolve to an active session.
    #[error("session is invalid or revoked")]
    InvalidSession,

    /// Registration attempted with an email that is already in use.
    #[error("email is already registered")]
    EmailTaken,

    /// Secret hashing or verification failed unexpectedly.
    #[error("secret error: {0}")]
    Secret(String),

    /// Token encoding or decoding failed unexpectedly.
    #[error("token error: {0}")]
    Token(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::AuthenticationExpired
            | Self::VerificationFailed
            | Self::CodeAlreadyUsed
            | Self::InvalidSession => 401,
            Self::EmailTaken => 409,
            Self::Secret(_) | Self::Token(_) | Self::Storage(_) => 500,
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
            Self::InvalidSession => "INVALID_SESSION",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::Secret(_) => "SECRET_ERROR",
            Self::Token(_) => "TOKEN_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<SecretError> for AuthError {
    fn from(err: SecretError) -> Self {
        Self::Secret(err.to_string())
    }
}

impl From<crate::store::StoreError> for AuthError {
    fn from(err: crate::store::StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<meridian_shared::jwt::JwtError> for AuthError {
    fn from(err: meridian_shared::jwt::JwtError) -> Self {
        match err {
            meridian_shared::jwt::JwtError::Expired => Self::AuthenticationExpired,
            other => Self::Token(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::AuthenticationExpired => Self::AuthenticationExpired,
            AuthError::VerificationFailed => Self::VerificationFailed,
            AuthError::CodeAlreadyUsed => Self::CodeAlreadyUsed,
            AuthError::InvalidSession => Self::AuthenticationExpired,
            AuthError::EmailTaken => Self::Validation("email is already registered".to_string()),
            AuthError::Secret(msg) | AuthError::Token(msg) => Self::Internal(msg),
            AuthError::Storage(msg) => Self::Storage(msg),
        }
    }
}

//! Authentication: secret verification and the step-up login protocol.
//!
//! This module provides:
//! - Argon2id hashing and verification for passwords, security-question
//!   answers, and single-use backup codes
//! - The two-stage step-up authenticator (password, then second factor)
//! - Session issuance and refresh-token rotation
//!
//! # Modules
//!
//! - `types` - User, security question, backup code, pending verification
//! - `secret` - Hashing and constant-relative-time verification
//! - `error` - Authentication error types
//! - `stepup` - The two-stage login state machine

pub mod error;
pub mod secret;
pub mod stepup;
pub mod types;

pub use error::AuthError;
pub use secret::{
    SecretKind, hash_answer, hash_code, hash_password, verify, verify_answer, verify_code,
    verify_password,
};
pub use stepup::{AuthenticatedUser, StepUpAuthenticator, StepUpConfig};
pub use types::{BackupCode, PendingVerification, SecurityQuestion, Session, User, UserRole};

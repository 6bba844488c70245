//! Authentication types for JWT, tokens, and the two-stage login protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PendingVerificationId, QuestionId};

/// JWT claims for access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User's role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Token pair returned after successful stage-2 verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// The secondary factor a user verifies with in stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Answer one randomly chosen security question.
    SecurityQuestion,
    /// Supply an unused single-use backup code.
    BackupCode,
}

impl VerificationMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityQuestion => "security_question",
            Self::BackupCode => "backup_code",
        }
    }
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage-1 login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// The single security question presented in a stage-1 challenge.
///
/// Only one of the user's three questions is ever revealed at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedQuestion {
    /// Question ID, echoed back in stage 2.
    pub id: QuestionId,
    /// Question text.
    pub text: String,
}

/// Stage-1 success response: the second-factor challenge.
#[derive(Debug, Clone, Serialize)]
pub struct LoginChallenge {
    /// Handle for the pending verification.
    pub pending_id: PendingVerificationId,
    /// The verification method the user must complete.
    pub method: VerificationMethod,
    /// The issued question, present only for the question method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<IssuedQuestion>,
}

/// Stage-2 verification request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// Handle returned by stage 1.
    pub pending_id: PendingVerificationId,
    /// The verification method being completed.
    pub method: VerificationMethod,
    /// Question being answered; must match the issued question if present.
    pub question_id: Option<QuestionId>,
    /// Security-question answer (question method).
    pub answer: Option<String>,
    /// Backup code (backup-code method).
    pub backup_code: Option<String>,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// User full name.
    pub full_name: String,
    /// User role.
    pub role: String,
}

/// Stage-2 success response.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Session tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    /// The refresh token to invalidate.
    pub refresh_token: String,
}

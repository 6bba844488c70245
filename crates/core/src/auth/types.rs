//! Authentication domain types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use meridian_shared::auth::VerificationMethod;
use meridian_shared::types::{BackupCodeId, PendingVerificationId, QuestionId, SessionId, UserId};

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Holds accounts, submits transactions.
    Customer,
    /// Reviews and decides queued transactions.
    Admin,
}

impl UserRole {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role can decide queued transactions.
    #[must_use]
    pub const fn can_decide(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Login email, unique.
    pub email: String,
    /// Full name.
    pub full_name: String,
    /// Argon2id hash of the password.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
    /// The second factor this user verifies with.
    pub verification_preference: VerificationMethod,
    /// Disabled accounts cannot log in.
    pub is_active: bool,
}

/// A security question configured by a user.
///
/// Each user with the question method configured holds exactly three.
#[derive(Debug, Clone)]
pub struct SecurityQuestion {
    /// Unique identifier.
    pub id: QuestionId,
    /// Owning user.
    pub user_id: UserId,
    /// The question text shown to the user.
    pub question: String,
    /// Argon2id hash of the normalized (trimmed, lower-cased) answer.
    pub answer_hash: String,
}

/// A single-use backup code.
#[derive(Debug, Clone)]
pub struct BackupCode {
    /// Unique identifier.
    pub id: BackupCodeId,
    /// Owning user.
    pub user_id: UserId,
    /// Argon2id hash of the code.
    pub code_hash: String,
    /// A consumed code can never satisfy a check again.
    pub used: bool,
}

/// Ephemeral record created after stage-1 login success.
///
/// Consumed on a successful stage-2 attempt; inert once past its TTL.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    /// Unique identifier, handed to the client as the stage-2 handle.
    pub id: PendingVerificationId,
    /// The user who passed stage 1.
    pub user_id: UserId,
    /// The verification method selected at stage 1.
    pub method: VerificationMethod,
    /// The single question issued, for the question method only.
    pub question_id: Option<QuestionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    /// Creates a new pending verification with the given TTL.
    #[must_use]
    pub fn new(
        user_id: UserId,
        method: VerificationMethod,
        question_id: Option<QuestionId>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PendingVerificationId::new(),
            user_id,
            method,
            question_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Returns true if the record is past its TTL at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An issued session, stored with a hashed refresh token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// SHA-256 digest of the refresh token.
    pub refresh_token_hash: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Set when the session is revoked (logout or rotation).
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns true if the session is usable at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

//! Secret hashing and verification with Argon2id.
//!
//! Every stored secret (password, security-question answer, backup code)
//! is an Argon2id PHC string. Verification resolves through the same code
//! path whether or not a matching record exists, so callers cannot tell
//! "wrong value" from "no such record" by timing.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use thiserror::Error;

/// Alphabet for generated backup codes. Ambiguous glyphs (0/O, 1/I/L) excluded.
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Length of each half of a generated backup code.
const CODE_GROUP_LEN: usize = 5;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to hash a secret.
    #[error("failed to hash secret: {0}")]
    HashError(String),

    /// Failed to verify a secret.
    #[error("failed to verify secret: {0}")]
    VerifyError(String),

    /// Invalid stored hash format.
    #[error("invalid secret hash format")]
    InvalidHash,
}

/// The kinds of stored secrets this module verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    /// Login password.
    Password,
    /// Security-question answer; compared case-insensitively, trimmed.
    SecurityAnswer,
    /// Single-use backup code.
    BackupCode,
}

/// Verifies a presented secret of the given kind against a stored hash.
///
/// Thin dispatcher over the per-kind functions, which apply the kind's
/// normalization before comparing.
///
/// # Errors
///
/// Returns `SecretError::InvalidHash` if the hash format is invalid.
pub fn verify(kind: SecretKind, presented: &str, hash: &str) -> Result<bool, SecretError> {
    match kind {
        SecretKind::Password => verify_password(presented, hash),
        SecretKind::SecurityAnswer => verify_answer(presented, hash),
        SecretKind::BackupCode => verify_code(presented, hash),
    }
}

fn hash_secret(secret: &str) -> Result<String, SecretError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SecretError::HashError(e.to_string()))
}

fn verify_secret(secret: &str, hash: &str) -> Result<bool, SecretError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| SecretError::InvalidHash)?;

    let argon2 = Argon2::default();

    match argon2.verify_password(secret.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(SecretError::VerifyError(e.to_string())),
    }
}

/// Hashes a password using Argon2id.
///
/// # Errors
///
/// Returns `SecretError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, SecretError> {
    hash_secret(password)
}

/// Verifies a password against a stored hash.
///
/// # Errors
///
/// Returns `SecretError::InvalidHash` if the hash format is invalid.
/// Returns `SecretError::VerifyError` if verification fails unexpectedly.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, SecretError> {
    verify_secret(password, hash)
}

/// Normalizes a security-question answer: trimmed and lower-cased.
#[must_use]
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Hashes a security-question answer after normalization.
///
/// # Errors
///
/// Returns `SecretError::HashError` if hashing fails.
pub fn hash_answer(answer: &str) -> Result<String, SecretError> {
    hash_secret(&normalize_answer(answer))
}

/// Verifies a security-question answer against a stored hash.
///
/// Comparison is case-insensitive and ignores surrounding whitespace.
///
/// # Errors
///
/// Returns `SecretError::InvalidHash` if the hash format is invalid.
pub fn verify_answer(answer: &str, hash: &str) -> Result<bool, SecretError> {
    verify_secret(&normalize_answer(answer), hash)
}

/// Normalizes a backup code: trimmed and upper-cased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Hashes a backup code after normalization.
///
/// # Errors
///
/// Returns `SecretError::HashError` if hashing fails.
pub fn hash_code(code: &str) -> Result<String, SecretError> {
    hash_secret(&normalize_code(code))
}

/// Verifies a backup code against a stored hash.
///
/// # Errors
///
/// Returns `SecretError::InvalidHash` if the hash format is invalid.
pub fn verify_code(code: &str, hash: &str) -> Result<bool, SecretError> {
    verify_secret(&normalize_code(code), hash)
}

/// Generates a random backup code in `XXXXX-XXXXX` form.
#[must_use]
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    let mut pick = |len: usize| -> String {
        (0..len)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                char::from(CODE_ALPHABET[idx])
            })
            .collect()
    };
    format!("{}-{}", pick(CODE_GROUP_LEN), pick(CODE_GROUP_LEN))
}

/// Burns one verification against a fixed hash.
///
/// Called when a lookup misses so that the caller's response time does not
/// reveal whether the record existed.
pub fn dummy_verify(presented: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let hash =
        DUMMY_HASH.get_or_init(|| hash_secret("meridian-timing-pad").unwrap_or_default());
    let _ = verify_secret(presented, hash);
}

/// Hashes a refresh token for storage (SHA-256 hex digest).
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_hash_password() {
        let password = "test_password_123!";
        let hash = hash_password(password).unwrap();

        // Hash should be in PHC format
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, password);
    }

    #[test]
    fn test_verify_correct_password() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password("password1").unwrap();
        let hash2 = hash_password("password1").unwrap();

        // Random salt per hash
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid_hash");
        assert!(matches!(result, Err(SecretError::InvalidHash)));
    }

    #[test]
    fn test_answer_comparison_is_normalized() {
        let hash = hash_answer("  Rex the Dog  ").unwrap();

        assert!(verify_answer("rex the dog", &hash).unwrap());
        assert!(verify_answer("REX THE DOG", &hash).unwrap());
        assert!(verify_answer(" Rex The Dog ", &hash).unwrap());
        assert!(!verify_answer("rex", &hash).unwrap());
    }

    #[test]
    fn test_code_comparison_is_normalized() {
        let hash = hash_code("ABCDE-FGHJK").unwrap();

        assert!(verify_code("abcde-fghjk", &hash).unwrap());
        assert!(verify_code(" ABCDE-FGHJK ", &hash).unwrap());
        assert!(!verify_code("ABCDE-FGHJZ", &hash).unwrap());
    }

    #[test]
    fn test_generate_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate_code(&mut rng);

        assert_eq!(code.len(), CODE_GROUP_LEN * 2 + 1);
        assert_eq!(code.chars().filter(|c| *c == '-').count(), 1);
        for c in code.chars().filter(|c| *c != '-') {
            assert!(CODE_ALPHABET.contains(&(c as u8)), "unexpected char {c}");
        }
    }

    #[test]
    fn test_generate_code_seeded_is_deterministic() {
        let a = generate_code(&mut StdRng::seed_from_u64(42));
        let b = generate_code(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_dispatches_by_kind() {
        let hash = hash_answer("Rex").unwrap();
        assert!(verify(SecretKind::SecurityAnswer, "  REX ", &hash).unwrap());
        // The password path applies no normalization.
        assert!(!verify(SecretKind::Password, "  REX ", &hash).unwrap());
    }

    #[test]
    fn test_hash_token_is_stable() {
        let a = hash_token("some-refresh-token");
        let b = hash_token("some-refresh-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}

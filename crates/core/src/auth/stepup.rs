//! The two-stage step-up authenticator.
//!
//! Stage 1 verifies the password and issues a second-factor challenge;
//! stage 2 verifies the challenge and only then mints a session. The same
//! backup-code path doubles as transaction-level re-authentication for the
//! workflow engine.
//!
//! The one-of-three question choice is driven by a seedable RNG so the
//! "never reveal all recovery questions at once" property is testable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use chrono::{Duration, Utc};

use meridian_shared::auth::{
    IssuedQuestion, LoginChallenge, TokenPair, UserInfo, VerificationMethod, VerifyRequest,
};
use meridian_shared::config::VerificationConfig;
use meridian_shared::jwt::JwtService;
use meridian_shared::types::{SessionId, UserId};

use crate::auth::error::AuthError;
use crate::auth::secret;
use crate::auth::types::{BackupCode, PendingVerification, SecurityQuestion, Session, User, UserRole};
use crate::store::{PendingStore, SessionStore, StoreError, UserStore};

/// Number of security questions each user must hold for the question method.
const REQUIRED_QUESTION_COUNT: usize = 3;

/// Step-up authenticator configuration.
#[derive(Debug, Clone)]
pub struct StepUpConfig {
    /// Lifetime of a pending verification record.
    pub pending_ttl: Duration,
    /// Number of backup codes issued per batch.
    pub backup_code_count: u8,
}

impl Default for StepUpConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::minutes(5),
            backup_code_count: 10,
        }
    }
}

impl StepUpConfig {
    /// Builds the config from loaded application settings.
    #[must_use]
    pub fn from_settings(settings: &VerificationConfig) -> Self {
        let ttl_secs = i64::try_from(settings.pending_ttl_secs).unwrap_or(300);
        Self {
            pending_ttl: Duration::seconds(ttl_secs),
            backup_code_count: settings.backup_code_count,
        }
    }
}

/// The identity attached to a verified session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID.
    pub id: UserId,
    /// User email.
    pub email: String,
    /// User full name.
    pub full_name: String,
    /// User role.
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Builds the wire-facing user info.
    #[must_use]
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.into_inner(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.as_str().to_string(),
        }
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// Orchestrates the two-stage login protocol and session maintenance.
pub struct StepUpAuthenticator {
    users: Arc<dyn UserStore>,
    pending: Arc<dyn PendingStore>,
    sessions: Arc<dyn SessionStore>,
    jwt: JwtService,
    config: StepUpConfig,
    rng: Mutex<StdRng>,
}

impl StepUpAuthenticator {
    /// Creates a new authenticator with an entropy-seeded RNG.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        pending: Arc<dyn PendingStore>,
        sessions: Arc<dyn SessionStore>,
        jwt: JwtService,
        config: StepUpConfig,
    ) -> Self {
        Self {
            users,
            pending,
            sessions,
            jwt,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates an authenticator with a fixed RNG seed.
    ///
    /// Question selection becomes deterministic; used by tests.
    #[must_use]
    pub fn with_seed(
        users: Arc<dyn UserStore>,
        pending: Arc<dyn PendingStore>,
        sessions: Arc<dyn SessionStore>,
        jwt: JwtService,
        config: StepUpConfig,
        seed: u64,
    ) -> Self {
        Self {
            users,
            pending,
            sessions,
            jwt,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Stage 1: verifies the password and issues a second-factor challenge.
    ///
    /// No session is minted here. Failures are a uniform
    /// `InvalidCredentials` - the caller learns nothing about whether the
    /// email exists, and a missed lookup still burns one hash verification
    /// so response times stay flat.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any bad email/password
    /// combination, including disabled accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginChallenge, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            secret::dummy_verify(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            secret::dummy_verify(password);
            return Err(AuthError::InvalidCredentials);
        }

        if !secret::verify_password(password, &user.password_hash)? {
            info!(user_id = %user.id, "stage-1 login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let challenge = match user.verification_preference {
            VerificationMethod::SecurityQuestion => {
                let questions = self.users.security_questions(user.id).await?;
                if questions.len() != REQUIRED_QUESTION_COUNT {
                    return Err(AuthError::Storage(format!(
                        "user {} has {} security questions configured, expected {}",
                        user.id,
                        questions.len(),
                        REQUIRED_QUESTION_COUNT
                    )));
                }

                // One question, chosen uniformly at random. The other two
                // are never revealed in this challenge.
                let index = {
                    let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    rng.gen_range(0..questions.len())
                };
                let question = &questions[index];

                let pending = PendingVerification::new(
                    user.id,
                    VerificationMethod::SecurityQuestion,
                    Some(question.id),
                    self.config.pending_ttl,
                );
                let pending_id = pending.id;
                self.pending.put(pending).await?;

                LoginChallenge {
                    pending_id,
                    method: VerificationMethod::SecurityQuestion,
                    question: Some(IssuedQuestion {
                        id: question.id,
                        text: question.question.clone(),
                    }),
                }
            }
            VerificationMethod::BackupCode => {
                let pending = PendingVerification::new(
                    user.id,
                    VerificationMethod::BackupCode,
                    None,
                    self.config.pending_ttl,
                );
                let pending_id = pending.id;
                self.pending.put(pending).await?;

                LoginChallenge {
                    pending_id,
                    method: VerificationMethod::BackupCode,
                    question: None,
                }
            }
        };

        info!(user_id = %user.id, method = %challenge.method, "stage-1 login passed, challenge issued");
        Ok(challenge)
    }

    /// Stage 2: verifies the challenge and mints a session.
    ///
    /// A wrong answer or code leaves the pending record usable until its
    /// TTL; an expired or unknown pending record fails closed.
    ///
    /// # Errors
    ///
    /// * `AuthError::AuthenticationExpired` - pending missing or past TTL
    /// * `AuthError::VerificationFailed` - wrong answer, code, or method
    /// * `AuthError::CodeAlreadyUsed` - the matched code was consumed
    pub async fn verify(
        &self,
        request: &VerifyRequest,
    ) -> Result<(AuthenticatedUser, TokenPair), AuthError> {
        let Some(pending) = self.pending.get(request.pending_id).await? else {
            return Err(AuthError::AuthenticationExpired);
        };

        if pending.is_expired(Utc::now()) {
            self.pending.remove(pending.id).await?;
            return Err(AuthError::AuthenticationExpired);
        }

        if request.method != pending.method {
            return Err(AuthError::VerificationFailed);
        }

        match pending.method {
            VerificationMethod::SecurityQuestion => {
                self.check_answer(&pending, request).await?;
            }
            VerificationMethod::BackupCode => {
                let code = request
                    .backup_code
                    .as_deref()
                    .ok_or(AuthError::VerificationFailed)?;
                self.consume_backup_code(pending.user_id, code).await?;
            }
        }

        self.pending.remove(pending.id).await?;

        let user = self
            .users
            .find_by_id(pending.user_id)
            .await?
            .ok_or_else(|| AuthError::Storage("user record vanished mid-login".to_string()))?;

        let tokens = self.issue_session(&user).await?;
        info!(user_id = %user.id, "step-up verification complete, session issued");
        Ok((AuthenticatedUser::from(&user), tokens))
    }

    /// Transaction-level re-authentication with a backup code.
    ///
    /// Same matching and at-most-one-use consumption as the login path,
    /// applied to an already-authenticated user.
    ///
    /// # Errors
    ///
    /// * `AuthError::VerificationFailed` - no unused code matches
    /// * `AuthError::CodeAlreadyUsed` - the matched code was consumed
    pub async fn verify_transaction_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<(), AuthError> {
        self.consume_backup_code(user_id, code).await
    }

    /// Rotates a refresh token into a fresh session.
    ///
    /// The old session is revoked before the new pair is issued, keeping a
    /// single active refresh chain per login.
    ///
    /// # Errors
    ///
    /// * `AuthError::AuthenticationExpired` - the token itself expired
    /// * `AuthError::InvalidSession` - unknown, revoked, or orphaned session
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.jwt.validate_token(refresh_token)?;

        let hash = secret::hash_token(refresh_token);
        let Some(session) = self.sessions.find_by_token_hash(&hash).await? else {
            return Err(AuthError::InvalidSession);
        };

        if !session.is_active(Utc::now()) {
            return Err(AuthError::InvalidSession);
        }

        let user = self
            .users
            .find_by_id(UserId::from_uuid(claims.sub))
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidSession)?;

        self.sessions.revoke(session.id).await?;
        self.issue_session(&user).await
    }

    /// Invalidates the session bound to a refresh token.
    ///
    /// Logout is idempotent: an unknown token is a no-op.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let hash = secret::hash_token(refresh_token);
        if let Some(session) = self.sessions.find_by_token_hash(&hash).await? {
            self.sessions.revoke(session.id).await?;
            info!(user_id = %session.user_id, "session revoked on logout");
        }
        Ok(())
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
        preference: VerificationMethod,
    ) -> Result<User, AuthError> {
        let user = User {
            id: UserId::new(),
            email: email.to_lowercase(),
            full_name: full_name.to_string(),
            password_hash: secret::hash_password(password)?,
            role,
            verification_preference: preference,
            is_active: true,
        };

        match self.users.create(user.clone()).await {
            Ok(()) => {
                info!(user_id = %user.id, "user registered");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => Err(AuthError::EmailTaken),
            Err(other) => Err(other.into()),
        }
    }

    /// Replaces the user's password and revokes every open session.
    pub async fn update_credential(
        &self,
        user_id: UserId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let hash = secret::hash_password(new_password)?;
        self.users.update_credential(user_id, hash).await?;
        let revoked = self.sessions.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "credential updated, open sessions revoked");
        Ok(())
    }

    /// Configures the user's three security questions.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` unless exactly three distinct
    /// questions are supplied.
    pub async fn configure_questions(
        &self,
        user_id: UserId,
        questions: &[(String, String)],
    ) -> Result<(), AuthError> {
        if questions.len() != REQUIRED_QUESTION_COUNT {
            return Err(AuthError::Storage(format!(
                "expected {REQUIRED_QUESTION_COUNT} security questions, got {}",
                questions.len()
            )));
        }

        let mut texts: Vec<&str> = questions.iter().map(|(q, _)| q.as_str()).collect();
        texts.sort_unstable();
        texts.dedup();
        if texts.len() != REQUIRED_QUESTION_COUNT {
            return Err(AuthError::Storage(
                "security questions must be distinct".to_string(),
            ));
        }

        let mut records = Vec::with_capacity(questions.len());
        for (question, answer) in questions {
            records.push(SecurityQuestion {
                id: meridian_shared::types::QuestionId::new(),
                user_id,
                question: question.clone(),
                answer_hash: secret::hash_answer(answer)?,
            });
        }

        self.users.set_security_questions(user_id, records).await?;
        Ok(())
    }

    /// Issues a fresh batch of backup codes, replacing any existing ones.
    ///
    /// Returns the plaintext codes; they are never recoverable afterwards.
    pub async fn issue_backup_codes(&self, user_id: UserId) -> Result<Vec<String>, AuthError> {
        let count = usize::from(self.config.backup_code_count);
        let plaintexts: Vec<String> = {
            let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            (0..count).map(|_| secret::generate_code(&mut *rng)).collect()
        };

        let mut records = Vec::with_capacity(count);
        for code in &plaintexts {
            records.push(BackupCode {
                id: meridian_shared::types::BackupCodeId::new(),
                user_id,
                code_hash: secret::hash_code(code)?,
                used: false,
            });
        }

        self.users.replace_backup_codes(user_id, records).await?;
        info!(user_id = %user_id, count, "backup codes issued");
        Ok(plaintexts)
    }

    /// Checks the stage-2 answer against the specific question issued in
    /// stage 1. A correct answer to a different question must not validate.
    async fn check_answer(
        &self,
        pending: &PendingVerification,
        request: &VerifyRequest,
    ) -> Result<(), AuthError> {
        let answer = request
            .answer
            .as_deref()
            .ok_or(AuthError::VerificationFailed)?;

        let issued_id = pending
            .question_id
            .ok_or_else(|| AuthError::Storage("pending record missing question".to_string()))?;

        // Clients may echo the question id back; a mismatch never validates.
        if let Some(supplied) = request.question_id
            && supplied != issued_id
        {
            return Err(AuthError::VerificationFailed);
        }

        let questions = self.users.security_questions(pending.user_id).await?;
        let question = questions
            .iter()
            .find(|q| q.id == issued_id)
            .ok_or_else(|| AuthError::Storage("issued question vanished".to_string()))?;

        if !secret::verify_answer(answer, &question.answer_hash)? {
            warn!(user_id = %pending.user_id, "stage-2 answer rejected");
            return Err(AuthError::VerificationFailed);
        }
        Ok(())
    }

    /// Matches a code against the user's backup codes and consumes it.
    ///
    /// The consumed flag is flipped with a compare-and-swap in the store,
    /// so two racing attempts on the same code settle to exactly one win.
    async fn consume_backup_code(&self, user_id: UserId, code: &str) -> Result<(), AuthError> {
        let codes = self.users.backup_codes(user_id).await?;

        for record in &codes {
            if !secret::verify_code(code, &record.code_hash)? {
                continue;
            }
            if record.used {
                warn!(user_id = %user_id, code_id = %record.id, "reuse of consumed backup code");
                return Err(AuthError::CodeAlreadyUsed);
            }
            return match self.users.mark_backup_code_used(record.id).await {
                Ok(()) => Ok(()),
                Err(StoreError::Conflict(_)) => Err(AuthError::CodeAlreadyUsed),
                Err(other) => Err(other.into()),
            };
        }

        Err(AuthError::VerificationFailed)
    }

    /// Mints an access/refresh pair and persists the session.
    async fn issue_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self
            .jwt
            .generate_access_token(user.id.into_inner(), user.role.as_str())?;
        let refresh = self
            .jwt
            .generate_refresh_token(user.id.into_inner(), user.role.as_str())?;

        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            user_id: user.id,
            refresh_token_hash: secret::hash_token(&refresh),
            issued_at: now,
            expires_at: now + Duration::days(self.jwt.refresh_token_expires_days()),
            revoked_at: None,
        };
        self.sessions.create(session).await?;

        Ok(TokenPair::new(
            access,
            refresh,
            self.jwt.access_token_expires_in(),
        ))
    }
}

impl std::fmt::Debug for StepUpAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepUpAuthenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

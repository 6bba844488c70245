//! Shared wiring for integration tests: in-memory stores behind the real
//! authenticator, engine, and approval gate.
#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;

use meridian_core::auth::stepup::{AuthenticatedUser, StepUpAuthenticator, StepUpConfig};
use meridian_core::auth::types::UserRole;
use meridian_core::ledger::LedgerService;
use meridian_core::ledger::types::{Account, AccountKind};
use meridian_core::store::AccountStore;
use meridian_core::workflow::{ApprovalGate, TransactionEngine};
use meridian_shared::auth::VerificationMethod;
use meridian_shared::jwt::{JwtConfig, JwtService};
use meridian_shared::types::{AccountId, Currency};
use meridian_store::{
    MemoryAccountStore, MemoryPendingStore, MemorySessionStore, MemoryTransactionStore,
    MemoryUserStore,
};

/// The three fixed security questions used by question-method fixtures.
pub const QUESTIONS: [(&str, &str); 3] = [
    ("What was your first pet's name?", "rex"),
    ("What city were you born in?", "lagos"),
    ("What was the make of your first car?", "corolla"),
];

/// Fully wired test bank.
pub struct TestBank {
    pub users: Arc<MemoryUserStore>,
    pub accounts: Arc<MemoryAccountStore>,
    pub transactions: Arc<MemoryTransactionStore>,
    pub stepup: Arc<StepUpAuthenticator>,
    pub engine: Arc<TransactionEngine>,
    pub gate: Arc<ApprovalGate>,
    pub jwt: JwtService,
}

/// Builds a bank with the default seed and config.
pub fn bank() -> TestBank {
    bank_with(17, StepUpConfig::default())
}

/// Builds a bank with an explicit RNG seed and step-up config.
pub fn bank_with(seed: u64, config: StepUpConfig) -> TestBank {
    let users = Arc::new(MemoryUserStore::new());
    let pending = Arc::new(MemoryPendingStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let transactions = Arc::new(MemoryTransactionStore::new());

    let jwt = JwtService::new(JwtConfig {
        secret: "integration-test-secret".to_string(),
        ..JwtConfig::default()
    });

    let stepup = Arc::new(StepUpAuthenticator::with_seed(
        users.clone(),
        pending.clone(),
        sessions.clone(),
        jwt.clone(),
        config,
        seed,
    ));

    let engine = Arc::new(TransactionEngine::new(
        transactions.clone(),
        accounts.clone(),
        LedgerService::new(accounts.clone()),
        stepup.clone(),
    ));

    let gate = Arc::new(ApprovalGate::new(engine.clone()));

    TestBank {
        users,
        accounts,
        transactions,
        stepup,
        engine,
        gate,
        jwt,
    }
}

impl TestBank {
    /// Registers a customer with backup codes issued; returns the identity
    /// and the plaintext codes.
    pub async fn customer_with_codes(&self, email: &str) -> (AuthenticatedUser, Vec<String>) {
        let user = self
            .stepup
            .register(
                email,
                "S3cure-password!",
                "Test Customer",
                UserRole::Customer,
                VerificationMethod::BackupCode,
            )
            .await
            .expect("register customer");
        let codes = self
            .stepup
            .issue_backup_codes(user.id)
            .await
            .expect("issue backup codes");
        (AuthenticatedUser::from(&user), codes)
    }

    /// Registers a customer with the question method and the fixed
    /// [`QUESTIONS`] configured.
    pub async fn question_customer(&self, email: &str) -> AuthenticatedUser {
        let user = self
            .stepup
            .register(
                email,
                "S3cure-password!",
                "Question Customer",
                UserRole::Customer,
                VerificationMethod::SecurityQuestion,
            )
            .await
            .expect("register customer");
        let questions: Vec<(String, String)> = QUESTIONS
            .iter()
            .map(|(q, a)| ((*q).to_string(), (*a).to_string()))
            .collect();
        self.stepup
            .configure_questions(user.id, &questions)
            .await
            .expect("configure questions");
        AuthenticatedUser::from(&user)
    }

    /// Registers an admin.
    pub async fn admin(&self, email: &str) -> AuthenticatedUser {
        let user = self
            .stepup
            .register(
                email,
                "Adm1n-password!",
                "Test Admin",
                UserRole::Admin,
                VerificationMethod::BackupCode,
            )
            .await
            .expect("register admin");
        AuthenticatedUser::from(&user)
    }

    /// Opens a USD checking account for the user.
    pub async fn open_account(&self, owner: &AuthenticatedUser, balance: Decimal) -> AccountId {
        let account = Account::new(owner.id, AccountKind::Checking, Currency::Usd, balance);
        let id = account.id;
        self.accounts.create(account).await.expect("create account");
        id
    }

    /// Reads a settled balance.
    pub async fn balance(&self, id: AccountId) -> Decimal {
        self.accounts
            .get(id)
            .await
            .expect("read account")
            .expect("account exists")
            .balance
    }

    /// Looks up the configured answer for a question text.
    pub fn answer_for(question_text: &str) -> &'static str {
        QUESTIONS
            .iter()
            .find(|(q, _)| *q == question_text)
            .map(|(_, a)| *a)
            .expect("known question")
    }

    /// Looks up the configured answer for any question other than the one
    /// issued.
    pub fn other_answer(question_text: &str) -> &'static str {
        QUESTIONS
            .iter()
            .find(|(q, _)| *q != question_text)
            .map(|(_, a)| *a)
            .expect("other question")
    }
}

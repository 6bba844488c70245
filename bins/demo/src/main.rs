//! Meridian demo
//!
//! Wires the in-memory stores behind the real authenticator, engine, and
//! approval gate, then walks the full flow: two-stage login, an internal
//! transfer, a gated domestic transfer, a decline, and a reversal.

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meridian_core::auth::stepup::{AuthenticatedUser, StepUpAuthenticator, StepUpConfig};
use meridian_core::auth::types::UserRole;
use meridian_core::ledger::LedgerService;
use meridian_core::ledger::types::{Account, AccountKind};
use meridian_core::store::AccountStore;
use meridian_core::workflow::types::{SubmitTransaction, TransactionKind};
use meridian_core::workflow::{ApprovalGate, TransactionEngine};
use meridian_shared::auth::{VerificationMethod, VerifyRequest};
use meridian_shared::config::{AppConfig, JwtSettings, VerificationConfig};
use meridian_shared::jwt::{JwtConfig, JwtService};
use meridian_shared::types::{AccountId, Currency, Money};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, falling back to development defaults
    let config = AppConfig::load().unwrap_or_else(|_| AppConfig {
        jwt: JwtSettings {
            secret: "demo-only-secret".to_string(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604_800,
        },
        verification: VerificationConfig::default(),
    });

    #[allow(clippy::cast_possible_wrap)]
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
        refresh_token_expires_days: (config.jwt.refresh_token_expiry_secs / 86400) as i64,
    });

    // Wire the in-memory stores behind the core services
    let users = Arc::new(meridian_store::MemoryUserStore::new());
    let pending = Arc::new(meridian_store::MemoryPendingStore::new());
    let sessions = Arc::new(meridian_store::MemorySessionStore::new());
    let accounts = Arc::new(meridian_store::MemoryAccountStore::new());
    let transactions = Arc::new(meridian_store::MemoryTransactionStore::new());

    let stepup = Arc::new(StepUpAuthenticator::new(
        users.clone(),
        pending,
        sessions,
        jwt,
        StepUpConfig::from_settings(&config.verification),
    ));
    let engine = Arc::new(TransactionEngine::new(
        transactions,
        accounts.clone(),
        LedgerService::new(accounts.clone()),
        stepup.clone(),
    ));
    let gate = ApprovalGate::new(engine.clone());

    // Seed a customer and an admin
    let customer = stepup
        .register(
            "alice@example.com",
            "correct-horse-battery",
            "Alice Customer",
            UserRole::Customer,
            VerificationMethod::SecurityQuestion,
        )
        .await?;
    stepup
        .configure_questions(
            customer.id,
            &[
                (
                    "What was your first pet's name?".to_string(),
                    "Rex".to_string(),
                ),
                (
                    "What city were you born in?".to_string(),
                    "Lagos".to_string(),
                ),
                (
                    "What was the make of your first car?".to_string(),
                    "Corolla".to_string(),
                ),
            ],
        )
        .await?;
    let backup_codes = stepup.issue_backup_codes(customer.id).await?;
    info!(count = backup_codes.len(), "backup codes issued to customer");

    let admin_user = stepup
        .register(
            "root@meridian.example",
            "very-admin-much-secure",
            "Morgan Admin",
            UserRole::Admin,
            VerificationMethod::BackupCode,
        )
        .await?;
    let admin = AuthenticatedUser::from(&admin_user);

    let checking = open_account(&accounts, customer.id, Decimal::from(1_000)).await?;
    let savings = open_account(&accounts, customer.id, Decimal::ZERO).await?;

    // Two-stage login: password, then the one issued security question
    let challenge = stepup
        .login("alice@example.com", "correct-horse-battery")
        .await?;
    let question = challenge.question.context("question challenge expected")?;
    info!(question = %question.text, "stage-1 passed, one question issued");

    // The demo cheats and knows every answer; a real client asks the user.
    let answer = match question.text.as_str() {
        "What was your first pet's name?" => "rex",
        "What city were you born in?" => "lagos",
        _ => "corolla",
    };
    let (alice, tokens) = stepup
        .verify(&VerifyRequest {
            pending_id: challenge.pending_id,
            method: VerificationMethod::SecurityQuestion,
            question_id: Some(question.id),
            answer: Some(answer.to_string()),
            backup_code: None,
        })
        .await?;
    info!(user = %alice.email, expires_in = tokens.expires_in, "session issued");

    // Internal transfer between own accounts: no backup code needed
    let transfer = engine
        .submit(
            &alice,
            SubmitTransaction {
                source_account: checking,
                kind: TransactionKind::InternalTransfer { to: savings },
                amount: Money::new(Decimal::from(500), Currency::Usd),
                description: Some("rainy day fund".to_string()),
                backup_code: None,
            },
        )
        .await?;
    info!(reference = %transfer.reference, status = %transfer.status, "internal transfer queued");

    let approved = gate.approve(&admin, transfer.id, None).await?;
    info!(
        status = %approved.status,
        checking = %balance(&accounts, checking).await?,
        savings = %balance(&accounts, savings).await?,
        "internal transfer settled"
    );

    // Domestic transfer: step-up required, then declined by the admin
    let outbound = engine
        .submit(
            &alice,
            SubmitTransaction {
                source_account: checking,
                kind: TransactionKind::DomesticTransfer {
                    bank_name: "First National".to_string(),
                    routing_number: "021000021".to_string(),
                    account_number: "000123456789".to_string(),
                    account_holder: "P. Recipient".to_string(),
                },
                amount: Money::new(Decimal::from(200), Currency::Usd),
                description: None,
                backup_code: Some(backup_codes[0].clone()),
            },
        )
        .await?;
    let declined = gate
        .decline(&admin, outbound.id, "unverified recipient".to_string())
        .await?;
    info!(
        reference = %declined.reference,
        status = %declined.status,
        reason = declined.decline_reason.as_deref().unwrap_or_default(),
        "domestic transfer declined, no balance change"
    );

    // Withdrawal, approved, then reversed
    let withdrawal = engine
        .submit(
            &alice,
            SubmitTransaction {
                source_account: checking,
                kind: TransactionKind::Withdrawal,
                amount: Money::new(Decimal::from(100), Currency::Usd),
                description: None,
                backup_code: Some(backup_codes[1].clone()),
            },
        )
        .await?;
    gate.approve(&admin, withdrawal.id, None).await?;
    info!(checking = %balance(&accounts, checking).await?, "withdrawal settled");

    let reversed = gate
        .reverse(&admin, withdrawal.id, "teller error".to_string())
        .await?;
    info!(
        status = %reversed.status,
        checking = %balance(&accounts, checking).await?,
        "withdrawal reversed, balance restored"
    );

    Ok(())
}

async fn open_account(
    accounts: &Arc<meridian_store::MemoryAccountStore>,
    owner: meridian_shared::types::UserId,
    balance: Decimal,
) -> anyhow::Result<AccountId> {
    let account = Account::new(owner, AccountKind::Checking, Currency::Usd, balance);
    let id = account.id;
    accounts
        .create(account)
        .await
        .map_err(|e| anyhow::anyhow!("seed account: {e}"))?;
    Ok(id)
}

async fn balance(
    accounts: &Arc<meridian_store::MemoryAccountStore>,
    id: AccountId,
) -> anyhow::Result<Decimal> {
    let account = accounts
        .get(id)
        .await
        .map_err(|e| anyhow::anyhow!("read account: {e}"))?
        .context("account exists")?;
    Ok(account.balance)
}

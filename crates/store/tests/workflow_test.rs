//! Integration tests for the transaction workflow: submission, the
//! step-up gate, approval, decline, and reversal.

mod common;

use rust_decimal_macros::dec;

use common::bank;
use meridian_core::auth::AuthError;
use meridian_core::ledger::LedgerError;
use meridian_core::workflow::types::{
    SubmitTransaction, TransactionKind, TransactionStatus,
};
use meridian_core::workflow::WorkflowError;
use meridian_shared::types::{AccountId, Currency, Money};

fn usd(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::Usd)
}

fn internal_transfer(
    source: AccountId,
    to: AccountId,
    amount: rust_decimal::Decimal,
) -> SubmitTransaction {
    SubmitTransaction {
        source_account: source,
        kind: TransactionKind::InternalTransfer { to },
        amount: usd(amount),
        description: Some("between my accounts".to_string()),
        backup_code: None,
    }
}

fn withdrawal(
    source: AccountId,
    amount: rust_decimal::Decimal,
    backup_code: Option<&str>,
) -> SubmitTransaction {
    SubmitTransaction {
        source_account: source,
        kind: TransactionKind::Withdrawal,
        amount: usd(amount),
        description: None,
        backup_code: backup_code.map(str::to_string),
    }
}

fn domestic_transfer(
    source: AccountId,
    amount: rust_decimal::Decimal,
    backup_code: Option<&str>,
) -> SubmitTransaction {
    SubmitTransaction {
        source_account: source,
        kind: TransactionKind::DomesticTransfer {
            bank_name: "First Meridian Bank".to_string(),
            routing_number: "021000021".to_string(),
            account_number: "000123456789".to_string(),
            account_holder: "Pat Recipient".to_string(),
        },
        amount: usd(amount),
        description: None,
        backup_code: backup_code.map(str::to_string),
    }
}

// ============================================================================
// Submission validation
// ============================================================================

#[tokio::test]
async fn test_non_positive_amount_rejected_before_persist() {
    let bank = bank();
    let (customer, _) = bank.customer_with_codes("ann@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    for amount in [dec!(0), dec!(-5)] {
        let result = bank
            .engine
            .submit(&customer, withdrawal(account, amount, None))
            .await;
        assert!(matches!(result, Err(WorkflowError::Validation(_))));
    }

    let listed = bank.engine.transactions_for(&customer).await.unwrap();
    assert!(listed.is_empty(), "no transaction may be persisted");
}

#[tokio::test]
async fn test_foreign_source_account_rejected() {
    let bank = bank();
    let (owner, _) = bank.customer_with_codes("bea@example.com").await;
    let (intruder, codes) = bank.customer_with_codes("cal@example.com").await;
    let account = bank.open_account(&owner, dec!(1000)).await;

    let result = bank
        .engine
        .submit(&intruder, withdrawal(account, dec!(10), Some(&codes[0])))
        .await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));
}

#[tokio::test]
async fn test_domestic_transfer_without_backup_code_rejected() {
    let bank = bank();
    let (customer, _) = bank.customer_with_codes("dee@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let result = bank
        .engine
        .submit(&customer, domestic_transfer(account, dec!(200), None))
        .await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));

    // Rejected before a transaction exists.
    let listed = bank.engine.transactions_for(&customer).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_wrong_backup_code_rejected() {
    let bank = bank();
    let (customer, _) = bank.customer_with_codes("eva@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let result = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(50), Some("AAAAA-AAAAA")))
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::Verification(AuthError::VerificationFailed))
    ));
}

#[tokio::test]
async fn test_backup_code_consumed_by_submission() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("finn@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    bank.engine
        .submit(&customer, withdrawal(account, dec!(50), Some(&codes[0])))
        .await
        .unwrap();

    // The code is single-use across the whole system.
    let replay = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(50), Some(&codes[0])))
        .await;
    assert!(matches!(
        replay,
        Err(WorkflowError::Verification(AuthError::CodeAlreadyUsed))
    ));
}

// ============================================================================
// Internal transfer scenario (step-up exempt)
// ============================================================================

#[tokio::test]
async fn test_internal_transfer_between_own_accounts() {
    let bank = bank();
    let (customer, _) = bank.customer_with_codes("gus@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let a = bank.open_account(&customer, dec!(1000)).await;
    let b = bank.open_account(&customer, dec!(0)).await;

    // No backup code needed between the caller's own accounts.
    let transaction = bank
        .engine
        .submit(&customer, internal_transfer(a, b, dec!(500)))
        .await
        .unwrap();

    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert!(transaction.reference.starts_with("TXN-"));

    // Balances untouched until the admin decides.
    assert_eq!(bank.balance(a).await, dec!(1000));
    assert_eq!(bank.balance(b).await, dec!(0));

    bank.gate
        .approve(&admin, transaction.id, None)
        .await
        .unwrap();

    assert_eq!(bank.balance(a).await, dec!(500));
    assert_eq!(bank.balance(b).await, dec!(500));
}

#[tokio::test]
async fn test_internal_transfer_to_another_customer_requires_code() {
    let bank = bank();
    let (sender, codes) = bank.customer_with_codes("hal@example.com").await;
    let (receiver, _) = bank.customer_with_codes("ivy@example.com").await;
    let from = bank.open_account(&sender, dec!(300)).await;
    let to = bank.open_account(&receiver, dec!(0)).await;

    // Different owner on the destination leg: the exemption does not apply.
    let missing = bank
        .engine
        .submit(&sender, internal_transfer(from, to, dec!(100)))
        .await;
    assert!(matches!(missing, Err(WorkflowError::Validation(_))));

    let mut request = internal_transfer(from, to, dec!(100));
    request.backup_code = Some(codes[0].clone());
    let transaction = bank.engine.submit(&sender, request).await.unwrap();
    assert_eq!(transaction.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn test_internal_transfer_to_same_account_rejected() {
    let bank = bank();
    let (customer, _) = bank.customer_with_codes("jon@example.com").await;
    let account = bank.open_account(&customer, dec!(100)).await;

    let result = bank
        .engine
        .submit(&customer, internal_transfer(account, account, dec!(10)))
        .await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));
}

// ============================================================================
// Approval, decline, reversal
// ============================================================================

#[tokio::test]
async fn test_deposit_credits_on_approval() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("kim@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(10)).await;

    let transaction = bank
        .engine
        .submit(
            &customer,
            SubmitTransaction {
                source_account: account,
                kind: TransactionKind::Deposit,
                amount: usd(dec!(90)),
                description: Some("payroll".to_string()),
                backup_code: Some(codes[0].clone()),
            },
        )
        .await
        .unwrap();

    bank.gate
        .approve(&admin, transaction.id, Some("verified payroll".to_string()))
        .await
        .unwrap();
    assert_eq!(bank.balance(account).await, dec!(100));

    let stored = bank.engine.get(transaction.id).await.unwrap();
    assert_eq!(stored.admin_notes.as_deref(), Some("verified payroll"));
}

#[tokio::test]
async fn test_oversized_withdrawal_queues_then_fails_at_settlement() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("lou@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(50)).await;

    // Pre-check warns but still queues for review.
    let transaction = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(10000), Some(&codes[0])))
        .await
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Pending);

    // Settlement is authoritative: approval fails, status stays PENDING.
    let result = bank.gate.approve(&admin, transaction.id, None).await;
    assert!(matches!(
        result,
        Err(WorkflowError::Ledger(LedgerError::InsufficientFunds { .. }))
    ));

    let stored = bank.engine.get(transaction.id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
    assert!(stored.approved_by.is_none());
    assert_eq!(bank.balance(account).await, dec!(50));
}

#[tokio::test]
async fn test_decline_stores_reason_and_blocks_approval() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("max@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(500)).await;

    let transaction = bank
        .engine
        .submit(&customer, domestic_transfer(account, dec!(200), Some(&codes[0])))
        .await
        .unwrap();

    let declined = bank
        .gate
        .decline(&admin, transaction.id, "unverified recipient".to_string())
        .await
        .unwrap();
    assert_eq!(declined.status, TransactionStatus::Declined);
    assert_eq!(declined.decline_reason.as_deref(), Some("unverified recipient"));
    assert_eq!(bank.balance(account).await, dec!(500));

    // Terminal: a later approval attempt is an invalid transition.
    let result = bank.gate.approve(&admin, transaction.id, None).await;
    assert!(matches!(
        result,
        Err(WorkflowError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_decline_requires_reason() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("nan@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(500)).await;

    let transaction = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(100), Some(&codes[0])))
        .await
        .unwrap();

    let result = bank
        .gate
        .decline(&admin, transaction.id, "  ".to_string())
        .await;
    assert!(matches!(result, Err(WorkflowError::DeclineReasonRequired)));
}

#[tokio::test]
async fn test_approve_reverse_round_trip_restores_balances() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("oli@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let a = bank.open_account(&customer, dec!(1000)).await;
    let b = bank.open_account(&customer, dec!(250)).await;

    let mut request = internal_transfer(a, b, dec!(400));
    request.backup_code = Some(codes[0].clone());
    let transaction = bank.engine.submit(&customer, request).await.unwrap();

    bank.gate.approve(&admin, transaction.id, None).await.unwrap();
    assert_eq!(bank.balance(a).await, dec!(600));
    assert_eq!(bank.balance(b).await, dec!(650));

    let reversed = bank
        .gate
        .reverse(&admin, transaction.id, "posted in error".to_string())
        .await
        .unwrap();
    assert_eq!(reversed.status, TransactionStatus::Reversed);
    assert_eq!(reversed.reversal_reason.as_deref(), Some("posted in error"));

    // Exactly the pre-approval balances.
    assert_eq!(bank.balance(a).await, dec!(1000));
    assert_eq!(bank.balance(b).await, dec!(250));

    // Reversal is one-time.
    let again = bank
        .gate
        .reverse(&admin, transaction.id, "again".to_string())
        .await;
    assert!(matches!(again, Err(WorkflowError::AlreadyProcessed(_))));
}

#[tokio::test]
async fn test_sequential_double_approve() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("pam@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let transaction = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(100), Some(&codes[0])))
        .await
        .unwrap();

    bank.gate.approve(&admin, transaction.id, None).await.unwrap();
    let second = bank.gate.approve(&admin, transaction.id, None).await;
    assert!(matches!(second, Err(WorkflowError::AlreadyProcessed(_))));

    // The debit landed exactly once.
    assert_eq!(bank.balance(account).await, dec!(900));
}

#[tokio::test]
async fn test_reverse_pending_is_invalid() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("rae@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let transaction = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(100), Some(&codes[0])))
        .await
        .unwrap();

    let result = bank
        .gate
        .reverse(&admin, transaction.id, "too early".to_string())
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_customer_cannot_decide() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("sue@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let transaction = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(100), Some(&codes[0])))
        .await
        .unwrap();

    let result = bank.gate.approve(&customer, transaction.id, None).await;
    assert!(matches!(result, Err(WorkflowError::NotAuthorized { .. })));

    let stored = bank.engine.get(transaction.id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn test_transactions_are_never_deleted() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("ted@example.com").await;
    let admin = bank.admin("admin@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let first = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(10), Some(&codes[0])))
        .await
        .unwrap();
    let second = bank
        .engine
        .submit(&customer, withdrawal(account, dec!(20), Some(&codes[1])))
        .await
        .unwrap();

    bank.gate.approve(&admin, first.id, None).await.unwrap();
    bank.gate
        .decline(&admin, second.id, "duplicate".to_string())
        .await
        .unwrap();

    // The audit trail keeps both, terminally stamped.
    let listed = bank.engine.transactions_for(&customer).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|t| t.status == TransactionStatus::Approved));
    assert!(listed.iter().any(|t| t.status == TransactionStatus::Declined));
}

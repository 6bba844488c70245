//! Concurrency tests: racing decisions on one transaction and racing
//! consumption of one backup code must each settle to exactly one winner.

mod common;

use rust_decimal_macros::dec;

use common::bank;
use meridian_core::auth::AuthError;
use meridian_core::workflow::WorkflowError;
use meridian_core::workflow::types::{SubmitTransaction, TransactionKind, TransactionStatus};
use meridian_shared::types::{Currency, Money};

// ============================================================================
// Test: concurrent double approval
// ============================================================================
#[tokio::test]
async fn test_concurrent_double_approve_applies_once() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("race@example.com").await;
    let admin_one = bank.admin("admin1@example.com").await;
    let admin_two = bank.admin("admin2@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let transaction = bank
        .engine
        .submit(
            &customer,
            SubmitTransaction {
                source_account: account,
                kind: TransactionKind::Withdrawal,
                amount: Money::new(dec!(100), Currency::Usd),
                description: None,
                backup_code: Some(codes[0].clone()),
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        bank.gate.approve(&admin_one, transaction.id, None),
        bank.gate.approve(&admin_two, transaction.id, None),
    );

    // Exactly one decision wins; the loser sees AlreadyProcessed.
    let outcomes = [first, second];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let losses = outcomes
        .iter()
        .filter(|r| matches!(r, Err(WorkflowError::AlreadyProcessed(_))))
        .count();
    assert_eq!(wins, 1, "exactly one approval must win");
    assert_eq!(losses, 1, "the loser must observe AlreadyProcessed");

    // And the ledger moved exactly once.
    assert_eq!(bank.balance(account).await, dec!(900));
    let stored = bank.engine.get(transaction.id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Approved);
}

// ============================================================================
// Test: concurrent approve vs decline
// ============================================================================
#[tokio::test]
async fn test_concurrent_approve_and_decline_one_winner() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("split@example.com").await;
    let admin_one = bank.admin("admin1@example.com").await;
    let admin_two = bank.admin("admin2@example.com").await;
    let account = bank.open_account(&customer, dec!(500)).await;

    let transaction = bank
        .engine
        .submit(
            &customer,
            SubmitTransaction {
                source_account: account,
                kind: TransactionKind::Withdrawal,
                amount: Money::new(dec!(200), Currency::Usd),
                description: None,
                backup_code: Some(codes[0].clone()),
            },
        )
        .await
        .unwrap();

    let (approved, declined) = tokio::join!(
        bank.gate.approve(&admin_one, transaction.id, None),
        bank.gate
            .decline(&admin_two, transaction.id, "suspicious".to_string()),
    );

    assert_eq!(
        usize::from(approved.is_ok()) + usize::from(declined.is_ok()),
        1,
        "exactly one decision must win"
    );

    // Ledger state must agree with whichever decision won.
    let stored = bank.engine.get(transaction.id).await.unwrap();
    match stored.status {
        TransactionStatus::Approved => {
            assert!(approved.is_ok());
            assert_eq!(bank.balance(account).await, dec!(300));
        }
        TransactionStatus::Declined => {
            assert!(declined.is_ok());
            assert_eq!(bank.balance(account).await, dec!(500));
        }
        other => panic!("unexpected terminal status {other}"),
    }
}

// ============================================================================
// Test: concurrent reversal
// ============================================================================
#[tokio::test]
async fn test_concurrent_double_reverse_applies_once() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("undo@example.com").await;
    let admin_one = bank.admin("admin1@example.com").await;
    let admin_two = bank.admin("admin2@example.com").await;
    let account = bank.open_account(&customer, dec!(1000)).await;

    let transaction = bank
        .engine
        .submit(
            &customer,
            SubmitTransaction {
                source_account: account,
                kind: TransactionKind::Withdrawal,
                amount: Money::new(dec!(100), Currency::Usd),
                description: None,
                backup_code: Some(codes[0].clone()),
            },
        )
        .await
        .unwrap();
    bank.gate.approve(&admin_one, transaction.id, None).await.unwrap();
    assert_eq!(bank.balance(account).await, dec!(900));

    let (first, second) = tokio::join!(
        bank.gate
            .reverse(&admin_one, transaction.id, "error".to_string()),
        bank.gate
            .reverse(&admin_two, transaction.id, "error".to_string()),
    );

    let wins = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(wins, 1, "exactly one reversal must win");

    // The inverse mutation landed exactly once.
    assert_eq!(bank.balance(account).await, dec!(1000));
}

// ============================================================================
// Test: concurrent backup code consumption
// ============================================================================
#[tokio::test]
async fn test_concurrent_backup_code_use_single_winner() {
    let bank = bank();
    let (customer, codes) = bank.customer_with_codes("code@example.com").await;

    let (first, second) = tokio::join!(
        bank.stepup.verify_transaction_code(customer.id, &codes[0]),
        bank.stepup.verify_transaction_code(customer.id, &codes[0]),
    );

    let wins = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(wins, 1, "a backup code validates at most once");

    for result in [first, second] {
        if let Err(err) = result {
            assert!(matches!(err, AuthError::CodeAlreadyUsed));
        }
    }
}

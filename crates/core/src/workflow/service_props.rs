//! Property-based tests for WorkflowService.
//!
//! Validates the state-machine invariants with randomized inputs: every
//! accepted transition is one the validity matrix allows, every other
//! attempt is rejected, and terminal states accept nothing.

use proptest::prelude::*;

use meridian_shared::types::{TransactionId, UserId};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::TransactionStatus;

/// Strategy for generating random TransactionStatus values.
fn arb_status() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::Pending),
        Just(TransactionStatus::Approved),
        Just(TransactionStatus::Declined),
        Just(TransactionStatus::Reversed),
    ]
}

/// Strategy for generating random user IDs.
fn arb_user_id() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating non-empty reason strings.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ]{0,60}".prop_map(|s| s.trim().to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// approve succeeds iff the transition matrix allows Pending → Approved.
    #[test]
    fn prop_approve_agrees_with_matrix(status in arb_status(), admin in arb_user_id()) {
        let result = WorkflowService::approve(TransactionId::new(), status, admin, None);
        let allowed =
            WorkflowService::is_valid_transition(status, TransactionStatus::Approved);
        prop_assert_eq!(result.is_ok(), allowed);
    }

    /// decline succeeds iff the transition matrix allows Pending → Declined.
    #[test]
    fn prop_decline_agrees_with_matrix(
        status in arb_status(),
        admin in arb_user_id(),
        reason in arb_reason(),
    ) {
        let result = WorkflowService::decline(TransactionId::new(), status, admin, reason);
        let allowed =
            WorkflowService::is_valid_transition(status, TransactionStatus::Declined);
        prop_assert_eq!(result.is_ok(), allowed);
    }

    /// reverse succeeds iff the transition matrix allows Approved → Reversed.
    #[test]
    fn prop_reverse_agrees_with_matrix(
        status in arb_status(),
        admin in arb_user_id(),
        reason in arb_reason(),
    ) {
        let result = WorkflowService::reverse(TransactionId::new(), status, admin, reason);
        let allowed =
            WorkflowService::is_valid_transition(status, TransactionStatus::Reversed);
        prop_assert_eq!(result.is_ok(), allowed);
    }

    /// Terminal states admit no outgoing transition at all.
    #[test]
    fn prop_terminal_states_are_dead_ends(to in arb_status()) {
        for terminal in [TransactionStatus::Declined, TransactionStatus::Reversed] {
            prop_assert!(!WorkflowService::is_valid_transition(terminal, to));
        }
    }

    /// Empty or whitespace-only reasons are rejected before any state check.
    #[test]
    fn prop_blank_reason_always_rejected(
        status in arb_status(),
        admin in arb_user_id(),
        blanks in " {0,8}",
    ) {
        let decline = WorkflowService::decline(
            TransactionId::new(),
            status,
            admin,
            blanks.clone(),
        );
        prop_assert!(matches!(decline, Err(WorkflowError::DeclineReasonRequired)));

        let reverse = WorkflowService::reverse(TransactionId::new(), status, admin, blanks);
        prop_assert!(matches!(reverse, Err(WorkflowError::ReversalReasonRequired)));
    }

    /// A successful action's resulting status is exactly the matrix target.
    #[test]
    fn prop_action_status_matches_target(admin in arb_user_id(), reason in arb_reason()) {
        let approve = WorkflowService::approve(
            TransactionId::new(),
            TransactionStatus::Pending,
            admin,
            None,
        ).unwrap();
        prop_assert_eq!(approve.new_status(), TransactionStatus::Approved);

        let decline = WorkflowService::decline(
            TransactionId::new(),
            TransactionStatus::Pending,
            admin,
            reason.clone(),
        ).unwrap();
        prop_assert_eq!(decline.new_status(), TransactionStatus::Declined);

        let reverse = WorkflowService::reverse(
            TransactionId::new(),
            TransactionStatus::Approved,
            admin,
            reason,
        ).unwrap();
        prop_assert_eq!(reverse.new_status(), TransactionStatus::Reversed);
    }
}

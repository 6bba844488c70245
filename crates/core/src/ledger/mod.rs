//! Account balances and settlement.
//!
//! This module implements the single source of truth for money:
//! - Account domain types and balance invariants
//! - Idempotent, atomic entry and entry-pair application
//! - Error types for settlement failures
//!
//! Every balance mutation in the system goes through [`LedgerService`];
//! nothing else writes balances.

pub mod error;
pub mod service;
pub mod types;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{Account, AccountKind, BalanceWrite, CommitOutcome, EntryKey};

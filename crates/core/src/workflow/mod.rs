//! Transaction workflow management for Meridian.
//!
//! This module implements the transaction lifecycle state machine, the
//! submission engine with its step-up gate, and the administrative
//! approval gate.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (Transaction, TransactionStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `engine` - Submission validation, step-up gating, settlement
//! - `approval` - The admin decision point

pub mod approval;
pub mod engine;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use approval::ApprovalGate;
pub use engine::TransactionEngine;
pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{
    SubmitTransaction, Transaction, TransactionKind, TransactionStatus, WorkflowAction,
};

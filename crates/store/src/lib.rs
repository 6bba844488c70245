//! In-memory storage adapter for Meridian.
//!
//! Implements every core storage port over concurrent maps. This is the
//! collaborator seam the core is written against: tests and the demo binary
//! wire these in where a deployment would wire a database layer.
//!
//! Concurrency contract: compare-and-swap updates (transaction status,
//! backup-code consumption) and the multi-account balance commit are atomic
//! here exactly as the ports require, so the race-safety tests exercised
//! against this adapter hold for any conforming implementation.

pub mod memory;

pub use memory::account::MemoryAccountStore;
pub use memory::pending::MemoryPendingStore;
pub use memory::session::MemorySessionStore;
pub use memory::transaction::MemoryTransactionStore;
pub use memory::user::MemoryUserStore;

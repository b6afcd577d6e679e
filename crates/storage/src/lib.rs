//! In-memory storage for the capture engine.
//!
//! Provides the [`BlockIndex`] and [`TransactionIndex`] written by the capture
//! tasks and read by the query service, and the [`PendingPool`] of pending
//! transaction hashes. All containers are safe for unbounded concurrent
//! readers and writers without external synchronization.

mod block;
pub use block::BlockIndex;

mod transaction;
pub use transaction::TransactionIndex;

mod pending;
pub use pending::{DEFAULT_PENDING_CAPACITY, PendingPool};

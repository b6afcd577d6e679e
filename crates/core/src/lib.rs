//! The capture-and-reconciliation engine.
//!
//! Ingests blocks from a chain node and keeps a gap-free in-memory index of the
//! captured blocks and of the transactions addressed to the watched addresses.
//!
//! - [`Capturer`] fetches one block and writes it into the indexes.
//! - [`HistoryBackfill`] anchors the current head, then walks backwards to the
//!   history cutoff in the background.
//! - [`HeadFollower`] follows the new-head stream and heals forward gaps with a
//!   single-flight backfill task.
//! - [`RepairSweep`] periodically recaptures every hole left in the index.
//! - [`PendingWatcher`] records pending transaction hashes.
//! - [`CaptureService`] wires all of the above under one cancellation token.

mod node;
pub use node::{HeadStream, NodeClient, NodeError, PendingStream};

mod error;
pub use error::{CaptureError, SessionError};

mod config;
pub use config::{CaptureConfig, DEFAULT_HISTORY_CUTOFF, FollowerConfig};

mod metrics;
pub use metrics::Metrics;

mod capture;
pub use capture::Capturer;

mod backfill;
pub use backfill::{BackfillHandle, HistoryBackfill, WalkOutcome};

mod follower;
pub use follower::{GatePermit, HeadFollower, RecaptureGate};

mod repair;
pub use repair::{RepairSweep, SweepReport};

mod pending;
pub use pending::PendingWatcher;

mod service;
pub use service::CaptureService;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Errors raised by the capture tasks.

use crate::NodeError;
use thiserror::Error;

/// An error raised while capturing blocks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The current head could not be queried at startup.
    #[error("failed to query the current head: {0}")]
    HeadQuery(#[source] NodeError),
    /// A block could not be fetched.
    #[error("failed to fetch block {number}: {source}")]
    Fetch {
        /// The requested block number.
        number: u64,
        /// The underlying node error.
        #[source]
        source: NodeError,
    },
    /// The node answered with a different block than the one requested.
    #[error("requested block {requested}, node returned block {received}")]
    UnexpectedBlock {
        /// The requested block number.
        requested: u64,
        /// The number of the block the node returned.
        received: u64,
    },
    /// A subscription could not be established.
    #[error("failed to subscribe: {0}")]
    Subscribe(#[source] NodeError),
    /// The head stream errored or ended.
    #[error(
        "head stream terminated{}",
        .0.as_ref().map(|err| format!(": {err}")).unwrap_or_default()
    )]
    StreamTerminated(Option<NodeError>),
    /// The head follower gave up after exhausting its retries.
    #[error("head subscription failed after {attempts} attempts: {source}")]
    SubscriptionExhausted {
        /// The number of sessions attempted.
        attempts: u32,
        /// The error that ended the final session.
        #[source]
        source: Box<CaptureError>,
    },
}

/// The error ending a head-following session.
///
/// Carries the cursor reached before the session failed so the next session
/// can resume from it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("head session failed at block {cursor}: {source}")]
pub struct SessionError {
    /// The highest contiguous block number reached by the session.
    pub cursor: u64,
    /// The cause of the failure.
    #[source]
    pub source: CaptureError,
}

impl SessionError {
    /// Creates a new [`SessionError`].
    pub const fn new(cursor: u64, source: CaptureError) -> Self {
        Self { cursor, source }
    }
}

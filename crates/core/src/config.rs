use std::time::Duration;

/// The default history cutoff: 2023-12-10T00:00:00Z, in unix seconds.
pub const DEFAULT_HISTORY_CUTOFF: u64 = 1_702_166_400;

/// Settings for the whole capture engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Blocks with a timestamp strictly below this (unix seconds) are not backfilled.
    pub history_cutoff: u64,
    /// Delay before the history backfill retries a failed fetch.
    pub backfill_retry_delay: Duration,
    /// Period of the repair sweep.
    pub repair_interval: Duration,
    /// Head subscription retry settings.
    pub follower: FollowerConfig,
    /// Whether to record pending transaction hashes.
    pub pending_transactions: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            history_cutoff: DEFAULT_HISTORY_CUTOFF,
            backfill_retry_delay: Duration::from_secs(1),
            repair_interval: Duration::from_secs(1),
            follower: FollowerConfig::default(),
            pending_transactions: false,
        }
    }
}

/// Retry settings of the [`HeadFollower`](crate::HeadFollower).
///
/// The k-th consecutive retry waits `k * backoff_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowerConfig {
    /// Number of retries before the follower gives up.
    pub max_retries: u32,
    /// Backoff increment between retries.
    pub backoff_step: Duration,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self { max_retries: 3, backoff_step: Duration::from_secs(10) }
    }
}

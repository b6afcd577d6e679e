//! Anchoring the current head and walking history backwards to the cutoff.

use crate::{CaptureError, Capturer, Metrics, NodeClient};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a backward walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Reached a block older than the history cutoff. That block is not indexed.
    ReachedCutoff {
        /// The first block found below the cutoff.
        stopped_at: u64,
    },
    /// Indexed every block down to genesis.
    ReachedGenesis,
    /// Stopped by cancellation.
    Cancelled,
}

/// The anchored head and the background walk spawned by [`HistoryBackfill::start`].
#[derive(Debug)]
pub struct BackfillHandle {
    /// The head captured at startup.
    pub head: u64,
    /// The backward walk from `head - 1`.
    pub walk: JoinHandle<WalkOutcome>,
}

/// Backfills history from the current head down to the history cutoff.
#[derive(Debug)]
pub struct HistoryBackfill<N> {
    capturer: Capturer<N>,
    cutoff: u64,
    retry_delay: Duration,
    cancellation: CancellationToken,
}

impl<N> HistoryBackfill<N>
where
    N: NodeClient + 'static,
{
    /// Creates a new [`HistoryBackfill`].
    ///
    /// `cutoff` is a unix timestamp in seconds.
    pub const fn new(
        capturer: Capturer<N>,
        cutoff: u64,
        retry_delay: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self { capturer, cutoff, retry_delay, cancellation }
    }

    /// Captures the current head, then spawns the backward walk.
    ///
    /// Failing to query or capture the head is fatal. Once this returns, the head
    /// block is in the index and the walk runs until it reaches the cutoff,
    /// genesis, or cancellation.
    pub async fn start(self) -> Result<BackfillHandle, CaptureError> {
        let head = self.capturer.node().current_head().await.map_err(CaptureError::HeadQuery)?;
        info!(
            target: "swapwatch::backfill",
            head = head.number,
            cutoff = self.cutoff,
            "Anchoring history at head"
        );

        let result = self.capturer.capture(head.number).await;
        Metrics::record_capture(Metrics::SOURCE_BACKFILL, &result);
        result?;

        let number = head.number;
        let walk = tokio::spawn(self.walk(number));
        Ok(BackfillHandle { head: number, walk })
    }

    /// Walks from `head - 1` down until a block is older than the cutoff.
    ///
    /// A failed fetch is retried for the same number after the retry delay, so
    /// the walk never leaves a hole behind it.
    async fn walk(self, head: u64) -> WalkOutcome {
        let mut number = head;
        loop {
            if number == 0 {
                info!(target: "swapwatch::backfill", "History backfill reached genesis");
                return WalkOutcome::ReachedGenesis;
            }
            number -= 1;

            let block = loop {
                let result = tokio::select! {
                    _ = self.cancellation.cancelled() => {
                        info!(target: "swapwatch::backfill", number, "History backfill cancelled");
                        return WalkOutcome::Cancelled;
                    }
                    result = self.capturer.fetch(number) => result,
                };

                match result {
                    Ok(block) => break block,
                    Err(err) => {
                        Metrics::record_capture_error(Metrics::SOURCE_BACKFILL);
                        warn!(
                            target: "swapwatch::backfill",
                            number,
                            %err,
                            delay = ?self.retry_delay,
                            "Failed to fetch block, retrying"
                        );
                        tokio::select! {
                            _ = self.cancellation.cancelled() => return WalkOutcome::Cancelled,
                            _ = tokio::time::sleep(self.retry_delay) => {}
                        }
                    }
                }
            };

            if block.timestamp < self.cutoff {
                info!(
                    target: "swapwatch::backfill",
                    number,
                    timestamp = block.timestamp,
                    cutoff = self.cutoff,
                    "History backfill reached the cutoff"
                );
                return WalkOutcome::ReachedCutoff { stopped_at: number };
            }

            if self.cancellation.is_cancelled() {
                return WalkOutcome::Cancelled;
            }
            self.capturer.index(block);
            Metrics::record_captured(Metrics::SOURCE_BACKFILL);
            debug!(target: "swapwatch::backfill", number, "Backfilled block");
        }
    }
}

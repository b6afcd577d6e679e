//! Periodic recapture of holes in the block index.

use crate::{Capturer, Metrics, NodeClient};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The result of a single [`RepairSweep::sweep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Holes found at the start of the sweep.
    pub gaps: usize,
    /// Holes recaptured.
    pub repaired: usize,
    /// Holes whose capture failed.
    pub failed: usize,
}

/// Periodically recaptures every number missing between the lowest and the
/// highest captured block.
///
/// Sweeps never overlap: a tick that fires while a sweep is running is skipped.
#[derive(Debug)]
pub struct RepairSweep<N> {
    capturer: Capturer<N>,
    interval: Duration,
    cancellation: CancellationToken,
}

impl<N> RepairSweep<N>
where
    N: NodeClient,
{
    /// Creates a new [`RepairSweep`].
    pub const fn new(
        capturer: Capturer<N>,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self { capturer, interval, cancellation }
    }

    /// Sweeps once per interval until cancelled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    info!(target: "swapwatch::repair", "Repair sweep stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    if report.gaps > 0 {
                        info!(
                            target: "swapwatch::repair",
                            gaps = report.gaps,
                            repaired = report.repaired,
                            failed = report.failed,
                            "Repair sweep finished"
                        );
                    }
                }
            }
        }
    }

    /// Recaptures every current hole once, in ascending order.
    ///
    /// Failures are logged and left for the next sweep.
    pub async fn sweep(&self) -> SweepReport {
        let gaps = self.capturer.blocks().find_gaps();
        let mut report = SweepReport { gaps: gaps.len(), ..Default::default() };

        for number in gaps {
            let result = tokio::select! {
                _ = self.cancellation.cancelled() => break,
                result = self.capturer.capture(number) => result,
            };
            Metrics::record_capture(Metrics::SOURCE_REPAIR, &result);
            match result {
                Ok(_) => {
                    report.repaired += 1;
                    metrics::counter!(Metrics::REPAIR_BLOCKS_TOTAL).increment(1);
                    debug!(target: "swapwatch::repair", number, "Repaired block");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(target: "swapwatch::repair", number, %err, "Failed to repair block");
                }
            }
        }
        report
    }
}

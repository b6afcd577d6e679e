//! Following the new-head stream and healing forward gaps.

use crate::{CaptureError, Capturer, FollowerConfig, Metrics, NodeClient, SessionError};
use futures::StreamExt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use swapwatch_types::HeadInfo;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Single-flight gate for the follower's gap recapture task.
///
/// At most one [`GatePermit`] exists at any time. The gate reopens when the
/// permit is dropped, including when the holding task is aborted.
#[derive(Debug, Clone, Default)]
pub struct RecaptureGate {
    busy: Arc<AtomicBool>,
}

impl RecaptureGate {
    /// Creates an open [`RecaptureGate`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the permit, or returns `None` if a recapture is already running.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit { busy: Arc::clone(&self.busy) })
    }

    /// Returns true while a permit is held.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`RecaptureGate`].
#[derive(Debug)]
pub struct GatePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Follows the node's new-head stream.
///
/// Every announced head is captured. The follower keeps a cursor, the highest
/// number up to which it believes there are no gaps. When a head skips past
/// `cursor + 1`, the missing range is recaptured by a background task. Only one
/// such task runs at a time; a gap seen while it runs is left for a later head
/// to detect again, and the [`RepairSweep`](crate::RepairSweep) covers whatever
/// remains.
#[derive(Debug)]
pub struct HeadFollower<N> {
    capturer: Capturer<N>,
    config: FollowerConfig,
    cursor: Arc<AtomicU64>,
    gate: RecaptureGate,
    cancellation: CancellationToken,
}

impl<N> HeadFollower<N>
where
    N: NodeClient + 'static,
{
    /// Creates a new [`HeadFollower`].
    pub fn new(
        capturer: Capturer<N>,
        config: FollowerConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            capturer,
            config,
            cursor: Arc::new(AtomicU64::new(0)),
            gate: RecaptureGate::new(),
            cancellation,
        }
    }

    /// Returns the current cursor.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Returns the gap recapture gate.
    pub const fn gate(&self) -> &RecaptureGate {
        &self.gate
    }

    /// Runs head-following sessions until cancelled, retrying failed ones.
    ///
    /// The k-th consecutive retry waits `k * backoff_step`. A session that moved
    /// the cursor resets the count. After `max_retries` retries the next failure
    /// is fatal.
    pub async fn hold(&self, from: u64) -> Result<(), CaptureError> {
        let mut cursor = from;
        let mut retries = 0;

        loop {
            let err = match self.start(cursor).await {
                Ok(last) => {
                    info!(target: "swapwatch::follower", cursor = last, "Head follower stopped");
                    return Ok(());
                }
                Err(err) => err,
            };

            if err.cursor != cursor {
                retries = 0;
            }
            cursor = err.cursor;

            if retries >= self.config.max_retries {
                error!(
                    target: "swapwatch::follower",
                    cursor,
                    retries,
                    err = %err.source,
                    "Head subscription failed, giving up"
                );
                return Err(CaptureError::SubscriptionExhausted {
                    attempts: retries + 1,
                    source: Box::new(err.source),
                });
            }

            retries += 1;
            let backoff = self.config.backoff_step * retries;
            warn!(
                target: "swapwatch::follower",
                cursor,
                retry = retries,
                ?backoff,
                err = %err.source,
                "Head subscription failed, retrying"
            );
            metrics::counter!(Metrics::HEAD_SUBSCRIPTION_RETRIES_TOTAL).increment(1);

            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    info!(
                        target: "swapwatch::follower",
                        cursor,
                        "Head follower cancelled during backoff"
                    );
                    return Ok(());
                }
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }

    /// Runs a single head-following session starting at `from`.
    ///
    /// With `from == 0` the first announced head becomes the cursor. Returns the
    /// cursor on cancellation, or the cursor and the cause when the subscription
    /// cannot be established, errors, or ends.
    pub async fn start(&self, from: u64) -> Result<u64, SessionError> {
        self.advance_cursor(from);

        let mut heads = self
            .capturer
            .node()
            .subscribe_new_heads()
            .await
            .map_err(|err| SessionError::new(self.cursor(), CaptureError::Subscribe(err)))?;
        info!(target: "swapwatch::follower", from, "Subscribed to new heads");

        let mut adopt_first = from == 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    return Ok(self.cursor());
                }
                next = heads.next() => match next {
                    Some(Ok(head)) => {
                        if adopt_first {
                            adopt_first = false;
                            self.advance_cursor(head.number);
                        }
                        self.on_head(head).await;
                    }
                    Some(Err(err)) => {
                        return Err(SessionError::new(
                            self.cursor(),
                            CaptureError::StreamTerminated(Some(err)),
                        ));
                    }
                    None => {
                        return Err(SessionError::new(
                            self.cursor(),
                            CaptureError::StreamTerminated(None),
                        ));
                    }
                }
            }
        }
    }

    async fn on_head(&self, head: HeadInfo) {
        let number = head.number;
        debug!(target: "swapwatch::follower", number, hash = %head.hash, "Received new head");

        let result = tokio::select! {
            _ = self.cancellation.cancelled() => return,
            result = self.capturer.capture(number) => result,
        };
        Metrics::record_capture(Metrics::SOURCE_FOLLOWER, &result);
        if let Err(err) = result {
            warn!(target: "swapwatch::follower", number, %err, "Failed to capture head");
            return;
        }

        let cursor = self.cursor();
        if cursor.saturating_add(1) >= number {
            self.advance_cursor(number);
            return;
        }

        metrics::counter!(Metrics::GAPS_DETECTED_TOTAL).increment(1);
        let Some(permit) = self.gate.try_acquire() else {
            metrics::counter!(Metrics::GAPS_DEFERRED_TOTAL).increment(1);
            debug!(
                target: "swapwatch::follower",
                cursor,
                number,
                "Gap detected while a recapture is running, deferring"
            );
            return;
        };

        info!(target: "swapwatch::follower", from = cursor + 1, to = number - 1, "Recapturing gap");
        tokio::spawn(recapture(
            self.capturer.clone(),
            cursor,
            number,
            Arc::clone(&self.cursor),
            self.cancellation.clone(),
            permit,
        ));
    }

    fn advance_cursor(&self, number: u64) {
        advance(&self.cursor, number);
    }
}

fn advance(cursor: &AtomicU64, number: u64) {
    let previous = cursor.fetch_max(number, Ordering::AcqRel);
    Metrics::record_cursor(previous.max(number));
}

/// Captures `cursor + 1 .. boundary` in order, then advances the cursor to
/// `boundary` if every capture succeeded. The boundary itself was captured by
/// the caller.
async fn recapture<N: NodeClient>(
    capturer: Capturer<N>,
    cursor: u64,
    boundary: u64,
    shared_cursor: Arc<AtomicU64>,
    cancellation: CancellationToken,
    _permit: GatePermit,
) {
    let mut healed = true;
    for number in (cursor + 1)..boundary {
        let result = tokio::select! {
            _ = cancellation.cancelled() => return,
            result = capturer.capture(number) => result,
        };
        Metrics::record_capture(Metrics::SOURCE_GAP, &result);
        if let Err(err) = result {
            warn!(target: "swapwatch::follower", number, %err, "Failed to recapture gap block");
            healed = false;
        }
    }

    if healed {
        advance(&shared_cursor, boundary);
        debug!(target: "swapwatch::follower", cursor = boundary, "Gap healed");
    } else {
        warn!(
            target: "swapwatch::follower",
            from = cursor + 1,
            to = boundary - 1,
            "Gap not fully recaptured, leaving it to the repair sweep"
        );
    }
}

//! Recording pending transaction hashes.

use crate::{CaptureError, NodeClient};
use futures::StreamExt;
use std::sync::Arc;
use swapwatch_storage::PendingPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

/// Subscribes to the node's pending transactions and records their hashes in a
/// [`PendingPool`].
///
/// The subscription is not retried: when it ends, pending hashes stop being
/// recorded and the rest of the engine carries on.
#[derive(Debug)]
pub struct PendingWatcher<N> {
    node: Arc<N>,
    pool: Arc<PendingPool>,
    cancellation: CancellationToken,
}

impl<N> PendingWatcher<N>
where
    N: NodeClient,
{
    /// Creates a new [`PendingWatcher`].
    pub const fn new(
        node: Arc<N>,
        pool: Arc<PendingPool>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { node, pool, cancellation }
    }

    /// Records pending hashes until cancelled or until the subscription ends.
    pub async fn run(self) -> Result<(), CaptureError> {
        let mut pending =
            self.node.subscribe_pending_transactions().await.map_err(CaptureError::Subscribe)?;
        info!(target: "swapwatch::pending", "Subscribed to pending transactions");

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => return Ok(()),
                next = pending.next() => match next {
                    Some(Ok(hash)) => {
                        if self.pool.insert(hash) {
                            trace!(target: "swapwatch::pending", %hash, "Recorded pending hash");
                        }
                    }
                    Some(Err(err)) => {
                        warn!(target: "swapwatch::pending", %err, "Pending stream failed");
                        return Err(CaptureError::StreamTerminated(Some(err)));
                    }
                    None => {
                        warn!(target: "swapwatch::pending", "Pending stream ended");
                        return Err(CaptureError::StreamTerminated(None));
                    }
                }
            }
        }
    }
}

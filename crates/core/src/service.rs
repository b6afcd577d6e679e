//! Wiring of the capture tasks.

use crate::{
    CaptureConfig, CaptureError, Capturer, HeadFollower, HistoryBackfill, Metrics, NodeClient,
    PendingWatcher, RepairSweep,
};
use std::sync::Arc;
use swapwatch_storage::{BlockIndex, PendingPool, TransactionIndex};
use swapwatch_types::AddressFilter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs the capture engine.
///
/// Startup order: the history backfill anchors the head, then the backward
/// walk, the repair sweep and the optional pending watcher run in the
/// background while the head follower holds the foreground. When the follower
/// returns, every other task is cancelled and awaited.
#[derive(Debug)]
pub struct CaptureService<N> {
    node: Arc<N>,
    filter: Arc<AddressFilter>,
    blocks: Arc<BlockIndex>,
    transactions: Arc<TransactionIndex>,
    pending: Arc<PendingPool>,
    config: CaptureConfig,
    cancellation: CancellationToken,
}

impl<N> CaptureService<N>
where
    N: NodeClient + 'static,
{
    /// Creates a new [`CaptureService`] with empty indexes.
    pub fn new(
        node: Arc<N>,
        filter: Arc<AddressFilter>,
        config: CaptureConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            node,
            filter,
            blocks: Arc::new(BlockIndex::new()),
            transactions: Arc::new(TransactionIndex::new()),
            pending: Arc::new(PendingPool::default()),
            config,
            cancellation,
        }
    }

    /// Returns the block index written by the service.
    pub const fn blocks(&self) -> &Arc<BlockIndex> {
        &self.blocks
    }

    /// Returns the transaction index written by the service.
    pub const fn transactions(&self) -> &Arc<TransactionIndex> {
        &self.transactions
    }

    /// Returns the pool of pending transaction hashes.
    pub const fn pending(&self) -> &Arc<PendingPool> {
        &self.pending
    }

    /// Runs until cancelled or until a fatal error.
    ///
    /// Returns `Ok` on cancellation. Failing to anchor the head, or exhausting
    /// the head subscription retries, is fatal. Either way the cancellation
    /// token is cancelled before returning.
    pub async fn run(self) -> Result<(), CaptureError> {
        Metrics::init();

        let capturer = Capturer::new(
            Arc::clone(&self.node),
            Arc::clone(&self.filter),
            Arc::clone(&self.blocks),
            Arc::clone(&self.transactions),
        );
        info!(
            target: "swapwatch::service",
            watched = self.filter.len(),
            cutoff = self.config.history_cutoff,
            "Starting capture service"
        );

        let backfill = HistoryBackfill::new(
            capturer.clone(),
            self.config.history_cutoff,
            self.config.backfill_retry_delay,
            self.cancellation.clone(),
        );
        let started = match backfill.start().await {
            Ok(started) => started,
            Err(err) => {
                error!(target: "swapwatch::service", %err, "Failed to anchor history");
                self.cancellation.cancel();
                return Err(err);
            }
        };

        let repair = tokio::spawn(
            RepairSweep::new(
                capturer.clone(),
                self.config.repair_interval,
                self.cancellation.clone(),
            )
            .run(),
        );

        let pending = self.config.pending_transactions.then(|| {
            let watcher = PendingWatcher::new(
                Arc::clone(&self.node),
                Arc::clone(&self.pending),
                self.cancellation.clone(),
            );
            tokio::spawn(async move {
                if let Err(err) = watcher.run().await {
                    warn!(target: "swapwatch::service", %err, "Pending watcher stopped");
                }
            })
        });

        let follower =
            HeadFollower::new(capturer, self.config.follower, self.cancellation.clone());
        let result = follower.hold(started.head).await;
        if let Err(err) = &result {
            error!(target: "swapwatch::service", %err, "Head follower failed");
        }

        self.cancellation.cancel();
        match started.walk.await {
            Ok(outcome) => {
                info!(target: "swapwatch::service", ?outcome, "History backfill finished")
            }
            Err(err) => warn!(target: "swapwatch::service", %err, "History backfill task failed"),
        }
        join("repair", repair).await;
        if let Some(pending) = pending {
            join("pending", pending).await;
        }
        info!(target: "swapwatch::service", "Capture service stopped");

        result
    }
}

async fn join(task: &'static str, handle: JoinHandle<()>) {
    if let Err(err) = handle.await {
        warn!(target: "swapwatch::service", task, %err, "Task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FollowerConfig, NodeError,
        test_utils::{FakeNode, block_with_recipients, head, transaction_hash, wait_until},
    };
    use alloy_primitives::{Address, address};
    use std::time::Duration;
    use swapwatch_types::WatchedAddress;

    const CUTOFF: u64 = 1_702_166_400;
    const ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

    fn config() -> CaptureConfig {
        CaptureConfig {
            history_cutoff: CUTOFF,
            backfill_retry_delay: Duration::from_millis(100),
            repair_interval: Duration::from_millis(100),
            follower: FollowerConfig { max_retries: 3, backoff_step: Duration::from_secs(10) },
            pending_transactions: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_captures_history_and_live_heads() {
        let node = Arc::new(FakeNode::new());
        // 104 is older than the cutoff, 105.. are not.
        node.insert_block(block_with_recipients(104, CUTOFF - 1, &[Some(ROUTER)]));
        for number in 105..=115 {
            node.insert_block(block_with_recipients(
                number,
                CUTOFF + number,
                &[Some(ROUTER), Some(Address::ZERO)],
            ));
        }
        node.set_head(110);
        node.fail_block(107, 1);
        let heads = node.head_feed();
        let pending = node.pending_feed();

        let cancellation = CancellationToken::new();
        let service = CaptureService::new(
            Arc::clone(&node),
            Arc::new(AddressFilter::new([WatchedAddress::new("v2", ROUTER)])),
            config(),
            cancellation.clone(),
        );
        let blocks = Arc::clone(service.blocks());
        let transactions = Arc::clone(service.transactions());
        let pool = Arc::clone(service.pending());
        let run = tokio::spawn(service.run());

        for number in [111, 113, 115] {
            heads.send(Ok(head(number))).unwrap();
        }
        pending.send(Ok(transaction_hash(116, 0))).unwrap();

        wait_until(1_000, || (105..=115).all(|n| blocks.contains(n))).await;
        assert!(!blocks.contains(104));
        assert!(blocks.find_gaps().is_empty());
        assert_eq!(blocks.highest_number(), Some(115));
        assert_eq!(transactions.len(), 11);
        assert!(transactions.get(&transaction_hash(104, 0)).is_none());
        assert!(transactions.get(&transaction_hash(110, 1)).is_none());
        wait_until(100, || pool.contains(&transaction_hash(116, 0))).await;

        cancellation.cancel();
        assert_eq!(run.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_service_fails_without_head() {
        let cancellation = CancellationToken::new();
        let service = CaptureService::new(
            Arc::new(FakeNode::new()),
            Arc::new(AddressFilter::default()),
            config(),
            cancellation.clone(),
        );

        let err = service.run().await.unwrap_err();

        assert_eq!(err, CaptureError::HeadQuery(NodeError::Rpc("no head".to_string())));
        assert!(cancellation.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_stops_all_tasks_when_follower_gives_up() {
        let node = Arc::new(FakeNode::new());
        node.insert_chain(100..=101, |n| CUTOFF + n);
        node.set_head(101);

        let cancellation = CancellationToken::new();
        let service = CaptureService::new(
            Arc::clone(&node),
            Arc::new(AddressFilter::default()),
            config(),
            cancellation.clone(),
        );

        let err = service.run().await.unwrap_err();

        assert!(matches!(err, CaptureError::SubscriptionExhausted { attempts: 4, .. }));
        assert_eq!(node.subscriptions(), 4);
        assert!(cancellation.is_cancelled());
    }
}

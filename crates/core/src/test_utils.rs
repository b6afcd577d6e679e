//! Test utilities for the capture engine.

use crate::{HeadStream, NodeClient, NodeError, PendingStream};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use futures::StreamExt;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use swapwatch_types::{Block, HeadInfo, Transaction};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sender side of a scripted head subscription.
pub type HeadFeed = mpsc::UnboundedSender<Result<HeadInfo, NodeError>>;

/// Sender side of a scripted pending-transaction subscription.
pub type PendingFeed = mpsc::UnboundedSender<Result<B256, NodeError>>;

/// Builds a block with one transaction per entry of `recipients`.
///
/// Hashes are derived from the block number so that re-building the same block
/// yields an equal value.
pub fn block_with_recipients(number: u64, timestamp: u64, recipients: &[Option<Address>]) -> Block {
    let transactions = recipients
        .iter()
        .enumerate()
        .map(|(index, to)| Transaction {
            hash: transaction_hash(number, index as u64),
            from: Address::repeat_byte(0x11),
            to: *to,
            value: U256::from(index as u64 + 1),
            block_number: number,
            index: index as u64,
            timestamp,
        })
        .collect();
    Block {
        number,
        hash: block_hash(number),
        parent_hash: block_hash(number.saturating_sub(1)),
        timestamp,
        transactions,
    }
}

/// The hash [`block_with_recipients`] assigns to block `number`.
pub fn block_hash(number: u64) -> B256 {
    B256::left_padding_from(&number.to_be_bytes())
}

/// The hash [`block_with_recipients`] assigns to transaction `index` of block `number`.
pub fn transaction_hash(number: u64, index: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xaa;
    bytes[8..16].copy_from_slice(&number.to_be_bytes());
    bytes[24..32].copy_from_slice(&index.to_be_bytes());
    B256::from(bytes)
}

/// The [`HeadInfo`] announcing block `number`.
pub fn head(number: u64) -> HeadInfo {
    HeadInfo { number, hash: block_hash(number), timestamp: 0 }
}

/// An in-memory [`NodeClient`] driven by the test.
///
/// Blocks are served from a map, with optional scripted failures and delays per
/// block number. Subscriptions are fed through channels handed out by
/// [`FakeNode::head_feed`] and [`FakeNode::pending_feed`]; each feed serves
/// exactly one subscription.
#[derive(Debug, Default)]
pub struct FakeNode {
    head: Mutex<Option<HeadInfo>>,
    blocks: Mutex<HashMap<u64, Block>>,
    failures: Mutex<HashMap<u64, usize>>,
    delays: Mutex<HashMap<u64, Duration>>,
    fetches: Mutex<Vec<u64>>,
    head_feeds: Mutex<Vec<mpsc::UnboundedReceiver<Result<HeadInfo, NodeError>>>>,
    pending_feeds: Mutex<Vec<mpsc::UnboundedReceiver<Result<B256, NodeError>>>>,
    subscriptions: AtomicUsize,
}

impl FakeNode {
    /// Creates an empty [`FakeNode`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the head returned by [`NodeClient::current_head`].
    ///
    /// Describes the inserted block `number` if there is one.
    pub fn set_head(&self, number: u64) {
        let info = self
            .blocks
            .lock()
            .unwrap()
            .get(&number)
            .map_or_else(|| head(number), Block::head_info);
        *self.head.lock().unwrap() = Some(info);
    }

    /// Makes `block` available.
    pub fn insert_block(&self, block: Block) {
        self.blocks.lock().unwrap().insert(block.number, block);
    }

    /// Makes blocks `numbers` available, each with a single unwatched transaction
    /// and a timestamp computed by `timestamp`.
    pub fn insert_chain(
        &self,
        numbers: impl IntoIterator<Item = u64>,
        timestamp: impl Fn(u64) -> u64,
    ) {
        for number in numbers {
            self.insert_block(block_with_recipients(
                number,
                timestamp(number),
                &[Some(Address::repeat_byte(0x22))],
            ));
        }
    }

    /// Makes the next `times` fetches of block `number` fail.
    pub fn fail_block(&self, number: u64, times: usize) {
        self.failures.lock().unwrap().insert(number, times);
    }

    /// Delays every fetch of block `number` by `delay`.
    pub fn delay_block(&self, number: u64, delay: Duration) {
        self.delays.lock().unwrap().insert(number, delay);
    }

    /// Returns every block number requested so far, in request order.
    pub fn fetches(&self) -> Vec<u64> {
        self.fetches.lock().unwrap().clone()
    }

    /// Returns how many times block `number` was requested.
    pub fn fetch_count(&self, number: u64) -> usize {
        self.fetches.lock().unwrap().iter().filter(|n| **n == number).count()
    }

    /// Returns the number of head subscriptions attempted.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Queues a head subscription and returns its sender.
    ///
    /// Subscribing with no queued feed fails.
    pub fn head_feed(&self) -> HeadFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.head_feeds.lock().unwrap().push(rx);
        tx
    }

    /// Queues a pending-transaction subscription and returns its sender.
    pub fn pending_feed(&self) -> PendingFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending_feeds.lock().unwrap().push(rx);
        tx
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn current_head(&self) -> Result<HeadInfo, NodeError> {
        self.head.lock().unwrap().ok_or_else(|| NodeError::Rpc("no head".to_string()))
    }

    async fn block_by_number(&self, number: u64) -> Result<Block, NodeError> {
        self.fetches.lock().unwrap().push(number);

        let delay = self.delays.lock().unwrap().get(&number).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&number) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(NodeError::Rpc(format!("scripted failure for block {number}")));
                }
            }
        }

        self.blocks.lock().unwrap().get(&number).cloned().ok_or(NodeError::BlockNotFound(number))
    }

    async fn subscribe_new_heads(&self) -> Result<HeadStream, NodeError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let mut feeds = self.head_feeds.lock().unwrap();
        if feeds.is_empty() {
            return Err(NodeError::Subscription("no head feed queued".to_string()));
        }
        Ok(UnboundedReceiverStream::new(feeds.remove(0)).boxed())
    }

    async fn subscribe_pending_transactions(&self) -> Result<PendingStream, NodeError> {
        let mut feeds = self.pending_feeds.lock().unwrap();
        if feeds.is_empty() {
            return Err(NodeError::Subscription("no pending feed queued".to_string()));
        }
        Ok(UnboundedReceiverStream::new(feeds.remove(0)).boxed())
    }
}

/// Polls `condition` until it holds, panicking after `attempts` polls of 10ms.
pub async fn wait_until(attempts: usize, mut condition: impl FnMut() -> bool) {
    for _ in 0..attempts {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached after {attempts} polls");
}

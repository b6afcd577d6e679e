//! The boundary to the chain node.

use alloy_primitives::B256;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;
use swapwatch_types::{Block, HeadInfo};
use thiserror::Error;

/// A stream of new-head notifications. An `Err` item terminates the subscription.
pub type HeadStream = BoxStream<'static, Result<HeadInfo, NodeError>>;

/// A stream of pending transaction hashes. An `Err` item terminates the subscription.
pub type PendingStream = BoxStream<'static, Result<B256, NodeError>>;

/// An error returned by a [`NodeClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node rejected the request or the transport failed.
    #[error("node request failed: {0}")]
    Rpc(String),
    /// The node does not know the requested block.
    #[error("block {0} not found")]
    BlockNotFound(u64),
    /// The node returned the block without its full transaction bodies.
    #[error("block {0} returned without full transactions")]
    MissingTransactions(u64),
    /// The subscription could not be established or was dropped by the node.
    #[error("subscription failed: {0}")]
    Subscription(String),
}

/// Client for the chain node.
///
/// Request-response calls and the long-lived subscriptions may use different
/// transports. Both are shared by every capture task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeClient: Debug + Send + Sync {
    /// Returns the node's current head.
    async fn current_head(&self) -> Result<HeadInfo, NodeError>;

    /// Fetches the block with the given number, with full transaction bodies.
    async fn block_by_number(&self, number: u64) -> Result<Block, NodeError>;

    /// Subscribes to new-head notifications.
    async fn subscribe_new_heads(&self) -> Result<HeadStream, NodeError>;

    /// Subscribes to the hashes of transactions entering the node's pool.
    async fn subscribe_pending_transactions(&self) -> Result<PendingStream, NodeError>;
}

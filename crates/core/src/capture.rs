//! Fetching a single block and writing it into the indexes.

use crate::{CaptureError, Metrics, NodeClient};
use std::sync::Arc;
use swapwatch_storage::{BlockIndex, TransactionIndex};
use swapwatch_types::{AddressFilter, Block};
use tracing::trace;

/// Captures blocks into the [`BlockIndex`] and [`TransactionIndex`].
///
/// Matching transactions are written before their block, so a captured block
/// always has its watched transactions indexed. Capturing the same number twice
/// overwrites the entries with equal values.
#[derive(Debug)]
pub struct Capturer<N> {
    node: Arc<N>,
    filter: Arc<AddressFilter>,
    blocks: Arc<BlockIndex>,
    transactions: Arc<TransactionIndex>,
}

impl<N> Clone for Capturer<N> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            filter: Arc::clone(&self.filter),
            blocks: Arc::clone(&self.blocks),
            transactions: Arc::clone(&self.transactions),
        }
    }
}

impl<N> Capturer<N>
where
    N: NodeClient,
{
    /// Creates a new [`Capturer`].
    pub const fn new(
        node: Arc<N>,
        filter: Arc<AddressFilter>,
        blocks: Arc<BlockIndex>,
        transactions: Arc<TransactionIndex>,
    ) -> Self {
        Self { node, filter, blocks, transactions }
    }

    /// Returns the node client.
    pub const fn node(&self) -> &Arc<N> {
        &self.node
    }

    /// Returns the block index.
    pub const fn blocks(&self) -> &Arc<BlockIndex> {
        &self.blocks
    }

    /// Returns the transaction index.
    pub const fn transactions(&self) -> &Arc<TransactionIndex> {
        &self.transactions
    }

    /// Fetches block `number` and writes it into the indexes.
    pub async fn capture(&self, number: u64) -> Result<Arc<Block>, CaptureError> {
        let block = self.fetch(number).await?;
        Ok(self.index(block))
    }

    /// Fetches block `number` without touching the indexes.
    pub async fn fetch(&self, number: u64) -> Result<Block, CaptureError> {
        let block = self
            .node
            .block_by_number(number)
            .await
            .map_err(|source| CaptureError::Fetch { number, source })?;
        if block.number != number {
            return Err(CaptureError::UnexpectedBlock { requested: number, received: block.number });
        }
        Ok(block)
    }

    /// Writes an already fetched block into the indexes.
    pub fn index(&self, block: Block) -> Arc<Block> {
        let mut matched = 0;
        for txn in block.transactions.iter().filter(|txn| self.filter.matches(txn.to.as_ref())) {
            self.transactions.put(txn.hash, Arc::new(txn.clone()));
            matched += 1;
        }

        let block = Arc::new(block);
        self.blocks.put(Arc::clone(&block));

        Metrics::record_matched(matched);
        trace!(
            target: "swapwatch::capture",
            number = block.number,
            hash = %block.hash,
            transactions = block.transactions.len(),
            matched,
            "Captured block"
        );
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        NodeError,
        test_utils::{FakeNode, block_with_recipients, transaction_hash},
    };
    use alloy_primitives::{Address, address};
    use rstest::rstest;
    use swapwatch_types::WatchedAddress;

    const WATCHED: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const UNWATCHED: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    fn capturer(node: FakeNode) -> Capturer<FakeNode> {
        Capturer::new(
            Arc::new(node),
            Arc::new(AddressFilter::new([WatchedAddress::new("v2", WATCHED)])),
            Arc::new(BlockIndex::new()),
            Arc::new(TransactionIndex::new()),
        )
    }

    #[tokio::test]
    async fn test_capture_indexes_only_watched_transactions() {
        let node = FakeNode::new();
        node.insert_block(block_with_recipients(
            101,
            1_702_200_000,
            &[Some(WATCHED), Some(UNWATCHED)],
        ));
        let capturer = capturer(node);

        let block = capturer.capture(101).await.unwrap();

        assert_eq!(block.number, 101);
        assert_eq!(capturer.blocks().get(101).unwrap(), block);
        assert_eq!(capturer.transactions().len(), 1);
        let txn = capturer.transactions().get(&transaction_hash(101, 0)).unwrap();
        assert_eq!(txn.to, Some(WATCHED));
        assert_eq!(txn.block_number, 101);
        assert!(capturer.transactions().get(&transaction_hash(101, 1)).is_none());
    }

    #[rstest]
    #[case::watched(&[Some(WATCHED)], 1)]
    #[case::unwatched(&[Some(UNWATCHED)], 0)]
    #[case::contract_creation(&[None], 0)]
    #[case::empty_block(&[], 0)]
    #[case::mixed(&[Some(WATCHED), None, Some(UNWATCHED), Some(WATCHED)], 2)]
    #[tokio::test]
    async fn test_capture_keeps_watched_recipients(
        #[case] recipients: &[Option<Address>],
        #[case] indexed: usize,
    ) {
        let node = FakeNode::new();
        node.insert_block(block_with_recipients(7, 1_702_200_000, recipients));
        let capturer = capturer(node);

        capturer.capture(7).await.unwrap();

        assert!(capturer.blocks().contains(7));
        assert_eq!(capturer.transactions().len(), indexed);
        capturer.transactions().range(|_, txn| {
            assert_eq!(txn.to, Some(WATCHED));
            true
        });
    }

    #[tokio::test]
    async fn test_recapture_is_idempotent() {
        let node = FakeNode::new();
        node.insert_block(block_with_recipients(
            5,
            1_702_200_000,
            &[Some(WATCHED), Some(WATCHED)],
        ));
        let capturer = capturer(node);

        let first = capturer.capture(5).await.unwrap();
        let second = capturer.capture(5).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(capturer.blocks().len(), 1);
        assert_eq!(capturer.transactions().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_indexes_untouched() {
        let node = FakeNode::new();
        node.insert_block(block_with_recipients(9, 1_702_200_000, &[Some(WATCHED)]));
        node.fail_block(9, 1);
        let capturer = capturer(node);

        let err = capturer.capture(9).await.unwrap_err();

        assert!(matches!(err, CaptureError::Fetch { number: 9, source: NodeError::Rpc(_) }));
        assert!(capturer.blocks().is_empty());
        assert!(capturer.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_missing_block_is_reported() {
        let capturer = capturer(FakeNode::new());
        let err = capturer.capture(3).await.unwrap_err();
        assert_eq!(err, CaptureError::Fetch { number: 3, source: NodeError::BlockNotFound(3) });
    }

    #[tokio::test]
    async fn test_mismatched_block_is_rejected() {
        let mut mock = crate::node::MockNodeClient::new();
        mock.expect_block_by_number()
            .returning(|_| Ok(block_with_recipients(13, 1_702_200_000, &[])));
        let capturer = Capturer::new(
            Arc::new(mock),
            Arc::new(AddressFilter::default()),
            Arc::new(BlockIndex::new()),
            Arc::new(TransactionIndex::new()),
        );
        let err = capturer.capture(12).await.unwrap_err();
        assert_eq!(err, CaptureError::UnexpectedBlock { requested: 12, received: 13 });
        assert!(capturer.blocks().is_empty());
    }
}

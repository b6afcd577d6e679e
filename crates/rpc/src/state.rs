use std::sync::Arc;
use swapwatch_storage::{BlockIndex, TransactionIndex};
use swapwatch_types::AddressFilter;

/// Number of transactions returned by the list routes.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Number of block numbers the list routes walk down from the latest block.
pub const DEFAULT_SCAN_DEPTH: u64 = 1_024;

/// Shared state of the query routes.
#[derive(Debug, Clone)]
pub struct QueryState {
    /// The block index, read only.
    pub blocks: Arc<BlockIndex>,
    /// The transaction index, read only.
    pub transactions: Arc<TransactionIndex>,
    /// The watch-list, for group lookups.
    pub filter: Arc<AddressFilter>,
    /// Maximum number of transactions per list.
    pub limit: usize,
    /// Maximum number of block numbers a list walks.
    pub depth: u64,
}

impl QueryState {
    /// Creates a new [`QueryState`] with the default limit and depth.
    pub const fn new(
        blocks: Arc<BlockIndex>,
        transactions: Arc<TransactionIndex>,
        filter: Arc<AddressFilter>,
    ) -> Self {
        Self {
            blocks,
            transactions,
            filter,
            limit: DEFAULT_QUERY_LIMIT,
            depth: DEFAULT_SCAN_DEPTH,
        }
    }

    /// Sets the list limit.
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the scan depth.
    pub const fn with_depth(mut self, depth: u64) -> Self {
        self.depth = depth;
        self
    }
}

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use std::sync::Arc;
use swapwatch_types::Block;

/// Concurrent index of captured blocks keyed by block number.
///
/// Entries are insert-once in spirit: re-capturing a number overwrites the entry
/// with an equal (or corrected) block, and a block is only ever inserted whole.
///
/// The latest block is tracked as a single atomically swapped reference that is
/// advanced only after the map insert completes, so [`BlockIndex::latest`] never
/// points at a block that a concurrent [`BlockIndex::get`] could not see.
#[derive(Debug, Default)]
pub struct BlockIndex {
    blocks: DashMap<u64, Arc<Block>>,
    latest: ArcSwapOption<Block>,
}

impl BlockIndex {
    /// Creates an empty [`BlockIndex`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `block.number`.
    ///
    /// Advances the latest block if `block.number` is at least the current
    /// highest number. The latest pointer never moves backwards.
    pub fn put(&self, block: Arc<Block>) {
        let number = block.number;
        self.blocks.insert(number, Arc::clone(&block));
        self.latest.rcu(|current| match current {
            Some(current) if current.number > number => Some(Arc::clone(current)),
            _ => Some(Arc::clone(&block)),
        });
    }

    /// Returns the block stored under `number`, if captured.
    pub fn get(&self, number: u64) -> Option<Arc<Block>> {
        self.blocks.get(&number).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns true if a block is stored under `number`.
    pub fn contains(&self, number: u64) -> bool {
        self.blocks.contains_key(&number)
    }

    /// Returns the block with the highest number captured so far.
    pub fn latest(&self) -> Option<Arc<Block>> {
        self.latest.load_full()
    }

    /// Returns the highest block number captured so far.
    pub fn highest_number(&self) -> Option<u64> {
        self.latest.load().as_ref().map(|block| block.number)
    }

    /// Returns every block number strictly between the lowest and the highest
    /// captured numbers that is not itself captured, in ascending order.
    ///
    /// Empty when zero or one blocks are stored. The cost is proportional to
    /// the number of captured blocks plus the number of holes.
    pub fn find_gaps(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self.blocks.iter().map(|entry| *entry.key()).collect();
        numbers.sort_unstable();
        numbers.windows(2).flat_map(|pair| (pair[0] + 1)..pair[1]).collect()
    }

    /// Returns the number of captured blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block has been captured.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

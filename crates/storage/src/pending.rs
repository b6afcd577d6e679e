use alloy_primitives::B256;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

/// Default number of pending transaction hashes retained.
pub const DEFAULT_PENDING_CAPACITY: usize = 4096;

/// A bounded set of pending transaction hashes, oldest evicted first.
#[derive(Debug)]
pub struct PendingPool {
    capacity: usize,
    inner: Mutex<PendingInner>,
}

#[derive(Debug, Default)]
struct PendingInner {
    order: VecDeque<B256>,
    members: HashSet<B256>,
}

impl PendingPool {
    /// Creates a new [`PendingPool`] retaining at most `capacity` hashes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: Mutex::new(PendingInner::default()) }
    }

    /// Records a pending transaction hash.
    ///
    /// Returns false if the hash was already present.
    pub fn insert(&self, hash: B256) -> bool {
        let mut inner = self.inner.lock();
        if !inner.members.insert(hash) {
            return false;
        }
        inner.order.push_back(hash);
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.members.remove(&evicted);
            }
        }
        true
    }

    /// Returns true if `hash` is currently retained.
    pub fn contains(&self, hash: &B256) -> bool {
        self.inner.lock().members.contains(hash)
    }

    /// Returns the retained hashes, oldest first.
    pub fn snapshot(&self) -> Vec<B256> {
        self.inner.lock().order.iter().copied().collect()
    }

    /// Returns the number of retained hashes.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Returns true if no hash is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates() {
        let pool = PendingPool::new(4);
        assert!(pool.insert(B256::repeat_byte(1)));
        assert!(!pool.insert(B256::repeat_byte(1)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let pool = PendingPool::new(2);
        pool.insert(B256::repeat_byte(1));
        pool.insert(B256::repeat_byte(2));
        pool.insert(B256::repeat_byte(3));

        assert_eq!(pool.snapshot(), vec![B256::repeat_byte(2), B256::repeat_byte(3)]);
        assert!(!pool.contains(&B256::repeat_byte(1)));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let pool = PendingPool::new(0);
        pool.insert(B256::repeat_byte(1));
        pool.insert(B256::repeat_byte(2));
        assert_eq!(pool.snapshot(), vec![B256::repeat_byte(2)]);
    }
}

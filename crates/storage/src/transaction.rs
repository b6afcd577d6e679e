use alloy_primitives::B256;
use dashmap::DashMap;
use std::sync::Arc;
use swapwatch_types::Transaction;

/// Concurrent index of captured transactions keyed by transaction hash.
///
/// Only transactions addressed to a watched address are stored. Entries are
/// never removed. There is no ordering guarantee across keys.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    transactions: DashMap<B256, Arc<Transaction>>,
}

impl TransactionIndex {
    /// Creates an empty [`TransactionIndex`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the transaction stored under `hash`.
    pub fn put(&self, hash: B256, transaction: Arc<Transaction>) {
        self.transactions.insert(hash, transaction);
    }

    /// Returns the transaction stored under `hash`.
    pub fn get(&self, hash: &B256) -> Option<Arc<Transaction>> {
        self.transactions.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Visits every stored transaction until `visit` returns `false`.
    ///
    /// Visits a snapshot taken before the first call, so `visit` may write to
    /// the index. Entries inserted meanwhile are not visited.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&B256, &Arc<Transaction>) -> bool,
    {
        let entries: Vec<_> = self
            .transactions
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        for (hash, transaction) in &entries {
            if !visit(hash, transaction) {
                break;
            }
        }
    }

    /// Returns the number of stored transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns true if no transaction is stored.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

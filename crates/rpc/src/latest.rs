use alloy_primitives::Address;
use swapwatch_storage::BlockIndex;
use swapwatch_types::Transaction;

/// Collects up to `limit` transactions accepted by `accept`, newest first.
///
/// Walks at most `depth` block numbers down from the latest captured block.
/// Blocks are visited by descending number and their transactions by
/// descending index. Missing numbers are skipped.
pub fn latest_transactions(
    blocks: &BlockIndex,
    limit: usize,
    depth: u64,
    mut accept: impl FnMut(Option<&Address>) -> bool,
) -> Vec<Transaction> {
    let mut found = Vec::with_capacity(limit);
    let Some(latest) = blocks.highest_number() else {
        return found;
    };

    let lowest = latest.saturating_sub(depth.saturating_sub(1));
    for number in (lowest..=latest).rev() {
        if found.len() >= limit {
            break;
        }
        let Some(block) = blocks.get(number) else {
            continue;
        };
        found.extend(
            block
                .transactions
                .iter()
                .rev()
                .filter(|txn| accept(txn.to.as_ref()))
                .take(limit - found.len())
                .cloned(),
        );
    }
    found
}

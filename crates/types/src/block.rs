use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A block fetched from the chain node, with its full transaction list.
///
/// Blocks are immutable once fetched. The transactions keep the order in which
/// they appear in the block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp, in unix seconds.
    pub timestamp: u64,
    /// The transactions contained in the block, in block order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Returns the [`HeadInfo`] describing this block.
    pub const fn head_info(&self) -> HeadInfo {
        HeadInfo { number: self.number, hash: self.hash, timestamp: self.timestamp }
    }
}

/// A transaction contained in a captured [`Block`].
///
/// `block_number` and `timestamp` are inherited from the containing block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The transaction hash.
    pub hash: B256,
    /// The sender.
    pub from: Address,
    /// The recipient, absent for contract creations.
    pub to: Option<Address>,
    /// The value transferred, in wei.
    pub value: U256,
    /// The number of the containing block.
    pub block_number: u64,
    /// The position of the transaction within its block.
    pub index: u64,
    /// The timestamp of the containing block.
    pub timestamp: u64,
}

/// A new-head notification, or the answer to a current-head query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadInfo {
    /// The head block number.
    pub number: u64,
    /// The head block hash.
    pub hash: B256,
    /// The head block timestamp, in unix seconds.
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_head_info_from_block() {
        let block = Block {
            number: 7,
            hash: B256::repeat_byte(7),
            timestamp: 1_700_000_000,
            ..Default::default()
        };
        let head = block.head_info();
        assert_eq!(head.number, 7);
        assert_eq!(head.hash, B256::repeat_byte(7));
        assert_eq!(head.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_transaction_serializes_camel_case() {
        let txn = Transaction {
            hash: B256::repeat_byte(1),
            from: Address::ZERO,
            to: Some(address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D")),
            value: U256::from(1u64),
            block_number: 18754505,
            index: 3,
            timestamp: 1_702_000_000,
        };
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["blockNumber"], 18754505);
        assert_eq!(json["index"], 3);
        assert!(json.get("block_number").is_none());
    }
}

//! Core types shared across swapwatch components.
//!
//! This crate defines the blocks and transactions captured from the chain node,
//! and the [`AddressFilter`] deciding which transactions are retained.

mod block;
pub use block::{Block, HeadInfo, Transaction};

mod filter;
pub use filter::{AddressFilter, WatchedAddress, WatchedAddressError};

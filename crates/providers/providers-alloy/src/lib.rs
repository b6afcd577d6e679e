//! A [`NodeClient`](swapwatch_core::NodeClient) backed by alloy providers.
//!
//! Requests go over HTTP, optionally through a proxy. Subscriptions go over a
//! lazily opened WebSocket connection that is re-established after a failed
//! subscribe.

mod error;
pub use error::ProviderError;

mod client;
pub use client::AlloyNodeClient;

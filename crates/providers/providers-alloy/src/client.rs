use crate::ProviderError;
use alloy_eips::BlockNumberOrTag;
use alloy_network::TransactionResponse;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_rpc_types_eth::Header;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use alloy_transport_ws::WsConnect;
use async_trait::async_trait;
use futures::StreamExt;
use swapwatch_core::{HeadStream, NodeClient, NodeError, PendingStream};
use swapwatch_types::{Block, HeadInfo, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// A [`NodeClient`] talking to an Ethereum JSON-RPC node.
#[derive(Debug)]
pub struct AlloyNodeClient {
    http: RootProvider,
    ws_url: Url,
    ws: Mutex<Option<RootProvider>>,
}

impl AlloyNodeClient {
    /// Creates a new [`AlloyNodeClient`].
    ///
    /// Requests are sent to `rpc_url`, through `proxy` if given. Subscriptions
    /// connect to `ws_url` on first use.
    pub fn new(rpc_url: Url, ws_url: Url, proxy: Option<Url>) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = proxy {
            info!(target: "swapwatch::provider", %proxy, "Routing node requests through proxy");
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(ProviderError::Proxy)?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(ProviderError::HttpClient)?;

        let http = RootProvider::new(RpcClient::new(Http::with_client(client, rpc_url), false));
        Ok(Self { http, ws_url, ws: Mutex::new(None) })
    }

    /// Returns the WebSocket provider, connecting if needed.
    async fn ws_provider(&self) -> Result<RootProvider, NodeError> {
        let mut ws = self.ws.lock().await;
        if let Some(provider) = ws.as_ref() {
            return Ok(provider.clone());
        }

        info!(target: "swapwatch::provider", url = %self.ws_url, "Connecting to node websocket");
        let client = ClientBuilder::default()
            .ws(WsConnect::new(self.ws_url.as_str()))
            .await
            .map_err(|err| NodeError::Subscription(err.to_string()))?;
        let provider = RootProvider::new(client);
        *ws = Some(provider.clone());
        Ok(provider)
    }

    /// Drops the WebSocket provider so that the next subscription reconnects.
    async fn reset_ws(&self) {
        if self.ws.lock().await.take().is_some() {
            debug!(target: "swapwatch::provider", "Dropped node websocket connection");
        }
    }
}

#[async_trait]
impl NodeClient for AlloyNodeClient {
    async fn current_head(&self) -> Result<HeadInfo, NodeError> {
        let block = self
            .http
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| NodeError::Rpc("node returned no latest block".to_string()))?;
        Ok(head_info(&block.header))
    }

    async fn block_by_number(&self, number: u64) -> Result<Block, NodeError> {
        let block = self
            .http
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full()
            .await
            .map_err(rpc_error)?
            .ok_or(NodeError::BlockNotFound(number))?;
        into_block(block)
    }

    async fn subscribe_new_heads(&self) -> Result<HeadStream, NodeError> {
        let provider = self.ws_provider().await?;
        let subscription = match provider.subscribe_blocks().await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(target: "swapwatch::provider", %err, "Failed to subscribe to new heads");
                self.reset_ws().await;
                return Err(NodeError::Subscription(err.to_string()));
            }
        };

        Ok(subscription.into_stream().map(|header| Ok(head_info(&header))).boxed())
    }

    async fn subscribe_pending_transactions(&self) -> Result<PendingStream, NodeError> {
        let provider = self.ws_provider().await?;
        let subscription = match provider.subscribe_pending_transactions().await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(
                    target: "swapwatch::provider",
                    %err,
                    "Failed to subscribe to pending transactions"
                );
                self.reset_ws().await;
                return Err(NodeError::Subscription(err.to_string()));
            }
        };

        Ok(subscription.into_stream().map(Ok).boxed())
    }
}

fn rpc_error(err: TransportError) -> NodeError {
    NodeError::Rpc(err.to_string())
}

const fn head_info(header: &Header) -> HeadInfo {
    HeadInfo { number: header.inner.number, hash: header.hash, timestamp: header.inner.timestamp }
}

/// Converts a block fetched with full transactions into a [`Block`].
fn into_block(block: alloy_rpc_types_eth::Block) -> Result<Block, NodeError> {
    let header = &block.header;
    let txs = block
        .transactions
        .as_transactions()
        .ok_or(NodeError::MissingTransactions(header.number))?;
    let transactions = txs
        .iter()
        .enumerate()
        .map(|(position, tx)| Transaction {
            hash: tx.tx_hash(),
            from: TransactionResponse::from(tx),
            to: alloy_consensus::Transaction::to(tx),
            value: alloy_consensus::Transaction::value(tx),
            block_number: header.number,
            index: tx.transaction_index.unwrap_or(position as u64),
            timestamp: header.timestamp,
        })
        .collect();

    Ok(Block {
        number: header.number,
        hash: header.hash,
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        raw.parse().unwrap()
    }

    #[test]
    fn test_builds_without_proxy() {
        let client =
            AlloyNodeClient::new(url("http://localhost:8545"), url("ws://localhost:8546"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_builds_with_proxy() {
        let client = AlloyNodeClient::new(
            url("http://localhost:8545"),
            url("ws://localhost:8546"),
            Some(url("http://127.0.0.1:7890")),
        );
        assert!(client.is_ok());
    }
}

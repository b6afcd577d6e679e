use crate::{QueryState, handlers};
use axum::{Router, routing::get};
use std::{io, net::SocketAddr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builds the query router over `state`.
pub fn router(state: QueryState) -> Router {
    Router::new()
        .route("/transaction", get(handlers::missing_hash))
        .route("/transaction/", get(handlers::missing_hash))
        .route("/transaction/{hash}", get(handlers::transaction))
        .route("/transactions", get(handlers::transactions))
        .route("/transactions/{group}", get(handlers::group_transactions))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serves the query routes on `addr` until `cancellation` fires.
///
/// In-flight requests are allowed to finish after cancellation.
pub async fn serve(
    addr: SocketAddr,
    state: QueryState,
    cancellation: CancellationToken,
) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(target: "swapwatch::rpc", addr = %listener.local_addr()?, "Query service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancellation.cancelled().await })
        .await?;

    info!(target: "swapwatch::rpc", "Query service stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, address};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use swapwatch_storage::{BlockIndex, TransactionIndex};
    use swapwatch_types::{AddressFilter, Block, Transaction};
    use tower::ServiceExt;

    const V2: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
    const V3: Address = address!("E592427A0AEce92De3Edee1F18E0157C05861564");

    fn txn_hash(number: u64, index: u64) -> B256 {
        B256::with_last_byte((number * 4 + index) as u8)
    }

    /// Blocks 10 and 11, each with a v2, a v3 and an unwatched transaction,
    /// indexed the way the capture engine indexes them.
    fn state() -> QueryState {
        let filter = Arc::new(AddressFilter::default());
        let blocks = Arc::new(BlockIndex::new());
        let transactions = Arc::new(TransactionIndex::new());
        for number in [10, 11] {
            let txns: Vec<_> = [V2, V3, Address::ZERO]
                .into_iter()
                .enumerate()
                .map(|(index, to)| Transaction {
                    hash: txn_hash(number, index as u64),
                    to: Some(to),
                    block_number: number,
                    index: index as u64,
                    timestamp: 1_702_200_000 + number,
                    ..Default::default()
                })
                .collect();
            for txn in txns.iter().filter(|txn| filter.matches(txn.to.as_ref())) {
                transactions.put(txn.hash, Arc::new(txn.clone()));
            }
            blocks.put(Arc::new(Block { number, transactions: txns, ..Default::default() }));
        }
        QueryState::new(blocks, transactions, filter)
    }

    async fn get(state: QueryState, uri: &str) -> (StatusCode, Option<Value>) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).ok())
    }

    fn hashes(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|txn| txn["hash"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_transaction_found() {
        let hash = txn_hash(11, 1);
        let (status, body) = get(state(), &format!("/transaction/{hash}")).await;
        let body = body.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 0);
        assert_eq!(body["data"]["hash"], hash.to_string());
        assert_eq!(body["data"]["blockNumber"], 11);
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_transaction_not_found() {
        let (status, body) = get(state(), &format!("/transaction/{}", txn_hash(11, 2))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({ "status": 1, "message": "Transaction is not found" }));
    }

    #[tokio::test]
    async fn test_transaction_bad_input() {
        for uri in ["/transaction/", "/transaction", "/transaction/0x1234", "/transaction/zz"] {
            let (status, _) = get(state(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_latest_overall() {
        let (status, body) = get(state(), "/transactions").await;
        let body = body.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 0);
        let expected: Vec<_> =
            [txn_hash(11, 1), txn_hash(11, 0), txn_hash(10, 1), txn_hash(10, 0)]
                .iter()
                .map(ToString::to_string)
                .collect();
        assert_eq!(hashes(&body), expected);
    }

    #[tokio::test]
    async fn test_latest_respects_limit() {
        let (_, body) = get(state().with_limit(3), "/transactions").await;
        assert_eq!(hashes(&body.unwrap()).len(), 3);
    }

    #[tokio::test]
    async fn test_latest_by_group() {
        let (_, body) = get(state(), "/transactions/v3").await;
        let expected: Vec<_> =
            [txn_hash(11, 1), txn_hash(10, 1)].iter().map(ToString::to_string).collect();
        assert_eq!(hashes(&body.unwrap()), expected);
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let (status, body) = get(state(), "/transactions/v4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({ "status": 1, "message": "unknown address group" }));
    }

    #[tokio::test]
    async fn test_query_by_hash() {
        let v2_hash = txn_hash(10, 0);

        let (_, body) = get(state(), &format!("/transactions?query={v2_hash}")).await;
        assert_eq!(hashes(&body.unwrap()), vec![v2_hash.to_string()]);

        let (_, body) = get(state(), &format!("/transactions/v2?query={v2_hash}")).await;
        assert_eq!(hashes(&body.unwrap()), vec![v2_hash.to_string()]);

        let (_, body) = get(state(), &format!("/transactions/v3?query={v2_hash}")).await;
        assert!(hashes(&body.unwrap()).is_empty());

        let (status, _) = get(state(), "/transactions?query=nothex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_latest_block() {
        let (_, body) = get(state(), "/health").await;
        assert_eq!(body.unwrap(), json!({ "status": 0, "data": 11 }));

        let empty = QueryState::new(
            Arc::new(BlockIndex::new()),
            Arc::new(TransactionIndex::new()),
            Arc::new(AddressFilter::default()),
        );
        let (_, body) = get(empty, "/health").await;
        assert_eq!(body.unwrap(), json!({ "status": 0, "data": null }));
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancellation() {
        let cancellation = CancellationToken::new();
        let server = tokio::spawn(serve(
            "127.0.0.1:0".parse().unwrap(),
            state(),
            cancellation.clone(),
        ));

        cancellation.cancel();
        server.await.unwrap().unwrap();
    }
}

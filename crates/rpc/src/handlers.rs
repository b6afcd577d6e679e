//! Route handlers.

use crate::{Envelope, QueryState, latest_transactions};
use alloy_primitives::{Address, B256};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use swapwatch_types::Transaction;
use tracing::debug;

const TRANSACTION_NOT_FOUND: &str = "Transaction is not found";
const UNKNOWN_GROUP: &str = "unknown address group";

/// Query parameters of the list routes.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    query: Option<String>,
}

fn parse_hash(raw: &str) -> Result<B256, StatusCode> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    raw.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

pub(crate) async fn missing_hash() -> StatusCode {
    StatusCode::BAD_REQUEST
}

pub(crate) async fn transaction(
    State(state): State<QueryState>,
    Path(hash): Path<String>,
) -> Result<Envelope<Transaction>, StatusCode> {
    let hash = parse_hash(&hash)?;
    debug!(target: "swapwatch::rpc", %hash, "Transaction lookup");

    Ok(match state.transactions.get(&hash) {
        Some(txn) => Envelope::ok(txn.as_ref().clone()),
        None => Envelope::not_found(TRANSACTION_NOT_FOUND),
    })
}

pub(crate) async fn transactions(
    State(state): State<QueryState>,
    Query(params): Query<ListParams>,
) -> Result<Envelope<Vec<Transaction>>, StatusCode> {
    list(&state, None, params)
}

pub(crate) async fn group_transactions(
    State(state): State<QueryState>,
    Path(group): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Envelope<Vec<Transaction>>, StatusCode> {
    let Some(address) = state.filter.group(&group) else {
        return Ok(Envelope::not_found(UNKNOWN_GROUP));
    };
    list(&state, Some(address), params)
}

/// Lists watched transactions, restricted to `group` when given.
fn list(
    state: &QueryState,
    group: Option<Address>,
    params: ListParams,
) -> Result<Envelope<Vec<Transaction>>, StatusCode> {
    let accept = |to: Option<&Address>| match group {
        Some(group) => to == Some(&group),
        None => state.filter.matches(to),
    };

    let query = params.query.as_deref().map(str::trim).filter(|query| !query.is_empty());
    if let Some(query) = query {
        let hash = parse_hash(query)?;
        let found = state
            .transactions
            .get(&hash)
            .filter(|txn| accept(txn.to.as_ref()))
            .map(|txn| txn.as_ref().clone());
        return Ok(Envelope::ok(found.into_iter().collect()));
    }

    Ok(Envelope::ok(latest_transactions(&state.blocks, state.limit, state.depth, accept)))
}

pub(crate) async fn health(State(state): State<QueryState>) -> Envelope<Option<u64>> {
    Envelope::ok(state.blocks.highest_number())
}

//! The read-only HTTP query service over the captured indexes.
//!
//! Routes:
//! - `GET /transaction/{hash}`: a single watched transaction.
//! - `GET /transactions` and `GET /transactions/{group}`: the most recent watched
//!   transactions, overall or for one address group. `?query=<hash>` narrows the
//!   list to that transaction.
//! - `GET /health`: the latest captured block number.
//!
//! Every answer is wrapped in an [`Envelope`]. Malformed input is rejected with
//! `400 Bad Request`.

mod envelope;
pub use envelope::Envelope;

mod state;
pub use state::{DEFAULT_QUERY_LIMIT, DEFAULT_SCAN_DEPTH, QueryState};

mod latest;
pub use latest::latest_transactions;

mod handlers;

mod server;
pub use server::{router, serve};

use clap::Args;
use std::net::SocketAddr;
use swapwatch_rpc::DEFAULT_QUERY_LIMIT;
use swapwatch_types::{AddressFilter, WatchedAddress};

/// Watch-list and query service arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct QueryArgs {
    /// Watched addresses as `name=0xaddress`. Defaults to the Uniswap V2 (`v2`)
    /// and V3 (`v3`) routers.
    #[arg(long = "watch", env = "SWAPWATCH_WATCH", value_delimiter = ',')]
    pub watch: Vec<WatchedAddress>,
    /// Listen address of the HTTP query service. The service is disabled when unset.
    #[arg(long, env = "SWAPWATCH_HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,
    /// Number of transactions returned by the list routes.
    #[arg(long, env = "SWAPWATCH_QUERY_LIMIT", default_value_t = DEFAULT_QUERY_LIMIT)]
    pub query_limit: usize,
}

impl QueryArgs {
    /// Returns the [`AddressFilter`] for the configured watch-list.
    pub fn filter(&self) -> AddressFilter {
        if self.watch.is_empty() {
            AddressFilter::default()
        } else {
            AddressFilter::new(self.watch.iter().cloned())
        }
    }
}

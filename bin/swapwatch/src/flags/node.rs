use clap::Args;
use url::Url;

/// Chain node connection arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct NodeArgs {
    /// HTTP JSON-RPC endpoint of the node.
    #[arg(long, env = "SWAPWATCH_RPC_URL")]
    pub rpc_url: Url,
    /// WebSocket endpoint of the node, used for subscriptions.
    #[arg(long, env = "SWAPWATCH_WS_URL")]
    pub ws_url: Url,
    /// Proxy for requests to the HTTP endpoint.
    #[arg(long, env = "SWAPWATCH_RPC_PROXY")]
    pub rpc_proxy: Option<Url>,
}

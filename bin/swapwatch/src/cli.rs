//! Contains the swapwatch CLI.

use crate::flags::{CaptureArgs, NodeArgs, QueryArgs};
use anyhow::{Context as _, Result};
use clap::Parser;
use std::{sync::Arc, time::Duration};
use swapwatch_cli::{cli_styles, init_tracing_subscriber, log::LogArgs, metrics_args::MetricsArgs};
use swapwatch_core::CaptureService;
use swapwatch_providers_alloy::AlloyNodeClient;
use swapwatch_rpc::QueryState;
use tokio::{
    task::{JoinError, JoinHandle},
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Captures watched-address transactions from an Ethereum node.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log: LogArgs,
    /// Prometheus arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
    /// Node connection arguments.
    #[command(flatten)]
    pub(crate) node: NodeArgs,
    /// Capture engine arguments.
    #[command(flatten)]
    pub(crate) capture: CaptureArgs,
    /// Watch-list and query service arguments.
    #[command(flatten)]
    pub(crate) query: QueryArgs,
    /// Seconds to wait for the tasks to stop after a shutdown signal.
    #[arg(long, env = "SWAPWATCH_SHUTDOWN_GRACE_PERIOD", default_value_t = 10)]
    pub(crate) shutdown_grace_period: u64,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        let rt = Self::tokio_runtime().context("failed to build tokio runtime")?;
        rt.block_on(async move {
            self.init_stack()?;
            self.start().await
        })
    }

    /// Initializes the tracing subscriber and the Prometheus exporter.
    ///
    /// The exporter needs a running runtime, so this is called from within it.
    fn init_stack(&self) -> Result<()> {
        init_tracing_subscriber(self.log.v, None::<EnvFilter>)?;
        self.metrics.init_metrics()?;
        Ok(())
    }

    /// Creates a new default tokio multi-thread [Runtime](tokio::runtime::Runtime) with all
    /// features enabled.
    fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }

    /// Runs the capture service and the optional query service until the
    /// service fails or ctrl-c is received.
    async fn start(self) -> Result<()> {
        let cancellation = CancellationToken::new();
        let grace = Duration::from_secs(self.shutdown_grace_period);

        let node = AlloyNodeClient::new(self.node.rpc_url, self.node.ws_url, self.node.rpc_proxy)
            .context("failed to build node client")?;
        let filter = Arc::new(self.query.filter());
        for watched in filter.iter() {
            info!(target: "swapwatch", %watched, "Watching address");
        }

        let service = CaptureService::new(
            Arc::new(node),
            Arc::clone(&filter),
            self.capture.config(),
            cancellation.clone(),
        );

        let server = self.query.http_addr.map(|addr| {
            let state = QueryState::new(
                Arc::clone(service.blocks()),
                Arc::clone(service.transactions()),
                Arc::clone(&filter),
            )
            .with_limit(self.query.query_limit);
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                if let Err(err) = swapwatch_rpc::serve(addr, state, cancellation).await {
                    error!(target: "swapwatch", %addr, %err, "Query service failed");
                }
            })
        });

        let mut capture = tokio::spawn(service.run());
        let finished = tokio::select! {
            result = &mut capture => Some(result),
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(target: "swapwatch", %err, "Failed to listen for ctrl-c");
                }
                info!(target: "swapwatch", "Received shutdown signal");
                None
            }
        };
        cancellation.cancel();

        let result = match finished {
            Some(result) => Some(result),
            None => wait(grace, "capture service", &mut capture).await,
        };
        if let Some(mut server) = server {
            wait(grace, "query service", &mut server).await;
        }

        match result {
            Some(result) => result.context("capture service panicked")?.map_err(Into::into),
            None => Ok(()),
        }
    }
}

/// Waits at most `grace` for `task`, aborting it when the grace period elapses.
async fn wait<T>(
    grace: Duration,
    name: &str,
    task: &mut JoinHandle<T>,
) -> Option<Result<T, JoinError>> {
    match timeout(grace, &mut *task).await {
        Ok(result) => Some(result),
        Err(_) => {
            warn!(target: "swapwatch", task = name, ?grace, "Task did not stop in time");
            task.abort();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapwatch_core::DEFAULT_HISTORY_CUTOFF;
    use swapwatch_types::AddressFilter;

    const REQUIRED: [&str; 5] =
        ["swapwatch", "--rpc-url", "http://localhost:8545", "--ws-url", "ws://localhost:8546"];

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();

        assert_eq!(cli.capture.config(), swapwatch_core::CaptureConfig::default());
        assert_eq!(cli.capture.history_cutoff, DEFAULT_HISTORY_CUTOFF);
        assert_eq!(cli.query.filter(), AddressFilter::default());
        assert_eq!(cli.query.http_addr, None);
        assert_eq!(cli.query.query_limit, 10);
        assert_eq!(cli.shutdown_grace_period, 10);
        assert_eq!(cli.node.rpc_proxy, None);
        assert!(!cli.metrics.enabled);
    }

    #[test]
    fn test_requires_node_endpoints() {
        assert!(Cli::try_parse_from(["swapwatch", "--rpc-url", "http://localhost:8545"]).is_err());
    }

    #[test]
    fn test_watch_list() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--watch",
            "a=0x00000000000000000000000000000000000000aa,b=0x00000000000000000000000000000000000000bb",
            "--watch",
            "c=0x00000000000000000000000000000000000000cc",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();

        let filter = cli.query.filter();
        let names: Vec<_> = filter.iter().map(|watched| watched.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(filter.group("v2").is_none());
    }

    #[test]
    fn test_invalid_watch_entry() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--watch", "v2"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_capture_flags() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--history-cutoff",
            "2024-01-01",
            "--subscribe-retries",
            "5",
            "--subscribe-backoff",
            "2",
            "--pending-txs",
            "--http-addr",
            "127.0.0.1:8080",
            "--rpc-proxy",
            "http://127.0.0.1:7890",
            "-vv",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();

        let config = cli.capture.config();
        assert_eq!(config.history_cutoff, 1_704_067_200);
        assert_eq!(config.follower.max_retries, 5);
        assert_eq!(config.follower.backoff_step, Duration::from_secs(2));
        assert!(config.pending_transactions);
        assert_eq!(cli.query.http_addr, Some("127.0.0.1:8080".parse().unwrap()));
        assert!(cli.node.rpc_proxy.is_some());
        assert_eq!(cli.log.v, 2);
    }
}

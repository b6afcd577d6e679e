//! Prometheus exporter arguments.

use crate::{CliResult, init_prometheus_server};
use clap::Args;
use std::net::{IpAddr, Ipv4Addr};

/// Prometheus exporter arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(id = "metrics_enabled", long = "metrics.enabled", env = "SWAPWATCH_METRICS_ENABLED")]
    pub enabled: bool,
    /// Address the metrics server binds to.
    #[arg(
        id = "metrics_addr",
        long = "metrics.addr",
        default_value = "0.0.0.0",
        env = "SWAPWATCH_METRICS_ADDR"
    )]
    pub addr: IpAddr,
    /// Port the metrics server binds to.
    #[arg(
        id = "metrics_port",
        long = "metrics.port",
        default_value_t = 9090,
        env = "SWAPWATCH_METRICS_PORT"
    )]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the exporter if enabled.
    pub fn init_metrics(&self) -> CliResult<()> {
        if self.enabled {
            init_prometheus_server(self.addr, self.port)?;
        }
        Ok(())
    }
}

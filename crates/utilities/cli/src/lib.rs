//! Shared CLI utilities: logging setup, metrics exporter and clap styling.

mod styles;
pub use styles::cli_styles;

pub mod backtrace;

mod error;
pub use error::{CliError, CliResult, PrometheusError};

pub mod log;
pub use log::init_tracing_subscriber;

pub mod metrics_args;

mod prometheus;
pub use prometheus::init_prometheus_server;

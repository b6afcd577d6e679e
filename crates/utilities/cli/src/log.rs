//! Logging arguments and subscriber setup.

use crate::{CliError, CliResult};
use clap::{ArgAction, Args};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging arguments.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level: unset logs at info, `-v` at debug, `-vv` at trace.
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub v: u8,
}

impl LogArgs {
    /// Returns the default level for this verbosity.
    pub const fn level(&self) -> LevelFilter {
        match self.v {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global fmt subscriber.
///
/// With no explicit `env_filter`, directives come from `RUST_LOG` on top of a
/// default level derived from `verbosity`.
pub fn init_tracing_subscriber(
    verbosity: u8,
    env_filter: Option<impl Into<EnvFilter>>,
) -> CliResult<()> {
    let level = LogArgs { v: verbosity }.level();
    let filter = match env_filter {
        Some(filter) => filter.into(),
        None => EnvFilter::builder().with_default_directive(level.into()).from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| CliError::Tracing(err.to_string()))
}

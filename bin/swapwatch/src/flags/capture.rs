use chrono::{DateTime, NaiveDate};
use clap::Args;
use std::time::Duration;
use swapwatch_core::{CaptureConfig, FollowerConfig};

/// Capture engine arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CaptureArgs {
    /// Oldest block timestamp to backfill: `YYYY-MM-DD`, RFC 3339, or unix seconds.
    #[arg(
        long,
        env = "SWAPWATCH_HISTORY_CUTOFF",
        default_value = "2023-12-10",
        value_parser = parse_cutoff
    )]
    pub history_cutoff: u64,
    /// Seconds between repair sweeps.
    #[arg(long, env = "SWAPWATCH_REPAIR_INTERVAL", default_value_t = 1)]
    pub repair_interval: u64,
    /// Seconds before the history backfill retries a failed fetch.
    #[arg(long, env = "SWAPWATCH_BACKFILL_RETRY_DELAY", default_value_t = 1)]
    pub backfill_retry_delay: u64,
    /// Seconds added to the wait before each head subscription retry.
    #[arg(long, env = "SWAPWATCH_SUBSCRIBE_BACKOFF", default_value_t = 10)]
    pub subscribe_backoff: u64,
    /// Head subscription retries before giving up.
    #[arg(long, env = "SWAPWATCH_SUBSCRIBE_RETRIES", default_value_t = 3)]
    pub subscribe_retries: u32,
    /// Record pending transaction hashes.
    #[arg(long = "pending-txs", env = "SWAPWATCH_PENDING_TXS")]
    pub pending_transactions: bool,
}

impl CaptureArgs {
    /// Returns the [`CaptureConfig`] described by these arguments.
    pub const fn config(&self) -> CaptureConfig {
        CaptureConfig {
            history_cutoff: self.history_cutoff,
            backfill_retry_delay: Duration::from_secs(self.backfill_retry_delay),
            repair_interval: Duration::from_secs(self.repair_interval),
            follower: FollowerConfig {
                max_retries: self.subscribe_retries,
                backoff_step: Duration::from_secs(self.subscribe_backoff),
            },
            pending_transactions: self.pending_transactions,
        }
    }
}

/// Parses a history cutoff into unix seconds.
///
/// Accepts unix seconds, an RFC 3339 timestamp, or a `YYYY-MM-DD` date taken
/// as midnight UTC.
pub fn parse_cutoff(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Ok(seconds);
    }

    let seconds = if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        timestamp.timestamp()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid cutoff date `{raw}`"))?
            .and_utc()
            .timestamp()
    } else {
        return Err(format!(
            "invalid cutoff `{raw}`: expected YYYY-MM-DD, RFC 3339, or unix seconds"
        ));
    };

    u64::try_from(seconds).map_err(|_| format!("cutoff `{raw}` is before the unix epoch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use swapwatch_core::DEFAULT_HISTORY_CUTOFF;

    #[rstest]
    #[case("2023-12-10", Ok(DEFAULT_HISTORY_CUTOFF))]
    #[case(" 2023-12-10 ", Ok(DEFAULT_HISTORY_CUTOFF))]
    #[case("2023-12-10T00:00:00Z", Ok(DEFAULT_HISTORY_CUTOFF))]
    #[case("2023-12-10T08:00:00+08:00", Ok(DEFAULT_HISTORY_CUTOFF))]
    #[case("1702166400", Ok(1_702_166_400))]
    #[case("0", Ok(0))]
    fn test_parse_cutoff(#[case] raw: &str, #[case] expected: Result<u64, String>) {
        assert_eq!(parse_cutoff(raw), expected);
    }

    #[rstest]
    #[case("yesterday")]
    #[case("2023-13-01")]
    #[case("1960-01-01")]
    #[case("")]
    fn test_parse_cutoff_rejects(#[case] raw: &str) {
        assert!(parse_cutoff(raw).is_err());
    }
}

//! Metrics recorded by the capture tasks.

use crate::CaptureError;
use std::sync::Arc;
use swapwatch_types::Block;

/// Container for the capture engine's metric names and recording helpers.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the counter of captured blocks, labelled by source.
    pub const BLOCKS_CAPTURED_TOTAL: &'static str = "swapwatch_blocks_captured_total";
    /// Identifier for the counter of failed captures, labelled by source.
    pub const CAPTURE_ERRORS_TOTAL: &'static str = "swapwatch_capture_errors_total";
    /// Identifier for the counter of indexed watched-address transactions.
    pub const TRANSACTIONS_MATCHED_TOTAL: &'static str = "swapwatch_transactions_matched_total";
    /// Identifier for the counter of forward gaps detected by the head follower.
    pub const GAPS_DETECTED_TOTAL: &'static str = "swapwatch_gaps_detected_total";
    /// Identifier for the counter of gaps left to a later head because a
    /// recapture task was already running.
    pub const GAPS_DEFERRED_TOTAL: &'static str = "swapwatch_gaps_deferred_total";
    /// Identifier for the counter of blocks recaptured by the repair sweep.
    pub const REPAIR_BLOCKS_TOTAL: &'static str = "swapwatch_repair_blocks_total";
    /// Identifier for the counter of head subscription retries.
    pub const HEAD_SUBSCRIPTION_RETRIES_TOTAL: &'static str =
        "swapwatch_head_subscription_retries_total";
    /// Identifier for the gauge of the head follower's cursor.
    pub const FOLLOWER_CURSOR: &'static str = "swapwatch_follower_cursor";

    /// Capture sources used as the `source` label.
    pub const SOURCES: [&'static str; 4] =
        [Self::SOURCE_BACKFILL, Self::SOURCE_FOLLOWER, Self::SOURCE_GAP, Self::SOURCE_REPAIR];
    /// Blocks captured by the history backfill.
    pub const SOURCE_BACKFILL: &'static str = "backfill";
    /// Blocks captured from the new-head stream.
    pub const SOURCE_FOLLOWER: &'static str = "follower";
    /// Blocks captured by the follower's gap recapture task.
    pub const SOURCE_GAP: &'static str = "gap";
    /// Blocks captured by the repair sweep.
    pub const SOURCE_REPAIR: &'static str = "repair";

    /// Initializes metrics for the capture engine.
    ///
    /// This does two things:
    /// * Describes the metrics.
    /// * Initializes the metrics to 0 so they can be queried immediately.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::BLOCKS_CAPTURED_TOTAL,
            metrics::Unit::Count,
            "Total number of blocks written to the block index",
        );
        metrics::describe_counter!(
            Self::CAPTURE_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Total number of failed block captures",
        );
        metrics::describe_counter!(
            Self::TRANSACTIONS_MATCHED_TOTAL,
            metrics::Unit::Count,
            "Total number of watched-address transactions written to the transaction index",
        );
        metrics::describe_counter!(
            Self::GAPS_DETECTED_TOTAL,
            metrics::Unit::Count,
            "Total number of forward gaps detected on the new-head stream",
        );
        metrics::describe_counter!(
            Self::GAPS_DEFERRED_TOTAL,
            metrics::Unit::Count,
            "Total number of gaps deferred while a recapture task was running",
        );
        metrics::describe_counter!(
            Self::REPAIR_BLOCKS_TOTAL,
            metrics::Unit::Count,
            "Total number of holes filled by the repair sweep",
        );
        metrics::describe_counter!(
            Self::HEAD_SUBSCRIPTION_RETRIES_TOTAL,
            metrics::Unit::Count,
            "Total number of head subscription retries",
        );
        metrics::describe_gauge!(
            Self::FOLLOWER_CURSOR,
            "Highest block number up to which the head follower has no gaps",
        );
    }

    fn zero() {
        for source in Self::SOURCES {
            metrics::counter!(Self::BLOCKS_CAPTURED_TOTAL, "source" => source).increment(0);
            metrics::counter!(Self::CAPTURE_ERRORS_TOTAL, "source" => source).increment(0);
        }
        metrics::counter!(Self::TRANSACTIONS_MATCHED_TOTAL).increment(0);
        metrics::counter!(Self::GAPS_DETECTED_TOTAL).increment(0);
        metrics::counter!(Self::GAPS_DEFERRED_TOTAL).increment(0);
        metrics::counter!(Self::REPAIR_BLOCKS_TOTAL).increment(0);
        metrics::counter!(Self::HEAD_SUBSCRIPTION_RETRIES_TOTAL).increment(0);
        metrics::gauge!(Self::FOLLOWER_CURSOR).set(0.0);
    }

    /// Records the outcome of a single block capture.
    pub(crate) fn record_capture(source: &'static str, result: &Result<Arc<Block>, CaptureError>) {
        match result {
            Ok(_) => Self::record_captured(source),
            Err(_) => Self::record_capture_error(source),
        }
    }

    pub(crate) fn record_captured(source: &'static str) {
        metrics::counter!(Self::BLOCKS_CAPTURED_TOTAL, "source" => source).increment(1);
    }

    pub(crate) fn record_capture_error(source: &'static str) {
        metrics::counter!(Self::CAPTURE_ERRORS_TOTAL, "source" => source).increment(1);
    }

    pub(crate) fn record_matched(count: u64) {
        if count > 0 {
            metrics::counter!(Self::TRANSACTIONS_MATCHED_TOTAL).increment(count);
        }
    }

    pub(crate) fn record_cursor(cursor: u64) {
        metrics::gauge!(Self::FOLLOWER_CURSOR).set(cursor as f64);
    }
}

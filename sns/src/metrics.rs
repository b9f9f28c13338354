//! Search observability metrics
//!
//! Prometheus-compatible counters and histograms for:
//! - Repository operations (ok/error per operation)
//! - Engine round-trip latency per index family
//! - Decode fallbacks and skipped enrichment stages

use std::time::Duration;

/// Record engine round-trip time
pub fn record_search_duration(index_kind: &str, duration: Duration) {
    metrics::histogram!(
        "sns_search_duration_seconds",
        "index_kind" => index_kind.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record the engine's total hit count for one search
pub fn record_search_hits(index_kind: &str, hits: u64) {
    metrics::histogram!(
        "sns_search_hits_total",
        "index_kind" => index_kind.to_string(),
    )
    .record(hits as f64);
}

/// Record a completed repository operation
pub fn record_operation_success(operation: &str) {
    metrics::counter!(
        "sns_search_requests_total",
        "operation" => operation.to_string(),
        "status" => "ok",
    )
    .increment(1);
}

/// Record a failed repository operation
pub fn record_operation_error(operation: &str, error_type: &str) {
    metrics::counter!(
        "sns_search_requests_total",
        "operation" => operation.to_string(),
        "status" => "error",
    )
    .increment(1);

    metrics::counter!(
        "sns_search_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record a timestamp replaced by the fallback value
pub fn record_timestamp_fallback(record: &str) {
    metrics::counter!(
        "sns_decode_timestamp_fallback_total",
        "record" => record.to_string(),
    )
    .increment(1);
}

/// Record a second stage skipped because the first stage produced no keys
pub fn record_enrichment_skipped(flow: &str) {
    metrics::counter!(
        "sns_enrichment_skipped_total",
        "flow" => flow.to_string(),
    )
    .increment(1);
}

/// Record a second stage that failed after a successful first stage
pub fn record_enrichment_failed(flow: &str) {
    metrics::counter!(
        "sns_enrichment_failed_total",
        "flow" => flow.to_string(),
    )
    .increment(1);
}

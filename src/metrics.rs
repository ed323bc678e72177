//! Prometheus metrics for latency tracking and monitoring.
//!
//! Covers:
//! - HTTP request latency per endpoint
//! - Database query latency per query name
//! - Land analysis latency and volume
//! - Statistics range cache hit rate

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::{AppError, Result};

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Database query latency metric name.
pub const METRIC_DB_QUERY_LATENCY: &str = "db_query_latency_ms";
/// Land analysis latency metric name.
pub const METRIC_LAND_ANALYSIS_LATENCY: &str = "land_analysis_latency_ms";
/// Analysis requests counter metric name.
pub const METRIC_LAND_ANALYSIS_REQUESTS: &str = "land_analysis_requests_total";
/// Lands scored counter metric name.
pub const METRIC_LANDS_SCORED: &str = "lands_scored_total";
/// Range cache hits counter metric name.
pub const METRIC_RANGE_CACHE_HITS: &str = "range_cache_hits_total";
/// Range cache misses counter metric name.
pub const METRIC_RANGE_CACHE_MISSES: &str = "range_cache_misses_total";
/// Score calculator failures counter metric name.
pub const METRIC_SCORE_CALCULATOR_FAILURES: &str = "score_calculator_failures_total";

/// Install the Prometheus recorder and return the handle used by `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Metrics(e.to_string()))
}

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    // Latency histograms
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_DB_QUERY_LATENCY,
        "Database query latency in milliseconds"
    );
    describe_histogram!(
        METRIC_LAND_ANALYSIS_LATENCY,
        "End-to-end land analysis latency in milliseconds"
    );

    // Counters
    describe_counter!(
        METRIC_LAND_ANALYSIS_REQUESTS,
        "Total number of land analysis requests"
    );
    describe_counter!(METRIC_LANDS_SCORED, "Total number of lands scored");
    describe_counter!(
        METRIC_RANGE_CACHE_HITS,
        "Statistics range lookups served from cache"
    );
    describe_counter!(
        METRIC_RANGE_CACHE_MISSES,
        "Statistics range lookups that went to the database"
    );
    describe_counter!(
        METRIC_SCORE_CALCULATOR_FAILURES,
        "Score calculations that failed and were scored as zero"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Record database query latency.
pub fn record_db_latency(start: Instant, query: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DB_QUERY_LATENCY, "query" => query).record(latency_ms);
}

/// Increment land analysis requests counter.
pub fn inc_analysis_requests() {
    counter!(METRIC_LAND_ANALYSIS_REQUESTS).increment(1);
}

/// Add to the lands scored counter.
pub fn add_lands_scored(count: u64) {
    counter!(METRIC_LANDS_SCORED).increment(count);
}

/// Increment range cache hits counter.
pub fn inc_range_cache_hits() {
    counter!(METRIC_RANGE_CACHE_HITS).increment(1);
}

/// Increment range cache misses counter.
pub fn inc_range_cache_misses() {
    counter!(METRIC_RANGE_CACHE_MISSES).increment(1);
}

/// Increment score calculator failures counter.
pub fn inc_score_calculator_failures(calculator: &'static str) {
    counter!(METRIC_SCORE_CALCULATOR_FAILURES, "calculator" => calculator).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a land analysis run.
pub fn timer_land_analysis() -> LatencyTimer {
    LatencyTimer::new(METRIC_LAND_ANALYSIS_LATENCY)
}

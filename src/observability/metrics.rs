//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trestle_requests_total` (counter): requests by method, status, route
//! - `trestle_request_duration_seconds` (histogram): latency distribution
//! - `trestle_requests_blocked_total` (counter): access-control rejections by reason
//! - `trestle_hook_failures_total` (counter): hook rejections by code
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Route label is the registered pattern, never the concrete path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "trestle_requests_total";
pub const REQUEST_DURATION: &str = "trestle_request_duration_seconds";
pub const REQUESTS_BLOCKED: &str = "trestle_requests_blocked_total";
pub const HOOK_FAILURES: &str = "trestle_hook_failures_total";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_blocked(reason: &'static str) {
    metrics::counter!(REQUESTS_BLOCKED, "reason" => reason).increment(1);
}

pub fn record_hook_failure(code: &str) {
    metrics::counter!(HOOK_FAILURES, "code" => code.to_string()).increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shim_requests_total` (counter): requests by method and status
//! - `shim_request_duration_seconds` (histogram): end-to-end latency
//! - `shim_normalize_events_total` (counter): pipeline changes by kind
//! - `shim_upstream_errors_total` (counter): failed upstream calls

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`. Must be called from within a
/// Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("shim_requests_total", &labels).increment(1);
    metrics::histogram!("shim_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one normalization change.
pub fn record_normalize_event(kind: &'static str) {
    metrics::counter!("shim_normalize_events_total", "event" => kind).increment(1);
}

pub fn record_upstream_error() {
    metrics::counter!("shim_upstream_errors_total").increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_requests_total` (counter): resolved requests by rule, origin, status
//! - `redirect_lookup_total` (counter): record lookups by outcome
//! - `redirect_lookup_duration_seconds` (histogram): record lookup latency
//!
//! # Design Decisions
//! - Labels are low-cardinality: rule names and origins are fixed sets
//! - Exporter failure is logged, never fatal

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "redirect_requests_total";
pub const LOOKUP_TOTAL: &str = "redirect_lookup_total";
pub const LOOKUP_DURATION: &str = "redirect_lookup_duration_seconds";

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one answered request.
pub fn record_redirect(rule: &'static str, origin: &'static str, status: u16) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "rule" => rule,
        "origin" => origin,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Count one record lookup and its latency.
pub fn record_lookup(outcome: &'static str, started: Instant) {
    metrics::counter!(LOOKUP_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(LOOKUP_DURATION).record(started.elapsed().as_secs_f64());
}

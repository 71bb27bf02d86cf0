//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by verdict, method, status
//! - `gateway_request_duration_seconds` (histogram): time to response head, by verdict
//! - `gateway_upstream_errors_total` (counter): failed upstream hops by kind
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::Verdict;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(verdict: Verdict, method: &Method, status: StatusCode, start_time: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "verdict" => verdict.as_str(),
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "verdict" => verdict.as_str()
    )
    .record(start_time.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `git_overload_responses_total` (counter): busy responses sent, by operation
//! - `git_backend_errors_total` (counter): failed backend calls, by status code

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::git::GitOperation;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a busy response delivered to a Git client.
pub fn record_overload_response(operation: GitOperation) {
    metrics::counter!("git_overload_responses_total", "operation" => operation.service()).increment(1);
}

/// Count a failed backend call.
pub fn record_backend_error(code: &'static str) {
    metrics::counter!("git_backend_errors_total", "code" => code).increment(1);
}

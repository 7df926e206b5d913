//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_connections_accepted_total` (counter)
//! - `proxy_active_connections` (gauge)
//! - `proxy_accept_errors_total` (counter): by error kind
//! - `proxy_requests_total` (counter): by method, status
//! - `proxy_request_duration_seconds` (histogram)
//! - `proxy_shutdown_signals_total` (counter): by signal
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so the server runs the same with metrics disabled.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint enabled");
    Ok(())
}

pub fn record_connection_opened() {
    metrics::counter!("proxy_connections_accepted_total").increment(1);
    metrics::gauge!("proxy_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("proxy_active_connections").decrement(1.0);
}

pub fn record_accept_error(kind: std::io::ErrorKind) {
    metrics::counter!("proxy_accept_errors_total", "kind" => format!("{kind:?}")).increment(1);
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_shutdown_signal(signal: &'static str) {
    metrics::counter!("proxy_shutdown_signals_total", "signal" => signal).increment(1);
}

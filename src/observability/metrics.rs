//! Metrics collection and exposition.
//!
//! # Metrics
//! - `responder_requests_total` (counter): requests by status code
//! - `responder_request_duration_seconds` (histogram): handler latency
//! - `responder_handshake_failures_total` (counter): failed or timed out TLS handshakes
//!
//! Recording is a no-op until a recorder is installed, so the exporter is
//! optional.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "responder_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "responder_request_duration_seconds";
pub const HANDSHAKE_FAILURES_TOTAL: &str = "responder_handshake_failures_total";

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, start_time: Instant) {
    counter!(REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
    histogram!(REQUEST_DURATION_SECONDS).record(start_time.elapsed().as_secs_f64());
}

pub fn record_handshake_failure() {
    counter!(HANDSHAKE_FAILURES_TOTAL).increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `waymark_requests_total` (counter): responses by handler, status
//! - `waymark_request_duration_seconds` (histogram): dispatch latency
//! - `waymark_access_denied_total` (counter): refusals by verdict
//! - `waymark_commands_total` (counter): command runs by command, outcome
//! - `waymark_command_duration_seconds` (histogram): command run time
//! - `waymark_rate_limited_total` (counter): throttled requests
//!
//! # Design Decisions
//! - Unmatched requests are labelled `handler="none"`
//! - The exporter serves its own listener, separate from site traffic

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(handler: Option<&str>, status: u16, start: Instant) {
    let handler = handler.unwrap_or("none").to_string();
    counter!(
        "waymark_requests_total",
        "handler" => handler,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("waymark_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_access_denied(verdict: &'static str) {
    counter!("waymark_access_denied_total", "verdict" => verdict).increment(1);
}

pub fn record_command(command: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "waymark_commands_total",
        "command" => command.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("waymark_command_duration_seconds", "command" => command.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("waymark_rate_limited_total", "reason" => reason).increment(1);
}

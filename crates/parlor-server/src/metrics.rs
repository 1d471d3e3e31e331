//! Metrics collection and export for Parlor.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

/// Metric names.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "parlor_requests_total";
    pub const LATENCY_SECONDS: &str = "parlor_request_latency_seconds";
    pub const REGISTRATIONS_TOTAL: &str = "parlor_registrations_total";
    pub const PARTICIPANTS_ACTIVE: &str = "parlor_participants_active";
    pub const HEARTBEATS_TOTAL: &str = "parlor_heartbeats_total";
    pub const MESSAGES_TOTAL: &str = "parlor_messages_total";
    pub const EVICTIONS_TOTAL: &str = "parlor_evictions_total";
    pub const ERRORS_TOTAL: &str = "parlor_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(names::REQUESTS_TOTAL, "Total number of HTTP requests");
    metrics::describe_histogram!(
        names::LATENCY_SECONDS,
        "Request processing latency in seconds"
    );
    metrics::describe_counter!(
        names::REGISTRATIONS_TOTAL,
        "Total number of successful registrations"
    );
    metrics::describe_gauge!(
        names::PARTICIPANTS_ACTIVE,
        "Participants registered and not yet evicted"
    );
    metrics::describe_counter!(names::HEARTBEATS_TOTAL, "Total number of accepted heartbeats");
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of messages posted");
    metrics::describe_counter!(
        names::EVICTIONS_TOTAL,
        "Total number of participants evicted for inactivity"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of failed operations");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a successful registration.
pub fn record_registration() {
    counter!(names::REGISTRATIONS_TOTAL).increment(1);
    gauge!(names::PARTICIPANTS_ACTIVE).increment(1.0);
}

/// Record participants evicted by a sweep.
pub fn record_evictions(count: usize) {
    if count == 0 {
        return;
    }
    counter!(names::EVICTIONS_TOTAL).increment(count as u64);
    gauge!(names::PARTICIPANTS_ACTIVE).decrement(count as f64);
}

/// Record an accepted heartbeat.
pub fn record_heartbeat() {
    counter!(names::HEARTBEATS_TOTAL).increment(1);
}

/// Record a posted message.
pub fn record_message(kind: &str) {
    counter!(names::MESSAGES_TOTAL, "type" => kind.to_string()).increment(1);
}

/// Record a failed operation.
pub fn record_error(error_type: &str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type.to_string()).increment(1);
}

/// Middleware recording request count and latency per route.
///
/// Install with `route_layer` so the matched route template is known.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(
        names::REQUESTS_TOTAL,
        "method" => method,
        "path" => path,
        "status" => status
    )
    .increment(1);
    histogram!(names::LATENCY_SECONDS).record(start.elapsed().as_secs_f64());

    response
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `task_service_requests_total` (counter): requests by method, status, route
//! - `task_service_request_duration_seconds` (histogram): latency by method, route
//! - `task_service_store_operations_total` (counter): store mutations by op, outcome
//! - `task_service_store_records` (gauge): records per table
//! - `task_service_persist_writes_total` (counter): snapshot writes by outcome
//! - `task_service_persist_duration_seconds` (histogram): snapshot write latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - The Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "task_service_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "task_service_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a store mutation.
pub fn record_store_operation(op: &'static str, outcome: &'static str) {
    metrics::counter!("task_service_store_operations_total", "op" => op, "outcome" => outcome).increment(1);
}

/// Record the current size of a table.
pub fn record_table_size(table: &str, len: usize) {
    metrics::gauge!("task_service_store_records", "table" => table.to_string()).set(len as f64);
}

/// Record a snapshot write.
pub fn record_persist(outcome: &'static str, start: Instant) {
    metrics::counter!("task_service_persist_writes_total", "outcome" => outcome).increment(1);
    metrics::histogram!("task_service_persist_duration_seconds").record(start.elapsed().as_secs_f64());
}

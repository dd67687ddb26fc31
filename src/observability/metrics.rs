//! Metrics collection and exposition.
//!
//! # Metrics
//! - `knockgate_knocks_total` (counter): knocks observed, by decoy port
//! - `knockgate_sequences_total` (counter): attempt outcomes, by result
//! - `knockgate_grants_total` (counter): firewall exceptions issued
//!
//! # Design Decisions
//! - Low-overhead updates (atomic counters behind the metrics facade)
//! - Prometheus endpoint is opt-in via config; recording works either way

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::knock::KnockOutcome;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Count one knock on a decoy port.
pub fn record_knock(port: u16) {
    metrics::counter!("knockgate_knocks_total", "port" => port.to_string()).increment(1);
}

/// Count the outcome of one recorded knock.
pub fn record_outcome(outcome: &KnockOutcome) {
    let result = match outcome {
        KnockOutcome::Pending { .. } => "pending",
        KnockOutcome::Completed => "completed",
        KnockOutcome::Rejected { .. } => "rejected",
    };
    metrics::counter!("knockgate_sequences_total", "result" => result).increment(1);
}

/// Count one issued grant.
pub fn record_grant() {
    metrics::counter!("knockgate_grants_total").increment(1);
}

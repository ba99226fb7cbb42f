//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define watchdog metrics (signals, probes, recoveries, failovers)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `watchdog_signals_total` (counter): failure signals by class, outcome
//! - `watchdog_probe_total` (counter): liveness probes by provider, result
//! - `watchdog_recoveries_total` (counter): completed recoveries by class, provider
//! - `watchdog_failovers_total` (counter): candidate switches by target provider
//! - `watchdog_active_provider` (gauge): 0=primary, 1=fallback
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are static strings only

use std::net::SocketAddr;

use crate::provider::ProviderRole;

/// Install the Prometheus exporter and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a failure signal and what the supervisor did with it.
pub fn record_signal(class: &'static str, outcome: &'static str) {
    metrics::counter!("watchdog_signals_total", "class" => class, "outcome" => outcome).increment(1);
}

/// Record a single liveness probe.
pub fn record_probe(provider: ProviderRole, healthy: bool) {
    let result = if healthy { "ok" } else { "error" };
    metrics::counter!("watchdog_probe_total", "provider" => provider.as_str(), "result" => result).increment(1);
}

/// Record a completed recovery.
pub fn record_recovery(class: &'static str, provider: ProviderRole) {
    metrics::counter!("watchdog_recoveries_total", "class" => class, "provider" => provider.as_str()).increment(1);
}

/// Record a switch of failover candidate.
pub fn record_failover(to: ProviderRole) {
    metrics::counter!("watchdog_failovers_total", "to" => to.as_str()).increment(1);
}

/// Publish which endpoint is currently active.
pub fn set_active_provider(role: ProviderRole) {
    let value = match role {
        ProviderRole::Primary => 0.0,
        ProviderRole::Fallback => 1.0,
    };
    metrics::gauge!("watchdog_active_provider").set(value);
}

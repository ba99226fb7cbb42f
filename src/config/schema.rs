//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watchdog.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the chain watchdog.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatchdogConfig {
    /// JSON-RPC endpoints (primary + optional fallback).
    pub providers: ProvidersConfig,

    /// Recovery probing and failover settings.
    pub recovery: RecoveryConfig,

    /// Bundled block listener settings.
    pub listener: ListenerConfig,

    /// Error pre-filter used when callers report opaque errors.
    pub classifier: ClassifierConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Primary JSON-RPC endpoint URL.
    pub primary_url: String,

    /// Fallback JSON-RPC endpoint URL. Failover is disabled when absent.
    pub fallback_url: Option<String>,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            primary_url: "http://localhost:8545".to_string(),
            fallback_url: None,
            rpc_timeout_secs: 10,
        }
    }
}

/// Recovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Delay between two liveness probes in milliseconds.
    pub poll_interval_ms: u64,

    /// Consecutive successful probes required to declare recovery.
    pub success_threshold: u32,

    /// Consecutive failed probes after which a failover candidate is abandoned.
    pub failure_threshold: u32,

    /// Time spent on the fallback before forcing a return to the primary.
    pub return_to_primary_delay_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            success_threshold: 5,
            failure_threshold: 5,
            return_to_primary_delay_secs: 60,
        }
    }
}

/// Bundled block listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Head polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Consecutive polling errors before a crash is reported.
    pub crash_after_errors: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4000,
            crash_after_errors: 3,
        }
    }
}

/// Error classification markers (case-insensitive substrings).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Errors containing one of these are provider crashes.
    /// An empty list treats every reported error as a crash.
    pub crash_markers: Vec<String>,

    /// Errors containing one of these are transaction registry failures.
    pub registry_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            crash_markers: Vec::new(),
            registry_markers: vec!["tx registry".to_string(), "txregistry".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: WatchdogConfig = toml::from_str("").unwrap();
        assert_eq!(config.recovery.poll_interval_ms, 2000);
        assert_eq!(config.recovery.success_threshold, 5);
        assert_eq!(config.recovery.failure_threshold, 5);
        assert_eq!(config.recovery.return_to_primary_delay_secs, 60);
        assert!(config.providers.fallback_url.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: WatchdogConfig = toml::from_str(
            r#"
            [providers]
            primary_url = "https://primary.example"
            fallback_url = "https://fallback.example"

            [recovery]
            return_to_primary_delay_secs = 1800
            "#,
        )
        .unwrap();
        assert_eq!(config.providers.fallback_url.as_deref(), Some("https://fallback.example"));
        assert_eq!(config.providers.rpc_timeout_secs, 10);
        assert_eq!(config.recovery.return_to_primary_delay_secs, 1800);
        assert_eq!(config.recovery.success_threshold, 5);
    }
}

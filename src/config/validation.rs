//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals, thresholds, timeouts > 0)
//! - Check endpoint URLs parse and primary/fallback differ
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WatchdogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::WatchdogConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("fallback_url must differ from primary_url")]
    SameEndpoint,

    #[error("metrics_address is not a socket address: {0}")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &WatchdogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let non_zero: [(&'static str, u64); 6] = [
        ("providers.rpc_timeout_secs", config.providers.rpc_timeout_secs),
        ("recovery.poll_interval_ms", config.recovery.poll_interval_ms),
        ("recovery.success_threshold", config.recovery.success_threshold.into()),
        ("recovery.failure_threshold", config.recovery.failure_threshold.into()),
        ("listener.poll_interval_ms", config.listener.poll_interval_ms),
        ("listener.crash_after_errors", config.listener.crash_after_errors.into()),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let primary = url::Url::parse(&config.providers.primary_url);
    if primary.is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "providers.primary_url",
            value: config.providers.primary_url.clone(),
        });
    }

    if let Some(fallback_url) = &config.providers.fallback_url {
        match url::Url::parse(fallback_url) {
            Ok(fallback) => {
                if primary.as_ref().is_ok_and(|p| *p == fallback) {
                    errors.push(ValidationError::SameEndpoint);
                }
            }
            Err(_) => errors.push(ValidationError::InvalidUrl {
                field: "providers.fallback_url",
                value: fallback_url.clone(),
            }),
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Build provider handles from configuration
//! - Wire the signal channel between listener and supervisor
//! - Hand back a supervisor ready to `run`
//!
//! # Design Decisions
//! - Fail fast: a bad endpoint URL is fatal at startup, never afterwards
//! - Nothing touches the network here; the first RPC happens inside `run`

use std::sync::Arc;
use std::time::Duration;

use crate::config::WatchdogConfig;
use crate::listener::BlockPoller;
use crate::provider::{ProviderHandle, ProviderPair, ProviderResult, ProviderRole};
use crate::supervisor::{signal, MarkerClassifier, Supervisor};

/// Build provider handles for the configured endpoints.
pub fn build_providers(config: &WatchdogConfig) -> ProviderResult<ProviderPair> {
    let timeout = Duration::from_secs(config.providers.rpc_timeout_secs);
    let primary = ProviderHandle::connect(ProviderRole::Primary, &config.providers.primary_url, timeout)?;
    let fallback = config
        .providers
        .fallback_url
        .as_deref()
        .map(|url| ProviderHandle::connect(ProviderRole::Fallback, url, timeout))
        .transpose()?;
    Ok(ProviderPair::new(primary, fallback))
}

/// Assemble providers, listener and supervisor.
pub fn build(config: &WatchdogConfig) -> ProviderResult<Supervisor<BlockPoller>> {
    let providers = build_providers(config)?;
    if !providers.has_fallback() {
        tracing::warn!("No fallback_url configured, failover disabled");
    }

    let classifier = Arc::new(MarkerClassifier::new(&config.classifier));
    let (signals, inbox) = signal::channel(classifier);
    let listener = BlockPoller::new(config.listener.clone(), signals);

    Ok(Supervisor::new(config.recovery.clone(), providers, listener, inbox))
}

//! JSON-RPC endpoint handles with a liveness probe.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint over HTTP
//! - Query the latest block number with a per-call timeout
//! - Expose `probe()`: any failure means "unhealthy", no subtypes

use std::sync::Arc;
use std::time::Duration;

use alloy::providers::{Provider, ProviderBuilder};
use futures_util::future::BoxFuture;
use tokio::time::timeout;
use url::Url;

use crate::observability::metrics;
use crate::provider::types::{ProviderError, ProviderResult, ProviderRole};

/// Anything that can answer "what is the latest block number".
pub trait BlockNumberSource: Send + Sync {
    fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>>;
}

/// `eth_blockNumber` over an alloy HTTP provider.
pub struct RpcSource {
    provider: Arc<dyn Provider + Send + Sync>,
    timeout_duration: Duration,
}

impl RpcSource {
    pub fn connect(url: Url, timeout_duration: Duration) -> Self {
        let provider = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;
        Self {
            provider,
            timeout_duration,
        }
    }
}

impl BlockNumberSource for RpcSource {
    fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>> {
        Box::pin(async move {
            match timeout(self.timeout_duration, self.provider.get_block_number()).await {
                Ok(Ok(block)) => Ok(block),
                Ok(Err(e)) => Err(ProviderError::Rpc(e.to_string())),
                Err(_) => Err(ProviderError::Timeout(self.timeout_duration.as_secs())),
            }
        })
    }
}

/// A single JSON-RPC endpoint. Immutable after construction, cheap to clone.
#[derive(Clone)]
pub struct ProviderHandle {
    role: ProviderRole,
    endpoint: Url,
    source: Arc<dyn BlockNumberSource>,
}

impl ProviderHandle {
    /// Build a handle backed by an HTTP JSON-RPC provider.
    pub fn connect(role: ProviderRole, endpoint: &str, timeout_duration: Duration) -> ProviderResult<Self> {
        let url: Url = endpoint.parse().map_err(|e: url::ParseError| ProviderError::InvalidUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let source = Arc::new(RpcSource::connect(url.clone(), timeout_duration));
        Ok(Self::with_source(role, url, source))
    }

    /// Build a handle around an arbitrary block number source.
    pub fn with_source(role: ProviderRole, endpoint: Url, source: Arc<dyn BlockNumberSource>) -> Self {
        Self {
            role,
            endpoint,
            source,
        }
    }

    pub fn role(&self) -> ProviderRole {
        self.role
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the latest block number.
    pub async fn block_number(&self) -> ProviderResult<u64> {
        self.source.block_number().await
    }

    /// Liveness probe. Side-effect free.
    pub async fn probe(&self) -> ProviderResult<()> {
        let result = self.block_number().await;
        metrics::record_probe(self.role, result.is_ok());
        match result {
            Ok(block) => {
                tracing::trace!(provider = %self.role, block, "Probe succeeded");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(provider = %self.role, error = %e, "Probe failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("role", &self.role)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

/// The primary endpoint plus an optional fallback.
#[derive(Debug, Clone)]
pub struct ProviderPair {
    primary: ProviderHandle,
    fallback: Option<ProviderHandle>,
}

impl ProviderPair {
    pub fn new(primary: ProviderHandle, fallback: Option<ProviderHandle>) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &ProviderHandle {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&ProviderHandle> {
        self.fallback.as_ref()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Handle for `role`. Without a fallback configured every role maps to the primary.
    pub fn get(&self, role: ProviderRole) -> &ProviderHandle {
        match role {
            ProviderRole::Primary => &self.primary,
            ProviderRole::Fallback => self.fallback.as_ref().unwrap_or(&self.primary),
        }
    }
}

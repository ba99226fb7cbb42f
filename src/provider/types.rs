//! Provider roles and error definitions.

use thiserror::Error;

/// Which of the two configured endpoints a handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRole {
    Primary,
    Fallback,
}

impl ProviderRole {
    /// The opposite endpoint.
    pub fn other(self) -> Self {
        match self {
            ProviderRole::Primary => ProviderRole::Fallback,
            ProviderRole::Fallback => ProviderRole::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderRole::Primary => "primary",
            ProviderRole::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to a JSON-RPC endpoint.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Endpoint URL could not be parsed.
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

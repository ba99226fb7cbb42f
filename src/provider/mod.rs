//! JSON-RPC provider subsystem.
//!
//! # Data Flow
//! ```text
//! Config (primary_url, fallback_url, rpc_timeout_secs)
//!     → handle.rs (ProviderHandle per endpoint)
//!     → supervisor probes liveness via eth_blockNumber
//!     → listener follows chain head on the active handle
//! ```
//!
//! # Design Decisions
//! - Every RPC call has a deadline
//! - Probes never classify errors; any failure is "unhealthy"
//! - Handles are immutable; switching endpoints means switching handles

pub mod handle;
pub mod types;

pub use handle::{BlockNumberSource, ProviderHandle, ProviderPair, RpcSource};
pub use types::{ProviderError, ProviderResult, ProviderRole};

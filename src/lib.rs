//! Chain watchdog library.
//!
//! Keeps a blockchain event listener alive across JSON-RPC provider outages:
//! stops it on failure, probes for recovery, fails over between a primary and
//! a fallback endpoint, and periodically returns to the primary.

pub mod config;
pub mod lifecycle;
pub mod listener;
pub mod observability;
pub mod provider;
pub mod supervisor;

pub use config::WatchdogConfig;
pub use lifecycle::Shutdown;
pub use listener::ListenerLifecycle;
pub use provider::{ProviderHandle, ProviderPair, ProviderRole};
pub use supervisor::{SignalSender, Supervisor, SupervisorStatus};

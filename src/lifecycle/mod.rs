//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build providers → Wire listener + supervisor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Supervisor cancels probes and timer → Listener stopped → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then providers, then the supervisor
//! - In-flight probes and timers never outlive the supervisor

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
pub use startup::{build, build_providers};

//! Chain event listener subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor
//!     → ListenerLifecycle::start(active provider)      (once, at startup)
//!     → ListenerLifecycle::stop(handle)                (failure signal)
//!     → ListenerLifecycle::recover(handle, provider)   (probe confirmed recovery)
//!
//! Listener runtime faults
//!     → SignalSender::report_error → classifier → Supervisor
//! ```
//!
//! # Design Decisions
//! - The supervisor owns the listener exclusively; calls are never concurrent
//! - `recover` resumes from the listener's own cursor instead of re-initializing
//! - `recover` receives the provider so a resumed listener follows failover

pub mod poller;

pub use poller::{BlockPoller, PollerHandle};

use crate::provider::ProviderHandle;

/// Lifecycle of a long-running chain listener.
///
/// The supervisor guarantees `start`/`recover` are only called while the
/// listener is stopped, and `stop` only while it is running.
pub trait ListenerLifecycle: Send + 'static {
    type Handle: Send + 'static;

    /// Begin listening on `provider` from scratch.
    fn start(&mut self, provider: &ProviderHandle) -> Self::Handle;

    /// Stop a running listener. The handle stays valid for `recover`.
    fn stop(&mut self, handle: &mut Self::Handle);

    /// Resume a stopped listener on `provider` without full re-initialization.
    fn recover(&mut self, handle: &mut Self::Handle, provider: &ProviderHandle);
}

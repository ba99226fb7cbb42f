//! Chain-event subscription supervisor.
//!
//! # Data Flow
//! ```text
//! Listener / callers
//!     → signal.rs (typed report or classified error)
//!     → core.rs (single select! loop owning SupervisorState)
//!         → stop listener
//!         → probe.rs (RecoveryProbe polling eth_blockNumber, cancellable)
//!         → on recovery: ListenerLifecycle::recover
//!         → on fallback: schedule.rs (one-shot return-to-primary)
//! ```
//!
//! # Design Decisions
//! - Generic crashes and registry failures are recovered independently
//! - At most one probe per failure class; duplicate signals are absorbed
//! - Probes and timers are owned by guards that cancel on drop
//! - There is no terminal failure state; recovery retries forever

pub mod core;
pub mod probe;
pub mod schedule;
pub mod signal;
pub mod state;

pub use self::core::Supervisor;
pub use probe::{ProbeMode, ProbeOutcome, RecoveryProbe};
pub use schedule::ScheduledReturn;
pub use signal::{channel, FailureClass, FailureClassifier, FailureSignal, MarkerClassifier, SignalInbox, SignalSender};
pub use state::{Phase, SupervisorStatus};

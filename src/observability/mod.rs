//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor, probes, listener produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)
//! - Recovery is never surfaced to callers, only logged and counted

pub mod logging;
pub mod metrics;

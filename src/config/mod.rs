//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WatchdogConfig (validated, immutable)
//!     → handed to providers, listener and supervisor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClassifierConfig, ListenerConfig, ObservabilityConfig, ProvidersConfig, RecoveryConfig,
    WatchdogConfig,
};
pub use validation::ValidationError;

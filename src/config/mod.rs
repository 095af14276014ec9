//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → handed to Lifecycle::new, never mutated afterwards
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the controller is constructed
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, OrchestratorConfig, PoolConfig, ResourceConfig,
    ShutdownConfig, WarmerConfig,
};
pub use validation::{validate_config, ValidationError};

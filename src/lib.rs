//! Graceful-shutdown lifecycle orchestrator.
//!
//! Starts a bounded worker pool, a periodic cache warmer and a long-lived
//! resource connection behind an HTTP ingress, and drains them in a strict
//! order under a deadline when asked to stop.

pub mod background;
pub mod cache;
pub mod config;
pub mod ingress;
pub mod lifecycle;
pub mod observability;
pub mod resource;
pub mod workers;

pub use config::OrchestratorConfig;
pub use lifecycle::{Components, Lifecycle, LifecycleError, LifecycleState};

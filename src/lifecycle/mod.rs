//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open resource → Start periodic task + worker pool → Start ingress
//!
//! Shutdown (shutdown.rs):
//!     Stop ingress → Cancel root signal → Wait (bounded) → Close resource → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: resource first, listeners last (traffic only when ready)
//! - Ordered shutdown: each phase finishes its local action before the next starts
//! - Shutdown has a deadline: waiting may time out, teardown still completes
//! - Stop runs once; every caller receives the same aggregate result

pub mod controller;
pub mod error;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use controller::{Components, Lifecycle};
pub use error::LifecycleError;
pub use shutdown::Shutdown;
pub use state::LifecycleState;

//! Background task subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle::start
//!     → periodic.rs (PeriodicTask::start, spawned on the controller's tracker)
//!     → every interval: Tick::tick (e.g. cache::CacheWarmer)
//!
//! Root cancellation
//!     → PeriodicTask observes it at its next wake
//!     → timer dropped, state Stopped
//! ```
//!
//! # Design Decisions
//! - Each background task is a named value with start/stop, not an anonymous closure
//! - The action runs to completion; a slow action delays the next tick
//! - Action errors are logged and never end the loop

pub mod periodic;

pub use periodic::{PeriodicState, PeriodicTask, Tick, TickError};

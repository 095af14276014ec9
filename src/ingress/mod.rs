//! Ingress subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing)
//!     → adapter.rs (Ingress::handle: accepting switch, per-request timeout)
//!     → WorkerPool::dispatch
//!     → response.rs (map outcome to HTTP status)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Once `stop_accepting` runs, requests are answered 503 without touching the pool
//! - Submission failures are never retried; the client gets 503
//! - The HTTP server drains in-flight connections as part of the lifecycle wait

pub mod adapter;
pub mod response;
pub mod server;

pub use adapter::{Ingress, IngressError};
pub use server::{build_router, HttpServer};

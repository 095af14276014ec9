//! External resource subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle::start
//!     → handle.rs (ResourceHandle::open via a Connector)
//!     → tcp.rs / memory.rs (establish the connection)
//!     ...service runs...
//! Lifecycle::stop (final step)
//!     → handle.rs (ResourceHandle::close)
//!
//! Handle States:
//!     Unopened → Open → Closed
//! ```
//!
//! # Design Decisions
//! - One exclusive connection per handle, owned by the controller
//! - Close is idempotent and always ends in Closed, even when it fails
//! - Connectors are pluggable so tests can simulate unreachable resources

pub mod handle;
pub mod memory;
pub mod tcp;

use async_trait::async_trait;
use thiserror::Error;

pub use handle::{ResourceHandle, ResourceState};
pub use memory::MemoryConnector;
pub use tcp::TcpConnector;

/// Errors raised while opening or closing the resource.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// The resource could not be reached.
    #[error("failed to connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    /// Connecting took longer than the configured timeout.
    #[error("connection to {target} timed out after {timeout_ms}ms")]
    ConnectTimeout { target: String, timeout_ms: u64 },

    /// The underlying close operation failed.
    #[error("failed to close connection: {0}")]
    Close(String),

    /// The handle was already closed and cannot be reopened.
    #[error("resource handle is closed")]
    Closed,
}

/// Establishes connections to the external resource.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Human readable target used in logs and errors.
    fn target(&self) -> String;

    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError>;
}

/// A single established connection.
#[async_trait]
pub trait Connection: Send {
    async fn close(self: Box<Self>) -> Result<(), ResourceError>;
}

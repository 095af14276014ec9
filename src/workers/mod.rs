//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! Ingress (or any producer)
//!     → pool.rs (WorkerPool::submit, bounded queue)
//!     → worker task (one of `pool.size`)
//!     → processor.rs (Processor::process, bounded by the item's own deadline)
//!     → item.rs (result sent back through the item's reply channel)
//!
//! Drain:
//!     Root signal cancelled
//!     → pool stops accepting, queue closer drops the pool's sender
//!     → in-flight submitters return, queue closes
//!     → workers finish queued items, observe closed queue, exit
//! ```
//!
//! # Design Decisions
//! - Queue is the only structure shared between workers
//! - Accepted items are always processed; cancellation closes the queue, it never discards it
//! - Processing is not interrupted by shutdown, only by the item's deadline
//! - Stop is a bounded wait, never a forced abort

pub mod item;
pub mod pool;
pub mod processor;

pub use item::{Job, JobError, JobOutput, JobResult, RequestId, WorkItem, WorkerId};
pub use pool::{DispatchError, PoolError, SubmitError, WorkerPool};
pub use processor::{Processor, SimulatedProcessor};

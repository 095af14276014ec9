//! Shared in-memory cache.
//!
//! # Data Flow
//! ```text
//! warmer.rs (periodic CacheWarmer tick)
//!     → store.rs (Cache::insert per configured key)
//!
//! workers (SimulatedProcessor)
//!     → store.rs (Cache::get by job key)
//! ```
//!
//! # Design Decisions
//! - DashMap provides sharded locking; no global lock on the hot path
//! - Entries are replaced wholesale, never mutated in place

pub mod store;
pub mod warmer;

pub use store::{Cache, CacheEntry};
pub use warmer::CacheWarmer;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events inside the span handed to the Lifecycle controller
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber; only the binary does
//! - Metric updates go through the `metrics` facade and are no-ops without a recorder

pub mod logging;
pub mod metrics;

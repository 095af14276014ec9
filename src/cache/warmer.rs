//! Periodic cache refresh action.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::background::{Tick, TickError};
use crate::cache::{Cache, CacheEntry};
use crate::observability::metrics;

/// Refreshes a fixed set of keys on every tick.
pub struct CacheWarmer {
    cache: Arc<Cache>,
    keys: Vec<String>,
    cycles: AtomicU64,
}

impl CacheWarmer {
    pub fn new(cache: Arc<Cache>, keys: Vec<String>) -> Self {
        Self {
            cache,
            keys,
            cycles: AtomicU64::new(0),
        }
    }

    /// Number of completed warm cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Tick for CacheWarmer {
    fn name(&self) -> &'static str {
        "cache_warmer"
    }

    async fn tick(&self) -> Result<(), TickError> {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(cycle, keys = self.keys.len(), "Warming cache");

        for key in &self.keys {
            self.cache
                .insert(key.clone(), CacheEntry::new(json!({ "key": key, "cycle": cycle })));
            // Let workers interleave with a long key list.
            tokio::task::yield_now().await;
        }

        metrics::record_warm_cycle(self.keys.len());
        tracing::debug!(cycle, "Cache warmed");
        Ok(())
    }
}

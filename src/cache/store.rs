//! Sharded key/value store.

use dashmap::DashMap;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A cached value and when it was last refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    /// Unix timestamp in milliseconds.
    pub refreshed_at_ms: u64,
}

impl CacheEntry {
    pub fn new(value: serde_json::Value) -> Self {
        let refreshed_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            value,
            refreshed_at_ms,
        }
    }
}

/// Concurrent cache shared between the warmer and the workers.
#[derive(Debug, Default)]
pub struct Cache {
    entries: DashMap<String, CacheEntry>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key.into(), entry)
    }

    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

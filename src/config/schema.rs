//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Worker pool sizing and per-request timeout.
    pub pool: PoolConfig,

    /// Shutdown deadline.
    pub shutdown: ShutdownConfig,

    /// The long-lived external connection.
    pub resource: ResourceConfig,

    /// Periodic cache warming.
    pub warmer: WarmerConfig,

    /// HTTP ingress listener.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker tasks.
    pub size: usize,

    /// Bounded queue capacity. `0` means twice the pool size.
    pub queue_capacity: usize,

    /// Per-request timeout in milliseconds (submission + processing).
    pub request_timeout_ms: u64,

    /// Simulated processing time of the default processor in milliseconds.
    pub processing_delay_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            queue_capacity: 0,
            request_timeout_ms: 10_000,
            processing_delay_ms: 100,
        }
    }
}

impl PoolConfig {
    /// Effective queue capacity.
    pub fn capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            (self.size * 2).max(1)
        } else {
            self.queue_capacity
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on how long shutdown waits for tasks, in milliseconds.
    pub deadline_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { deadline_ms: 10_000 }
    }
}

impl ShutdownConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// External resource configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// TCP address of the resource (e.g., "127.0.0.1:5432").
    /// When absent an in-memory connection is used.
    pub address: Option<String>,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            address: None,
            connect_timeout_ms: 5_000,
        }
    }
}

impl ResourceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Cache warmer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarmerConfig {
    /// Run the periodic warmer.
    pub enabled: bool,

    /// Interval between warm cycles in milliseconds.
    pub interval_ms: u64,

    /// Keys refreshed on every cycle.
    pub keys: Vec<String>,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            keys: vec!["popular".to_string(), "recent".to_string()],
        }
    }
}

impl WarmerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// HTTP ingress listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind the HTTP listener at startup.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_capacity_defaults_to_twice_pool_size() {
        let pool = PoolConfig {
            size: 3,
            ..PoolConfig::default()
        };
        assert_eq!(pool.capacity(), 6);

        let pool = PoolConfig {
            size: 3,
            queue_capacity: 1,
            ..PoolConfig::default()
        };
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: OrchestratorConfig = toml::from_str("[pool]\nsize = 2\n").unwrap();
        assert_eq!(config.pool.size, 2);
        assert_eq!(config.pool.request_timeout_ms, 10_000);
        assert_eq!(config.shutdown.deadline(), Duration::from_secs(10));
        assert!(config.resource.address.is_none());
    }
}

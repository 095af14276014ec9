//! Shared utilities for lifecycle integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shutdown_orchestrator::cache::Cache;
use shutdown_orchestrator::config::OrchestratorConfig;
use shutdown_orchestrator::resource::{Connection, Connector, ResourceError};
use shutdown_orchestrator::workers::{Job, JobOutput, JobResult, Processor, RequestId, WorkerId};
use shutdown_orchestrator::Components;

/// Config with no listener and no warmer, suitable for in-process tests.
pub fn test_config(pool_size: usize) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.pool.size = pool_size;
    config.pool.request_timeout_ms = 30_000;
    config.shutdown.deadline_ms = 10_000;
    config.listener.enabled = false;
    config.warmer.enabled = false;
    config
}

/// Processor sleeping a fixed time per job, longer for selected keys.
pub struct DelayProcessor {
    default: Duration,
    slow: HashMap<String, Duration>,
    processed: AtomicUsize,
}

impl DelayProcessor {
    pub fn new(default: Duration) -> Arc<Self> {
        Self::with_slow_key(default, "", default)
    }

    pub fn with_slow_key(default: Duration, key: &str, delay: Duration) -> Arc<Self> {
        let mut slow = HashMap::new();
        slow.insert(key.to_string(), delay);
        Arc::new(Self {
            default,
            slow,
            processed: AtomicUsize::new(0),
        })
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Processor for DelayProcessor {
    async fn process(&self, id: RequestId, job: &Job, worker: WorkerId) -> JobResult {
        let delay = self.slow.get(&job.key).copied().unwrap_or(self.default);
        tokio::time::sleep(delay).await;
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok(JobOutput {
            request_id: id,
            worker_id: worker,
            key: job.key.clone(),
            payload: job.payload.clone(),
            cached: None,
        })
    }
}

/// How a [`ScriptedConnection`] behaves when closed.
#[derive(Clone, Copy)]
pub enum CloseBehavior {
    Succeed,
    Fail,
    Panic,
}

/// Connector whose connect or close can be made to misbehave.
pub struct ScriptedConnector {
    pub fail_connect: bool,
    pub on_close: CloseBehavior,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    fn new(fail_connect: bool, on_close: CloseBehavior) -> Self {
        Self {
            fail_connect,
            on_close,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn healthy() -> Self {
        Self::new(false, CloseBehavior::Succeed)
    }

    pub fn unreachable() -> Self {
        Self::new(true, CloseBehavior::Succeed)
    }

    pub fn failing_close() -> Self {
        Self::new(false, CloseBehavior::Fail)
    }

    pub fn panicking_close() -> Self {
        Self::new(false, CloseBehavior::Panic)
    }
}

struct ScriptedConnection {
    on_close: CloseBehavior,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn target(&self) -> String {
        "scripted".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        if self.fail_connect {
            return Err(ResourceError::Connect {
                target: self.target(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(ScriptedConnection {
            on_close: self.on_close,
            closes: self.closes.clone(),
        }))
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn close(self: Box<Self>) -> Result<(), ResourceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.on_close {
            CloseBehavior::Succeed => Ok(()),
            CloseBehavior::Fail => Err(ResourceError::Close("socket reset".to_string())),
            CloseBehavior::Panic => panic!("driver crashed during close"),
        }
    }
}

/// Components built from `config` with the given processor swapped in.
pub fn components(config: &OrchestratorConfig, processor: Arc<dyn Processor>) -> Components {
    Components {
        processor,
        ..Components::from_config(config)
    }
}

/// Components with both processor and connector swapped in.
pub fn components_with(
    processor: Arc<dyn Processor>,
    connector: Box<dyn Connector>,
) -> Components {
    Components {
        processor,
        connector,
        cache: Arc::new(Cache::new()),
    }
}

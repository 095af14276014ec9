//! Job processing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::workers::item::{Job, JobOutput, JobResult, RequestId, WorkerId};

/// Processes one job on behalf of a worker.
///
/// Implementations should not panic on bad input; return `JobError::Failed`.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, id: RequestId, job: &Job, worker: WorkerId) -> JobResult;
}

/// Default processor: waits a fixed time, then echoes the payload along
/// with whatever the cache holds for the job's key.
pub struct SimulatedProcessor {
    delay: Duration,
    cache: Arc<Cache>,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration, cache: Arc<Cache>) -> Self {
        Self { delay, cache }
    }
}

#[async_trait]
impl Processor for SimulatedProcessor {
    async fn process(&self, id: RequestId, job: &Job, worker: WorkerId) -> JobResult {
        tracing::debug!(request_id = %id, worker = %worker, key = %job.key, "Processing job");
        tokio::time::sleep(self.delay).await;

        Ok(JobOutput {
            request_id: id,
            worker_id: worker,
            key: job.key.clone(),
            payload: job.payload.clone(),
            cached: self.cache.get(&job.key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn echoes_payload_with_cache_hit() {
        let cache = Arc::new(Cache::new());
        cache.insert("k", CacheEntry::new(json!("warm")));
        let processor = SimulatedProcessor::new(Duration::from_millis(100), cache);

        let mut job = Job::new("k");
        job.payload = json!({"n": 1});
        let out = processor
            .process(RequestId::new(), &job, WorkerId(2))
            .await
            .unwrap();

        assert_eq!(out.worker_id, WorkerId(2));
        assert_eq!(out.payload, json!({"n": 1}));
        assert_eq!(out.cached.map(|c| c.value), Some(json!("warm")));
    }
}

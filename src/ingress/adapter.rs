//! Boundary between external requests and the worker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::observability::metrics;
use crate::workers::{DispatchError, Job, JobError, JobOutput, RequestId, WorkerPool};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngressError {
    /// Not accepting, or the pool rejected the submission.
    #[error("service unavailable")]
    Unavailable,
    /// The per-request timeout elapsed.
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Failed(String),
}

/// Forwards accepted requests to the worker pool.
pub struct Ingress {
    pool: Arc<WorkerPool>,
    request_timeout: Duration,
    accepting: AtomicBool,
    closed: CancellationToken,
}

impl Ingress {
    /// Created closed; call [`Ingress::start_accepting`] to open it.
    pub fn new(pool: Arc<WorkerPool>, request_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            pool,
            request_timeout,
            accepting: AtomicBool::new(false),
            closed: CancellationToken::new(),
        })
    }

    /// Open the ingress. Has no effect once it has been stopped.
    pub fn start_accepting(&self) -> bool {
        if self.closed.is_cancelled() {
            return false;
        }
        self.accepting.store(true, Ordering::SeqCst);
        tracing::info!("Ingress accepting requests");
        true
    }

    /// Stop forwarding requests. Idempotent; returns once no new request
    /// will reach the pool through this adapter.
    pub fn stop_accepting(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            tracing::info!("Ingress stopped accepting new requests");
        }
        self.closed.cancel();
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Resolves once the ingress has been stopped.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.closed.clone().cancelled_owned()
    }

    /// Forward one request and wait for its result.
    pub async fn handle(&self, id: RequestId, job: Job) -> Result<JobOutput, IngressError> {
        if !self.is_accepting() {
            metrics::record_rejected("ingress_closed");
            tracing::debug!(request_id = %id, "Rejected: ingress closed");
            return Err(IngressError::Unavailable);
        }

        match self.pool.dispatch(id, job, self.request_timeout).await {
            Ok(output) => Ok(output),
            Err(DispatchError::Rejected(e)) => {
                tracing::debug!(request_id = %id, reason = e.reason(), "Rejected by worker pool");
                Err(IngressError::Unavailable)
            }
            Err(DispatchError::Job(JobError::Timeout)) => Err(IngressError::Timeout),
            Err(DispatchError::Job(e)) => Err(IngressError::Failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::config::PoolConfig;
    use crate::workers::SimulatedProcessor;

    fn ingress() -> (Arc<Ingress>, CancellationToken) {
        let root = CancellationToken::new();
        let processor = Arc::new(SimulatedProcessor::new(
            Duration::from_millis(10),
            Arc::new(Cache::new()),
        ));
        let pool = WorkerPool::start(&PoolConfig::default(), processor, &root);
        (Ingress::new(pool, Duration::from_secs(1)), root)
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_until_started() {
        let (ingress, _root) = ingress();
        let err = ingress.handle(RequestId::new(), Job::new("a")).await.unwrap_err();
        assert_eq!(err, IngressError::Unavailable);

        assert!(ingress.start_accepting());
        assert!(ingress.handle(RequestId::new(), Job::new("a")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_final_and_idempotent() {
        let (ingress, _root) = ingress();
        ingress.start_accepting();
        ingress.stop_accepting();
        ingress.stop_accepting();

        assert!(!ingress.start_accepting());
        assert!(!ingress.is_accepting());
        let err = ingress.handle(RequestId::new(), Job::new("a")).await.unwrap_err();
        assert_eq!(err, IngressError::Unavailable);
        ingress.closed().await;
    }

    #[tokio::test(start_paused = true)]
    async fn draining_pool_maps_to_unavailable() {
        let (ingress, root) = ingress();
        ingress.start_accepting();
        root.cancel();
        let err = ingress.handle(RequestId::new(), Job::new("a")).await.unwrap_err();
        assert_eq!(err, IngressError::Unavailable);
    }
}

//! Bounded worker pool with orderly drain.
//!
//! # Responsibilities
//! - Run exactly `size` worker tasks pulling from a bounded FIFO queue
//! - Reject submissions once draining has begun
//! - Close the queue once no producer can submit any more
//! - Wait for workers to finish, bounded by a deadline

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::config::PoolConfig;
use crate::observability::metrics;
use crate::workers::item::{Job, JobError, JobOutput, RequestId, WorkItem, WorkerId};
use crate::workers::processor::Processor;

/// A submission that was not enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The pool is draining or stopped.
    #[error("worker pool is unavailable")]
    Unavailable,
    /// The caller gave up before the item was enqueued.
    #[error("submission cancelled by caller")]
    Cancelled,
}

impl SubmitError {
    pub fn reason(&self) -> &'static str {
        match self {
            SubmitError::Unavailable => "unavailable",
            SubmitError::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The deadline elapsed with workers still running. They are left to
    /// finish on their own.
    #[error("worker pool stop timed out with {remaining} task(s) still running")]
    Timeout { remaining: usize },
}

/// Failure of [`WorkerPool::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] SubmitError),
    #[error(transparent)]
    Job(#[from] JobError),
}

type Queue = Arc<tokio::sync::Mutex<mpsc::Receiver<WorkItem>>>;

/// Fixed-size pool of workers consuming a bounded queue.
pub struct WorkerPool {
    size: usize,
    /// Producer side of the queue. Taken (and dropped) once draining starts.
    sender: Arc<Mutex<Option<mpsc::Sender<WorkItem>>>>,
    token: CancellationToken,
    tasks: TaskTracker,
}

impl WorkerPool {
    /// Spawn the workers and the queue closer.
    ///
    /// The pool drains when `parent` is cancelled or when [`WorkerPool::stop`] is called.
    pub fn start(
        config: &PoolConfig,
        processor: Arc<dyn Processor>,
        parent: &CancellationToken,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.capacity());
        let queue: Queue = Arc::new(tokio::sync::Mutex::new(rx));
        let sender = Arc::new(Mutex::new(Some(tx)));
        let token = parent.child_token();
        let tasks = TaskTracker::new();

        for i in 0..config.size {
            let id = WorkerId(i);
            tasks.spawn(
                worker(id, queue.clone(), processor.clone())
                    .instrument(tracing::debug_span!("worker", id = i)),
            );
        }

        tasks.spawn(close_queue_on_cancel(sender.clone(), token.clone()).in_current_span());

        tracing::info!(
            workers = config.size,
            queue_capacity = config.capacity(),
            "Worker pool started"
        );

        Arc::new(Self {
            size: config.size,
            sender,
            token,
            tasks,
        })
    }

    /// Enqueue an item, waiting while the queue is full.
    ///
    /// Fails with [`SubmitError::Unavailable`] once draining has begun and
    /// with [`SubmitError::Cancelled`] if `cancel` fires first. An `Ok`
    /// means the item will be handed to a worker.
    pub async fn submit(&self, item: WorkItem, cancel: &CancellationToken) -> Result<(), SubmitError> {
        let result = self.try_enqueue(item, cancel).await;
        if let Err(e) = &result {
            metrics::record_rejected(e.reason());
        }
        result
    }

    async fn try_enqueue(&self, item: WorkItem, cancel: &CancellationToken) -> Result<(), SubmitError> {
        if self.token.is_cancelled() {
            return Err(SubmitError::Unavailable);
        }
        let sender = self.producer().ok_or(SubmitError::Unavailable)?;

        let permit = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(SubmitError::Unavailable),
            _ = cancel.cancelled() => return Err(SubmitError::Cancelled),
            permit = sender.reserve() => permit.map_err(|_| SubmitError::Unavailable)?,
        };

        tracing::trace!(request_id = %item.id, "Item enqueued");
        permit.send(item);
        metrics::set_queue_depth(sender.max_capacity() - sender.capacity());
        Ok(())
    }

    /// Submit a job and wait for its result, all within `timeout`.
    pub async fn dispatch(
        &self,
        id: RequestId,
        job: Job,
        timeout: Duration,
    ) -> Result<JobOutput, DispatchError> {
        let deadline = Instant::now() + timeout;
        let (item, reply) = WorkItem::new(id, job, deadline);

        let never = CancellationToken::new();
        match tokio::time::timeout_at(deadline, self.submit(item, &never)).await {
            Ok(submitted) => submitted?,
            Err(_) => {
                metrics::record_rejected(SubmitError::Cancelled.reason());
                return Err(SubmitError::Cancelled.into());
            }
        }

        match tokio::time::timeout_at(deadline, reply).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(_)) => Err(JobError::Abandoned.into()),
            Err(_) => Err(JobError::Timeout.into()),
        }
    }

    /// Begin draining and wait for every worker to exit.
    ///
    /// On timeout the workers are abandoned, not killed: they exit once their
    /// current item is done and the queue is closed.
    pub async fn stop(&self, deadline: Instant) -> Result<(), PoolError> {
        self.token.cancel();
        self.tasks.close();

        match tokio::time::timeout_at(deadline, self.tasks.wait()).await {
            Ok(()) => {
                tracing::info!("All workers finished");
                Ok(())
            }
            Err(_) => {
                let remaining = self.tasks.len();
                tracing::warn!(remaining, "Worker pool stop deadline exceeded");
                Err(PoolError::Timeout { remaining })
            }
        }
    }

    /// Whether new submissions can currently be accepted.
    pub fn is_accepting(&self) -> bool {
        !self.token.is_cancelled() && self.producer().is_some()
    }

    /// Worker and closer tasks that have not exited yet.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Items currently queued (0 once the queue is closed).
    pub fn queue_depth(&self) -> usize {
        self.producer()
            .map(|s| s.max_capacity() - s.capacity())
            .unwrap_or(0)
    }

    fn producer(&self) -> Option<mpsc::Sender<WorkItem>> {
        self.sender.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Drop the pool's sender once draining begins. The queue closes when the
/// last in-flight submitter returns its clone.
async fn close_queue_on_cancel(
    sender: Arc<Mutex<Option<mpsc::Sender<WorkItem>>>>,
    token: CancellationToken,
) {
    token.cancelled().await;
    let taken = match sender.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    drop(taken);
    tracing::info!("Worker pool draining, queue closed to new submissions");
}

async fn worker(id: WorkerId, queue: Queue, processor: Arc<dyn Processor>) {
    tracing::debug!("Worker started");

    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(item) = next else {
            tracing::debug!("Queue closed and empty, worker exiting");
            break;
        };
        process_item(id, item, processor.as_ref()).await;
    }
}

async fn process_item(id: WorkerId, item: WorkItem, processor: &dyn Processor) {
    let started = std::time::Instant::now();
    let WorkItem {
        id: request_id,
        job,
        deadline,
        reply,
    } = item;

    let result = match tokio::time::timeout_at(deadline, processor.process(request_id, &job, id)).await {
        Ok(result) => result,
        Err(_) => Err(JobError::Timeout),
    };

    let outcome = match &result {
        Ok(_) => "ok",
        Err(JobError::Timeout) => "timeout",
        Err(_) => "failed",
    };
    metrics::record_job(outcome, started);
    match &result {
        Ok(_) => tracing::debug!(request_id = %request_id, "Job processed"),
        Err(e) => tracing::warn!(request_id = %request_id, error = %e, "Job did not complete"),
    }

    if reply.send(result).is_err() {
        tracing::debug!(request_id = %request_id, "Requester went away before the result");
    }
}

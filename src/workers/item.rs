//! Work items and their results.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::cache::CacheEntry;

/// Unique identifier of a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id supplied by a client, e.g. an `x-request-id` header.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a worker task within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// The opaque unit of work accepted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub key: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Job {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: serde_json::Value::Null,
        }
    }
}

/// What a processed job produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutput {
    pub request_id: RequestId,
    pub worker_id: WorkerId,
    pub key: String,
    pub payload: serde_json::Value,
    /// Cache entry for `key` at processing time, if any.
    pub cached: Option<CacheEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// The item's own deadline elapsed.
    #[error("job timed out")]
    Timeout,
    #[error("job failed: {0}")]
    Failed(String),
    /// The item was dropped without a result (its worker went away).
    #[error("job abandoned before completion")]
    Abandoned,
}

pub type JobResult = Result<JobOutput, JobError>;

/// A job in flight, together with its result sink.
///
/// Owned by whichever worker dequeues it.
#[derive(Debug)]
pub struct WorkItem {
    pub id: RequestId,
    pub job: Job,
    /// Processing must finish before this instant.
    pub deadline: Instant,
    pub reply: oneshot::Sender<JobResult>,
}

impl WorkItem {
    /// Build an item and the receiver its result will arrive on.
    pub fn new(id: RequestId, job: Job, deadline: Instant) -> (Self, oneshot::Receiver<JobResult>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                id,
                job,
                deadline,
                reply,
            },
            rx,
        )
    }
}

//! Lifecycle error kinds.

use thiserror::Error;

use crate::lifecycle::state::LifecycleState;
use crate::resource::ResourceError;

/// Errors returned by [`Lifecycle::start`](crate::lifecycle::Lifecycle::start)
/// and [`Lifecycle::stop`](crate::lifecycle::Lifecycle::stop).
///
/// `Clone` so every concurrent `stop` caller gets the same value.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// Fatal: nothing is left running when this is returned.
    #[error("startup failed while {stage}: {reason}")]
    StartupFailure { stage: &'static str, reason: String },

    #[error("lifecycle cannot start from state {0}")]
    AlreadyStarted(LifecycleState),

    /// Tasks were still running at the deadline. Shutdown still completed.
    #[error("shutdown deadline of {deadline_ms}ms exceeded with {pending} task(s) still running")]
    ShutdownTimeout { deadline_ms: u64, pending: usize },

    /// The HTTP server stopped with an error.
    #[error("ingress failed: {0}")]
    IngressFailure(String),

    #[error("failed to close resource: {0}")]
    ResourceCloseFailure(#[source] ResourceError),

    /// The task running the shutdown protocol did not complete.
    #[error("shutdown aborted: {0}")]
    Aborted(String),
}

impl LifecycleError {
    pub(crate) fn startup(stage: &'static str, reason: impl ToString) -> Self {
        LifecycleError::StartupFailure {
            stage,
            reason: reason.to_string(),
        }
    }
}

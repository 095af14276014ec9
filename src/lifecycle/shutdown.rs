//! Shutdown coordination.
//!
//! Holds the root cancellation signal and the ordered teardown protocol.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::controller::Inner;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::startup::Running;
use crate::lifecycle::state::LifecycleState;
use crate::observability::metrics;

/// Root cancellation signal.
///
/// Long-running tasks subscribe to a child token; only the owner can trigger it.
/// Triggering is one-shot and irreversible.
#[derive(Debug)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the first error; later ones are only logged.
#[derive(Default)]
struct FirstError(Option<LifecycleError>);

impl FirstError {
    fn record(&mut self, err: LifecycleError) {
        if self.0.is_none() {
            self.0 = Some(err);
        } else {
            tracing::warn!(error = %err, "Additional shutdown error");
        }
    }

    fn into_result(self) -> Result<(), LifecycleError> {
        self.0.map_or(Ok(()), Err)
    }
}

/// Run the full stop protocol once.
pub(crate) async fn execute(inner: Arc<Inner>, budget: Duration) -> Result<(), LifecycleError> {
    let _transition = inner.transition.lock().await;
    let started = Instant::now();

    let Some(running) = inner.running.get() else {
        // Never started, or start already tore itself down.
        inner.state.advance(LifecycleState::Stopped);
        tracing::info!("Stop requested with nothing running");
        return Ok(());
    };

    inner.state.advance(LifecycleState::Draining);
    tracing::info!(deadline_ms = budget.as_millis() as u64, "Shutting down");

    let result = teardown(&inner, running, started + budget).await;

    inner.state.advance(LifecycleState::Stopped);
    metrics::record_shutdown(started.elapsed(), result.is_ok());
    match &result {
        Ok(()) => tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Shutdown completed with errors"),
    }
    result
}

/// Steps 1-4 of the protocol. Also used to unwind a failed start.
pub(crate) async fn teardown(
    inner: &Inner,
    running: &Running,
    deadline: Instant,
) -> Result<(), LifecycleError> {
    let budget = deadline.saturating_duration_since(Instant::now());
    let mut errors = FirstError::default();

    // 1. No new external requests.
    running.ingress.stop_accepting();

    // 2. Cancel the root signal: periodic task stops, pool drains.
    inner.shutdown.trigger();
    tracing::info!("Root signal cancelled, draining");

    // 3. Bounded wait for every task.
    let pool = running.pool.stop(deadline).await;
    inner.tasks.close();
    let background = tokio::time::timeout_at(deadline, inner.tasks.wait()).await;
    if let Some(e) = running.server_failure().await {
        errors.record(e);
    }
    if pool.is_err() || background.is_err() {
        let pending = running.pool.active_tasks() + inner.tasks.len();
        tracing::warn!(pending, "Shutdown deadline exceeded, proceeding anyway");
        errors.record(LifecycleError::ShutdownTimeout {
            deadline_ms: budget.as_millis() as u64,
            pending,
        });
    } else {
        tracing::info!("All tasks finished");
    }

    // 4. Release the resource regardless of step 3.
    if let Err(e) = inner.resource.close().await {
        tracing::error!(error = %e, "Resource close failed");
        errors.record(LifecycleError::ResourceCloseFailure(e));
    }

    errors.into_result()
}

//! Fixed-interval task runner.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Error reported by a single tick. Logged, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TickError(pub String);

/// The action repeated by a [`PeriodicTask`].
#[async_trait]
pub trait Tick: Send + Sync {
    fn name(&self) -> &'static str;

    async fn tick(&self) -> Result<(), TickError>;
}

/// Runner state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl From<u8> for PeriodicState {
    fn from(val: u8) -> Self {
        match val {
            1 => PeriodicState::Running,
            2 => PeriodicState::Stopped,
            _ => PeriodicState::Idle,
        }
    }
}

/// Runs a [`Tick`] every `period` until cancelled.
pub struct PeriodicTask {
    action: Arc<dyn Tick>,
    period: Duration,
    state: Arc<AtomicU8>,
    token: CancellationToken,
}

impl PeriodicTask {
    /// `parent` is the signal that stops the task; `stop` can also stop it directly.
    pub fn new(action: Arc<dyn Tick>, period: Duration, parent: &CancellationToken) -> Self {
        Self {
            action,
            period,
            state: Arc::new(AtomicU8::new(PeriodicState::Idle as u8)),
            token: parent.child_token(),
        }
    }

    /// Spawn the loop on `tracker`. Returns false if already started.
    pub fn start(&self, tracker: &TaskTracker) -> bool {
        if self
            .state
            .compare_exchange(
                PeriodicState::Idle as u8,
                PeriodicState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return false;
        }

        let name = self.action.name();
        let span = tracing::info_span!("periodic", task = name);
        tracker.spawn(
            run(
                self.action.clone(),
                self.period,
                self.token.clone(),
                StoppedOnDrop(self.state.clone()),
            )
            .instrument(span),
        );
        true
    }

    /// Ask the loop to exit at its next wake.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> PeriodicState {
        self.state.load(Ordering::SeqCst).into()
    }
}

/// Marks the runner stopped on every exit path of the loop.
struct StoppedOnDrop(Arc<AtomicU8>);

impl Drop for StoppedOnDrop {
    fn drop(&mut self) {
        self.0.store(PeriodicState::Stopped as u8, Ordering::SeqCst);
    }
}

async fn run(
    action: Arc<dyn Tick>,
    period: Duration,
    token: CancellationToken,
    _stopped: StoppedOnDrop,
) {
    tracing::info!(interval_ms = period.as_millis() as u64, "Periodic task started");

    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!("Periodic task received shutdown signal, exiting loop");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = action.tick().await {
                    tracing::warn!(error = %e, "Periodic action failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        ticks: AtomicUsize,
        fail: bool,
        work: Duration,
    }

    impl Counter {
        fn new(fail: bool, work: Duration) -> Arc<Self> {
            Arc::new(Self {
                ticks: AtomicUsize::new(0),
                fail,
                work,
            })
        }
    }

    #[async_trait]
    impl Tick for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn tick(&self) -> Result<(), TickError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.work).await;
            if self.fail {
                Err(TickError("nope".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_cancelled() {
        let root = CancellationToken::new();
        let tracker = TaskTracker::new();
        let counter = Counter::new(false, Duration::ZERO);
        let task = PeriodicTask::new(counter.clone(), Duration::from_secs(1), &root);

        assert_eq!(task.state(), PeriodicState::Idle);
        assert!(task.start(&tracker));
        assert!(!task.start(&tracker));
        assert_eq!(task.state(), PeriodicState::Running);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 3);

        root.cancel();
        tracker.close();
        tracker.wait().await;
        assert_eq!(task.state(), PeriodicState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_action_keeps_running() {
        let root = CancellationToken::new();
        let tracker = TaskTracker::new();
        let counter = Counter::new(true, Duration::ZERO);
        let task = PeriodicTask::new(counter.clone(), Duration::from_millis(100), &root);
        task.start(&tracker);

        time::sleep(Duration::from_millis(550)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 5);

        task.stop();
        tracker.close();
        tracker.wait().await;
        assert_eq!(task.state(), PeriodicState::Stopped);
        assert!(!root.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_action_delays_next_tick() {
        let root = CancellationToken::new();
        let tracker = TaskTracker::new();
        let counter = Counter::new(false, Duration::from_millis(250));
        let task = PeriodicTask::new(counter.clone(), Duration::from_millis(100), &root);
        task.start(&tracker);

        // Ticks begin at 100, 350 (delayed), 600 (delayed).
        time::sleep(Duration::from_millis(700)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 3);

        root.cancel();
        tracker.close();
        tracker.wait().await;
    }
}

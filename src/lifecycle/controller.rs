//! The lifecycle controller.
//!
//! Single authority over startup order, shutdown order and the root
//! cancellation signal.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span};

use crate::background::PeriodicState;
use crate::cache::Cache;
use crate::config::{validate_config, OrchestratorConfig};
use crate::ingress::Ingress;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::lifecycle::startup::{self, Running};
use crate::lifecycle::state::{LifecycleState, StateCell};
use crate::resource::{Connector, MemoryConnector, ResourceHandle, ResourceState, TcpConnector};
use crate::workers::{Processor, SimulatedProcessor, WorkerPool};

/// Pluggable parts of the service.
pub struct Components {
    pub connector: Box<dyn Connector>,
    pub processor: Arc<dyn Processor>,
    pub cache: Arc<Cache>,
}

impl Components {
    /// Default components: TCP (or in-memory) resource, simulated processor.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let cache = Arc::new(Cache::new());
        let connector: Box<dyn Connector> = match &config.resource.address {
            Some(address) => Box::new(TcpConnector::new(
                address.clone(),
                config.resource.connect_timeout(),
            )),
            None => Box::new(MemoryConnector),
        };
        let processor = Arc::new(SimulatedProcessor::new(
            config.pool.processing_delay(),
            cache.clone(),
        ));

        Self {
            connector,
            processor,
            cache,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) config: OrchestratorConfig,
    pub(crate) span: Span,
    pub(crate) state: StateCell,
    pub(crate) shutdown: Shutdown,
    pub(crate) resource: ResourceHandle,
    pub(crate) processor: Arc<dyn Processor>,
    pub(crate) cache: Arc<Cache>,
    /// Background tasks: periodic runner and HTTP server.
    pub(crate) tasks: TaskTracker,
    /// Serializes start against the stop protocol.
    pub(crate) transition: Mutex<()>,
    pub(crate) running: OnceLock<Running>,
    stopped: OnceLock<StopResult>,
}

type StopResult = Shared<BoxFuture<'static, Result<(), LifecycleError>>>;

/// Starts the service's subsystems and shuts them down in order.
///
/// Cheap to clone; clones share the same lifecycle, so `stop` can be
/// called from a signal task while another task owns the controller.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    /// `span` is the parent of every log event and task this lifecycle emits.
    pub fn new(config: OrchestratorConfig, components: Components, span: Span) -> Self {
        let Components {
            connector,
            processor,
            cache,
        } = components;

        Self {
            inner: Arc::new(Inner {
                config,
                span,
                state: StateCell::new(),
                shutdown: Shutdown::new(),
                resource: ResourceHandle::new(connector),
                processor,
                cache,
                tasks: TaskTracker::new(),
                transition: Mutex::new(()),
                running: OnceLock::new(),
                stopped: OnceLock::new(),
            }),
        }
    }

    /// Launch every subsystem. Returns once all tasks are running.
    ///
    /// Errors with [`LifecycleError::AlreadyStarted`] unless the lifecycle is
    /// freshly created. A [`LifecycleError::StartupFailure`], including one
    /// for an invalid configuration, leaves nothing running.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let inner = &self.inner;
        let _transition = inner.transition.lock().await;

        let state = inner.state.get();
        if state != LifecycleState::Created {
            return Err(LifecycleError::AlreadyStarted(state));
        }

        if let Err(errors) = validate_config(&inner.config) {
            let reason = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            tracing::error!(parent: &inner.span, %reason, "Invalid configuration, not starting");
            inner.state.advance(LifecycleState::Stopped);
            return Err(LifecycleError::startup("validating configuration", reason));
        }

        match startup::launch(inner).instrument(inner.span.clone()).await {
            Ok(running) => {
                // Guarded by `transition` and the Created check.
                let _ = inner.running.set(running);
                inner.state.advance(LifecycleState::Running);
                Ok(())
            }
            Err(e) => {
                inner.state.advance(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    /// Shut everything down, waiting at most `deadline` for tasks to finish
    /// (capped by `shutdown.deadline_ms`).
    ///
    /// The protocol runs once, with the first caller's deadline. Concurrent
    /// and later callers wait for it and receive the same result, including
    /// after the first caller has given up waiting.
    pub async fn stop(&self, deadline: Duration) -> Result<(), LifecycleError> {
        let result = self
            .inner
            .stopped
            .get_or_init(|| {
                let budget = deadline.min(self.inner.config.shutdown.deadline());
                let span = self.inner.span.clone();
                let inner = self.inner.clone();
                // Spawned here, not on first poll: the protocol runs even if
                // every caller drops its future.
                tokio::spawn(shutdown::execute(self.inner.clone(), budget).instrument(span))
                    .map(move |joined| {
                        joined.unwrap_or_else(|e| {
                            tracing::error!(parent: &inner.span, error = %e, "Shutdown task failed");
                            inner.state.advance(LifecycleState::Stopped);
                            Err(LifecycleError::Aborted(e.to_string()))
                        })
                    })
                    .boxed()
                    .shared()
            })
            .clone();

        result.await
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> Arc<Cache> {
        self.inner.cache.clone()
    }

    /// The ingress adapter, once started.
    pub fn ingress(&self) -> Option<Arc<Ingress>> {
        self.inner.running.get().map(|r| r.ingress.clone())
    }

    /// The worker pool, once started.
    pub fn pool(&self) -> Option<Arc<WorkerPool>> {
        self.inner.running.get().map(|r| r.pool.clone())
    }

    /// Address the HTTP listener is bound to, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.running.get().and_then(|r| r.local_addr)
    }

    pub fn periodic_state(&self) -> Option<PeriodicState> {
        self.inner.running.get().and_then(Running::periodic_state)
    }

    pub async fn resource_state(&self) -> ResourceState {
        self.inner.resource.state().await
    }

    /// Worker and background tasks that have not exited yet.
    pub fn outstanding_tasks(&self) -> usize {
        let workers = self
            .inner
            .running
            .get()
            .map(|r| r.pool.active_tasks())
            .unwrap_or(0);
        workers + self.inner.tasks.len()
    }
}

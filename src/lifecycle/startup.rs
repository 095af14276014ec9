//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the external resource before anything else
//! - Start the periodic task and the worker pool on the root signal
//! - Bind the listener and open the ingress last
//!
//! # Design Decisions
//! - Fail fast: an unreachable resource aborts startup with nothing started
//! - A later failure unwinds everything already started before returning
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::background::{PeriodicState, PeriodicTask};
use crate::cache::CacheWarmer;
use crate::ingress::{HttpServer, Ingress};
use crate::lifecycle::controller::Inner;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::shutdown;
use crate::workers::WorkerPool;

/// Everything launched by a successful start.
pub(crate) struct Running {
    pub(crate) pool: Arc<WorkerPool>,
    pub(crate) ingress: Arc<Ingress>,
    pub(crate) periodic: Option<PeriodicTask>,
    pub(crate) local_addr: Option<SocketAddr>,
    pub(crate) server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl Running {
    pub(crate) fn periodic_state(&self) -> Option<PeriodicState> {
        self.periodic.as_ref().map(PeriodicTask::state)
    }

    /// Outcome of the HTTP server task, once it has exited.
    ///
    /// `None` when there is no server, it is still running, or its outcome
    /// was already collected.
    pub(crate) async fn server_failure(&self) -> Option<LifecycleError> {
        let handle = {
            let mut slot = self.server.lock().ok()?;
            if !slot.as_ref()?.is_finished() {
                return None;
            }
            slot.take()?
        };

        match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(LifecycleError::IngressFailure(e.to_string())),
            Err(e) => Some(LifecycleError::IngressFailure(e.to_string())),
        }
    }
}

pub(crate) async fn launch(inner: &Inner) -> Result<Running, LifecycleError> {
    let config = &inner.config;
    tracing::info!(
        pool_size = config.pool.size,
        resource = %inner.resource.target(),
        "Starting"
    );

    inner.resource.open().await.map_err(|e| {
        tracing::error!(error = %e, "Resource unreachable, aborting startup");
        LifecycleError::startup("opening resource", e)
    })?;

    let periodic = if config.warmer.enabled {
        let warmer = Arc::new(CacheWarmer::new(
            inner.cache.clone(),
            config.warmer.keys.clone(),
        ));
        let task = PeriodicTask::new(warmer, config.warmer.interval(), &inner.shutdown.subscribe());
        task.start(&inner.tasks);
        Some(task)
    } else {
        tracing::info!("Cache warmer disabled");
        None
    };

    let pool = WorkerPool::start(
        &config.pool,
        inner.processor.clone(),
        &inner.shutdown.subscribe(),
    );
    let ingress = Ingress::new(pool.clone(), config.pool.request_timeout());
    let mut running = Running {
        pool,
        ingress,
        periodic,
        local_addr: None,
        server: Mutex::new(None),
    };

    if config.listener.enabled {
        match TcpListener::bind(&config.listener.bind_address).await {
            Ok(listener) => {
                running.local_addr = listener.local_addr().ok();
                let server = HttpServer::new(running.ingress.clone());
                let handle = inner.tasks.spawn(
                    async move {
                        let result = server.run(listener).await;
                        if let Err(e) = &result {
                            tracing::error!(error = %e, "HTTP server error");
                        }
                        result
                    }
                    .in_current_span(),
                );
                running.server = Mutex::new(Some(handle));
            }
            Err(e) => {
                tracing::error!(
                    address = %config.listener.bind_address,
                    error = %e,
                    "Failed to bind listener, unwinding startup"
                );
                let deadline = Instant::now() + config.shutdown.deadline();
                if let Err(unwind) = shutdown::teardown(inner, &running, deadline).await {
                    tracing::warn!(error = %unwind, "Error while unwinding failed startup");
                }
                return Err(LifecycleError::startup("binding listener", e));
            }
        }
    }

    running.ingress.start_accepting();
    tracing::info!(address = ?running.local_addr, "Started");
    Ok(running)
}

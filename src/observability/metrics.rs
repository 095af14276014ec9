//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orchestrator_jobs_total` (counter): processed jobs by outcome
//! - `orchestrator_job_duration_seconds` (histogram): processing latency
//! - `orchestrator_submissions_rejected_total` (counter): rejected submissions by reason
//! - `orchestrator_queue_depth` (gauge): items waiting after the last submission
//! - `orchestrator_warm_cycles_total` (counter): completed cache warm cycles
//! - `orchestrator_warm_keys` (gauge): keys refreshed per cycle
//! - `orchestrator_shutdown_duration_seconds` (histogram): time spent in stop

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_job(outcome: &'static str, started: Instant) {
    counter!("orchestrator_jobs_total", "outcome" => outcome).increment(1);
    histogram!("orchestrator_job_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_rejected(reason: &'static str) {
    counter!("orchestrator_submissions_rejected_total", "reason" => reason).increment(1);
}

pub fn set_queue_depth(depth: usize) {
    gauge!("orchestrator_queue_depth").set(depth as f64);
}

pub fn record_warm_cycle(keys: usize) {
    counter!("orchestrator_warm_cycles_total").increment(1);
    gauge!("orchestrator_warm_keys").set(keys as f64);
}

pub fn record_shutdown(elapsed: Duration, clean: bool) {
    let result = if clean { "clean" } else { "error" };
    histogram!("orchestrator_shutdown_duration_seconds", "result" => result)
        .record(elapsed.as_secs_f64());
}

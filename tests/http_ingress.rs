//! HTTP ingress against a real listener.

use serde_json::{json, Value};
use std::time::Duration;

use shutdown_orchestrator::{Lifecycle, LifecycleState};

mod common;

use common::{components, test_config, DelayProcessor};

async fn started(processor: std::sync::Arc<DelayProcessor>) -> (Lifecycle, String) {
    let mut config = test_config(2);
    config.listener.enabled = true;
    config.listener.bind_address = "127.0.0.1:0".into();

    let lifecycle = Lifecycle::new(
        config.clone(),
        components(&config, processor),
        tracing::info_span!("test"),
    );
    lifecycle.start().await.unwrap();
    let addr = lifecycle.local_addr().unwrap();
    (lifecycle, format!("http://{addr}"))
}

#[tokio::test]
async fn serves_jobs_and_health() {
    let (lifecycle, base) = started(DelayProcessor::new(Duration::from_millis(5))).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    let response = client
        .post(format!("{base}/jobs"))
        .header("x-request-id", "6f1c2a9e-3d0b-4c55-9a8e-2b7f4d1e0c33")
        .json(&json!({ "key": "user:1", "payload": { "n": 1 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["x-request-id"],
        "6f1c2a9e-3d0b-4c55-9a8e-2b7f4d1e0c33"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["key"], "user:1");
    assert_eq!(body["payload"]["n"], 1);

    lifecycle.stop(Duration::from_secs(2)).await.unwrap();
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    assert_eq!(lifecycle.outstanding_tasks(), 0);
}

#[tokio::test]
async fn in_flight_request_completes_during_shutdown() {
    let processor =
        DelayProcessor::with_slow_key(Duration::from_millis(1), "slow", Duration::from_millis(300));
    let (lifecycle, base) = started(processor.clone()).await;

    let request = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("{base}/jobs"))
            .json(&json!({ "key": "slow" }))
            .send()
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    lifecycle.stop(Duration::from_secs(5)).await.unwrap();

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(processor.processed(), 1);
    assert_eq!(lifecycle.outstanding_tasks(), 0);
}

#[tokio::test]
async fn listener_refuses_connections_after_stop() {
    let (lifecycle, base) = started(DelayProcessor::new(Duration::ZERO)).await;
    lifecycle.stop(Duration::from_secs(2)).await.unwrap();

    let result = reqwest::Client::new()
        .get(format!("{base}/health"))
        .timeout(Duration::from_secs(1))
        .send()
        .await;
    assert!(result.is_err());
}

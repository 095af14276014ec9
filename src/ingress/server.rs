//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router (`POST /jobs`, `GET /health`)
//! - Wire up middleware (request ID, tracing)
//! - Serve until the ingress is stopped, then drain open connections

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::ingress::adapter::{Ingress, IngressError};
use crate::workers::{Job, JobOutput, RequestId};

const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<Ingress>,
}

/// Build the Axum router with all middleware layers.
pub fn build_router(ingress: Arc<Ingress>) -> Router {
    Router::new()
        .route("/jobs", post(submit_job))
        .route("/health", get(health))
        .with_state(AppState { ingress })
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP front end of the ingress adapter.
pub struct HttpServer {
    router: Router,
    ingress: Arc<Ingress>,
}

impl HttpServer {
    pub fn new(ingress: Arc<Ingress>) -> Self {
        Self {
            router: build_router(ingress.clone()),
            ingress,
        }
    }

    /// Serve on `listener` until the ingress stops accepting.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(self.ingress.closed())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn submit_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(job): Json<Job>,
) -> Result<Json<JobOutput>, IngressError> {
    let id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_default();

    tracing::debug!(request_id = %id, key = %job.key, "Job received");
    state.ingress.handle(id, job).await.map(Json)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.ingress.is_accepting() {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "draining" })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::cache::Cache;
    use crate::config::PoolConfig;
    use crate::workers::{SimulatedProcessor, WorkerPool};

    fn router() -> (Router, Arc<Ingress>, CancellationToken) {
        let root = CancellationToken::new();
        let processor = Arc::new(SimulatedProcessor::new(
            Duration::from_millis(1),
            Arc::new(Cache::new()),
        ));
        let pool = WorkerPool::start(&PoolConfig::default(), processor, &root);
        let ingress = Ingress::new(pool, Duration::from_secs(5));
        ingress.start_accepting();
        (build_router(ingress.clone()), ingress, root)
    }

    fn job_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/jobs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn job_round_trip_carries_request_id() {
        let (app, _ingress, _root) = router();
        let response = app
            .oneshot(job_request(r#"{"key":"k","payload":{"n":1}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["key"], "k");
        assert_eq!(json["payload"]["n"], 1);
        assert_eq!(json["request_id"], header_id);
    }

    #[tokio::test]
    async fn stopped_ingress_answers_503() {
        let (app, ingress, _root) = router();
        ingress.stop_accepting();

        let response = app
            .clone()
            .oneshot(job_request(r#"{"key":"k"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let health = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn malformed_body_is_client_error() {
        let (app, _ingress, _root) = router();
        let response = app.oneshot(job_request("{not json")).await.unwrap();
        assert!(response.status().is_client_error());
    }
}

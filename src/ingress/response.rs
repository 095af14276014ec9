//! Mapping of ingress outcomes to HTTP responses.
//!
//! - Rejections become 503 so clients treat them as transient
//! - Per-request timeouts become 504
//! - Job failures become 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ingress::adapter::IngressError;

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            IngressError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            IngressError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

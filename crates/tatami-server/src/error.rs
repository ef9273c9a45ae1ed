//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use tatami_types::error::GatewayError;

/// Wrapper that turns a [`GatewayError`] into an HTTP response.
///
/// Client-caused errors keep their message; server-side failures get a
/// generic body and full detail goes to the log only.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GatewayError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            GatewayError::Unauthorized(_) => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            GatewayError::NotFound(key) => {
                (StatusCode::NOT_FOUND, format!("conversation not found: {key}"))
            }
            GatewayError::UpstreamAgent(_) | GatewayError::Timeout { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "agent unavailable".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! Web chat and health endpoints.

use std::sync::OnceLock;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};
use tracing::info;

use tatami_channels::web::{self, ChatResponse};

use crate::ApiState;
use crate::error::ApiError;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Record the process start for the uptime readout.
pub(crate) fn mark_started() {
    STARTED_AT.get_or_init(Instant::now);
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    let uptime_secs = STARTED_AT
        .get()
        .map(|t| t.elapsed().as_secs())
        .unwrap_or(0);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime_secs,
    }))
}

/// `POST /chat`
///
/// Synchronous, unlike the provider webhooks: the caller waits for the
/// agent reply, and a dispatch failure surfaces as an HTTP error.
pub async fn chat(
    State(state): State<ApiState>,
    Json(req): Json<web::ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let inbound = web::normalize(&req)?;
    let session_id = inbound.session_key();

    let outbound = state.dispatcher.handle(&inbound).await?;

    info!(session_id = %session_id, "web chat turn served");
    Ok(Json(ChatResponse {
        reply: outbound.text,
        session_id,
    }))
}

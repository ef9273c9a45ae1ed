//! Web chat adapter.
//!
//! The web channel is the simplest one: the HTTP body *is* the message.
//! A caller-supplied `session_id` pins the conversation; without one a
//! fresh `web:{uuid}` key is minted per call and returned in the reply
//! so the caller can pin subsequent turns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tatami_types::error::{GatewayError, Result};
use tatami_types::event::{ChannelKind, InboundMessage};

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    #[serde(default)]
    pub message: String,

    /// Optional session identifier from a previous reply.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// The agent's reply.
    pub reply: String,

    /// Session key to pass back as `session_id` on the next turn.
    pub session_id: String,
}

/// Normalize a web chat request into the canonical inbound form.
///
/// Rejects a missing or blank `message` with
/// [`GatewayError::InvalidInput`]. Accepts the session id either bare or
/// as the full `web:`-prefixed key a previous response returned.
pub fn normalize(req: &ChatRequest) -> Result<InboundMessage> {
    let text = req.message.trim();
    if text.is_empty() {
        return Err(GatewayError::InvalidInput(
            "message must be a non-empty string".into(),
        ));
    }

    let peer_id = match req.session_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.strip_prefix("web:").unwrap_or(id).to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    Ok(InboundMessage::new(ChannelKind::Web, peer_id, text))
}

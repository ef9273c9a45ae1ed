//! WhatsApp channel adapter.
//!
//! Handles the Cloud API webhook handshake (`hub.challenge` echo),
//! normalizes inbound webhook payloads, and sends replies through
//! [`WhatsAppClient`].

mod client;
mod types;

pub use client::WhatsAppClient;
pub use types::{
    Change, ChangeValue, Contact, Entry, Profile, SendTextRequest, TextBody, WaMessage,
    WebhookPayload,
};

use serde::Deserialize;

use tatami_types::error::{GatewayError, Result};
use tatami_types::event::{ChannelKind, InboundMessage};
use tatami_types::secret::SecretString;

/// Query parameters of the webhook verification handshake.
///
/// Meta sends `GET /whatsapp/webhook?hub.mode=subscribe&hub.verify_token=...
/// &hub.challenge=...` when the webhook URL is registered.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

/// Validate the verification handshake and return the challenge to echo.
///
/// Fails with [`GatewayError::Unauthorized`] when the mode is not
/// `subscribe`, the token does not match, or no token is configured.
pub fn verify_challenge(params: &VerifyParams, expected: &SecretString) -> Result<String> {
    if expected.is_empty() {
        return Err(GatewayError::Unauthorized(
            "no verify token configured".into(),
        ));
    }
    if params.mode.as_deref() != Some("subscribe") {
        return Err(GatewayError::Unauthorized("unexpected hub.mode".into()));
    }
    if params.verify_token.as_deref() != Some(expected.expose()) {
        return Err(GatewayError::Unauthorized(
            "verify token mismatch".into(),
        ));
    }
    params
        .challenge
        .clone()
        .ok_or_else(|| GatewayError::Unauthorized("missing hub.challenge".into()))
}

/// Normalize a webhook payload into the canonical inbound form.
///
/// Takes the first text message of the first entry; status updates,
/// media messages, and empty payloads yield `None` and are acknowledged
/// upstream without processing.
pub fn normalize(payload: &WebhookPayload) -> Option<InboundMessage> {
    let value = &payload.entry.first()?.changes.first()?.value;
    let message = value.messages.first()?;
    let text = message.text.as_ref()?.body.trim();
    if text.is_empty() {
        return None;
    }

    let mut inbound = InboundMessage::new(ChannelKind::WhatsApp, message.from.clone(), text);

    if let Some(ref id) = message.id {
        inbound.metadata.insert("message_id".into(), id.clone().into());
    }
    if let Some(name) = value
        .contacts
        .first()
        .and_then(|c| c.profile.as_ref())
        .map(|p| p.name.trim())
        .filter(|n| !n.is_empty())
    {
        inbound
            .metadata
            .insert("profile_name".into(), name.to_string().into());
    }

    Some(inbound)
}

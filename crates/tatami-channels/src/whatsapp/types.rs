//! WhatsApp Cloud API types.
//!
//! Webhook payloads arrive deeply nested (`entry[].changes[].value`),
//! and Meta sends status updates through the same endpoint as user
//! messages, so every collection defaults to empty and text content is
//! optional.

use serde::{Deserialize, Serialize};

/// Top-level webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One webhook entry, scoped to a WhatsApp Business Account.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A single change notification.
#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

/// The body of a change: messages and sender contact info.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WaMessage>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// An inbound WhatsApp message.
#[derive(Debug, Clone, Deserialize)]
pub struct WaMessage {
    /// Sender phone number in international format, no `+`.
    pub from: String,
    /// Message kind: `"text"`, `"image"`, `"audio"`, etc.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Text content, present when `kind` is `"text"`.
    pub text: Option<TextBody>,
    /// Provider-assigned message identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Unix timestamp as a string, as the Cloud API sends it.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Text payload of a message.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Contact info delivered alongside messages.
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub wa_id: String,
    pub profile: Option<Profile>,
}

/// Sender profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
}

/// Request body for sending a text message via the Cloud API.
#[derive(Debug, Clone, Serialize)]
pub struct SendTextRequest {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: SendTextBody,
}

/// Text body of an outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct SendTextBody {
    pub body: String,
}

impl SendTextRequest {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: to.into(),
            kind: "text",
            text: SendTextBody { body: body.into() },
        }
    }
}

/// Response body from the send endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

/// One accepted outbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

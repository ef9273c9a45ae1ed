//! Telegram Bot API types.
//!
//! Models the subset of the Bot API used by the webhook intake and
//! [`TelegramClient`](super::client::TelegramClient). Webhook bodies in
//! the wild omit most fields, so everything beyond `chat.id` is
//! optional.

use serde::{Deserialize, Serialize};

/// Envelope for all Bot API responses.
///
/// Every method returns `{ ok: bool, result?: T, description?: String }`;
/// `description` carries the error message when `ok` is `false`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
    /// Whether the request was successful.
    pub ok: bool,
    /// The result payload, present when `ok` is `true`.
    pub result: Option<T>,
    /// Human-readable error description, present when `ok` is `false`.
    pub description: Option<String>,
}

/// An update delivered to the webhook endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier.
    #[serde(default)]
    pub update_id: Option<i64>,
    /// The message carried by this update, if any.
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Unique message identifier within the chat.
    #[serde(default)]
    pub message_id: Option<i64>,
    /// Sender of the message. Absent for channel posts.
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text content, if any.
    pub text: Option<String>,
    /// Unix timestamp of when the message was sent.
    #[serde(default)]
    pub date: Option<i64>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// User's first name.
    #[serde(default)]
    pub first_name: String,
    /// Username without the leading `@`, if set.
    pub username: Option<String>,
}

/// A Telegram chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Unique chat identifier -- the Telegram session key.
    pub id: i64,
    /// Chat type: `"private"`, `"group"`, `"supergroup"`, or `"channel"`.
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
}

/// Request body for the `sendMessage` method.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    /// Target chat identifier.
    pub chat_id: i64,
    /// Text of the message to send.
    pub text: String,
    /// Parse mode for formatting (e.g. `"HTML"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

//! Telegram channel adapter.
//!
//! Inbound messages arrive as Bot API `Update` objects posted to the
//! webhook; outbound replies go through [`TelegramClient::send_message`].
//! Long replies are split into several messages (paragraph, then
//! sentence boundaries) before delivery, capped at the Bot API's
//! 4096-character limit.

mod client;
mod split;
mod types;

pub use client::TelegramClient;
pub use split::{MAX_MESSAGE_LEN, PREFERRED_MESSAGE_LEN, split_reply};
pub use types::{Chat, Message, SendMessageRequest, TelegramResponse, Update, User};

use tatami_types::event::{ChannelKind, InboundMessage};

/// Normalize a webhook `Update` into the canonical inbound form.
///
/// Returns `None` for updates without a text message (stickers, photos,
/// channel posts, etc.); those are acknowledged upstream and dropped.
pub fn normalize(update: &Update) -> Option<InboundMessage> {
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }

    let mut inbound = InboundMessage::new(
        ChannelKind::Telegram,
        message.chat.id.to_string(),
        text,
    );

    if let Some(message_id) = message.message_id {
        inbound
            .metadata
            .insert("message_id".into(), message_id.into());
    }
    if let Some(ref from) = message.from {
        inbound
            .metadata
            .insert("sender_id".into(), from.id.to_string().into());
        if let Some(ref username) = from.username {
            inbound
                .metadata
                .insert("username".into(), username.clone().into());
        }
    }

    Some(inbound)
}

/// Whether the message text is the `/start` control command.
///
/// Matches `/start`, `/start@botname`, and `/start` with a deep-link
/// payload; those produce the canned welcome without a dispatch.
pub fn is_start_command(text: &str) -> bool {
    match text.trim().split_whitespace().next() {
        Some(first) => first == "/start" || first.starts_with("/start@"),
        None => false,
    }
}

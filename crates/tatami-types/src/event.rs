//! Canonical message events shared by every channel adapter.
//!
//! [`InboundMessage`] is the normalized form of user input arriving from
//! any channel; [`OutboundMessage`] is the agent reply heading back out.
//! The [`ChannelKind`] discriminant keeps the dispatcher channel-agnostic
//! while adapters translate to and from wire formats at the boundary.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The channel a message travels through.
///
/// Serialized with the short tags used in session keys and the persisted
/// turn log: `"web"`, `"wa"`, `"tg"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Direct web chat (`POST /chat`).
    #[serde(rename = "web")]
    Web,
    /// WhatsApp Cloud API webhook.
    #[serde(rename = "wa")]
    WhatsApp,
    /// Telegram Bot API webhook.
    #[serde(rename = "tg")]
    Telegram,
}

impl ChannelKind {
    /// The short wire tag for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Web => "web",
            ChannelKind::WhatsApp => "wa",
            ChannelKind::Telegram => "tg",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "web" => Ok(ChannelKind::Web),
            "wa" => Ok(ChannelKind::WhatsApp),
            "tg" => Ok(ChannelKind::Telegram),
            other => Err(format!("unknown channel '{other}'")),
        }
    }
}

/// A normalized inbound message.
///
/// `peer_id` is the channel-local conversation identifier: the web
/// client id, the WhatsApp sender number, or the Telegram chat id.
/// Use [`session_key`](InboundMessage::session_key) to derive the
/// stable key used by the session store and the turn log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Originating channel.
    pub channel: ChannelKind,

    /// Channel-local conversation identifier.
    pub peer_id: String,

    /// User-visible message text.
    pub text: String,

    /// When the message was received.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Arbitrary channel-specific metadata, opaque to the dispatcher.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InboundMessage {
    /// Build an inbound message with the current timestamp and no metadata.
    pub fn new(channel: ChannelKind, peer_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel,
            peer_id: peer_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Stable session key: `"{channel}:{peer_id}"`.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.peer_id)
    }
}

/// A normalized outbound reply.
///
/// Produced by the dispatcher; each adapter renders it into the
/// channel's wire format (HTTP JSON body, Graph API call, Bot API call).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Target channel.
    pub channel: ChannelKind,

    /// Channel-local conversation identifier to deliver to.
    pub peer_id: String,

    /// Reply text.
    pub text: String,
}

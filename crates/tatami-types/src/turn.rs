//! Completed conversation turns and derived chat summaries.
//!
//! A [`Turn`] is one request/response exchange. Turns are immutable once
//! created and the persisted log is append-only; [`ChatSummary`] rows are
//! always derived from the log by aggregation, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{ChannelKind, InboundMessage};

/// One completed request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Session key, `"{channel}:{peer_id}"`.
    pub session_key: String,

    /// Channel the turn travelled through.
    pub channel: ChannelKind,

    /// Channel-local user identifier (web client id, sender number, chat id).
    pub user_id: String,

    /// The user's message text.
    pub user_text: String,

    /// The agent's reply text.
    pub reply_text: String,

    /// When the turn completed.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Build a completed turn from the inbound message and the agent reply.
    pub fn from_exchange(inbound: &InboundMessage, reply: impl Into<String>) -> Self {
        Self {
            session_key: inbound.session_key(),
            channel: inbound.channel,
            user_id: inbound.peer_id.clone(),
            user_text: inbound.text.clone(),
            reply_text: reply.into(),
            created_at: Utc::now(),
        }
    }
}

/// Aggregated view of one conversation, for the admin listing.
///
/// Computed at read time with a GROUP BY over the turn log, so it always
/// reflects the latest persisted turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Session key identifying the conversation.
    pub session_key: String,

    /// Channel of the conversation.
    pub channel: ChannelKind,

    /// Channel-local user identifier.
    pub user_id: String,

    /// The most recent user message.
    pub last_message: String,

    /// Total persisted turns for this session.
    pub total_turns: i64,

    /// Timestamp of the most recent turn.
    pub updated_at: DateTime<Utc>,
}

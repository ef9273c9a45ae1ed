//! # tatami-channels
//!
//! Channel adapters for the tatami gateway. Each adapter is a pure
//! translation layer at the boundary: it normalizes a channel-specific
//! inbound payload into the canonical
//! [`InboundMessage`](tatami_types::event::InboundMessage) and renders
//! replies back into the channel's wire format.
//!
//! - **[`web`]** -- direct JSON chat body (`POST /chat`)
//! - **[`whatsapp`]** -- Graph API webhook payloads, webhook
//!   verification, and the Cloud API send client
//! - **[`telegram`]** -- Bot API webhook payloads, reply splitting, and
//!   the Bot API send client

pub mod telegram;
pub mod web;
pub mod whatsapp;

//! # tatami-types
//!
//! Core type definitions for the tatami chat gateway.
//!
//! This crate is the foundation of the dependency graph -- all other
//! tatami crates depend on it. It contains:
//!
//! - **[`error`]** -- [`GatewayError`] and [`ChannelError`] error types
//! - **[`config`]** -- Configuration schema, loaded from the environment
//! - **[`event`]** -- Canonical inbound/outbound message events
//! - **[`turn`]** -- Completed conversation turns and derived summaries
//! - **[`secret`]** -- Redacting wrapper for tokens and API keys

pub mod config;
pub mod error;
pub mod event;
pub mod secret;
pub mod turn;

pub use error::{ChannelError, GatewayError, Result};
pub use event::{ChannelKind, InboundMessage, OutboundMessage};
pub use secret::SecretString;
pub use turn::{ChatSummary, Turn};

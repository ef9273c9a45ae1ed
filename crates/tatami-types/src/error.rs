//! Error types for the tatami gateway.
//!
//! [`GatewayError`] is the top-level error; [`ChannelError`] covers
//! messaging-provider failures and converts into it. Both are
//! non-exhaustive so variants can be added without breaking downstream.

use thiserror::Error;

/// Top-level error type for the tatami gateway.
///
/// Variants map onto the HTTP surface: `InvalidInput` becomes 400,
/// `Unauthorized` 403, `NotFound` 404, and the rest 500 -- except on
/// provider webhooks, where dispatch failures are acknowledged with 200
/// and routed through logging instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// The request body is malformed or missing required fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Webhook verification token did not match.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The agent backend returned an error or a malformed response.
    #[error("upstream agent failure: {0}")]
    UpstreamAgent(String),

    /// An operation exceeded its deadline.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Human-readable name of the operation that timed out.
        operation: String,
    },

    /// A persistence read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The requested conversation does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A channel-layer error bubbled up.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messaging-provider error type.
///
/// Used by the Telegram and WhatsApp clients to report failures in
/// connecting, authenticating, or delivering messages.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChannelError {
    /// Failed to reach the provider API.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Delivering an outbound message failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Reading or decoding a provider response failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Catch-all for errors that do not fit other variants.
    #[error("{0}")]
    Other(String),
}

/// A convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GatewayError>;

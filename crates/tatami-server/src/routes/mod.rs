//! HTTP route handlers.

pub mod admin;
pub mod chat;
pub mod webhooks;

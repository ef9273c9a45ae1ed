//! HTTP surface of the tatami gateway.
//!
//! [`build_router`] assembles the axum application over an [`ApiState`]:
//! the web chat endpoint, the provider webhooks, the admin queries, and
//! health. The binary in `main.rs` wires the state from configuration;
//! tests build it with scripted collaborators.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tatami_channels::telegram::TelegramClient;
use tatami_channels::whatsapp::WhatsAppClient;
use tatami_core::Dispatcher;
use tatami_store::TurnStore;
use tatami_types::config::GatewayConfig;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    /// The conversation dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Read side of the turn log, for the admin queries.
    pub store: TurnStore,
    /// Telegram delivery client; `None` when no bot token is configured.
    pub telegram: Option<Arc<TelegramClient>>,
    /// WhatsApp delivery client; `None` when no access token is configured.
    pub whatsapp: Option<Arc<WhatsAppClient>>,
    /// Full gateway configuration.
    pub config: Arc<GatewayConfig>,
}

/// Build the gateway router.
pub fn build_router(state: ApiState) -> Router {
    routes::chat::mark_started();

    Router::new()
        .route("/health", get(routes::chat::health))
        .route("/chat", post(routes::chat::chat))
        .route(
            "/whatsapp/webhook",
            get(routes::webhooks::verify_whatsapp).post(routes::webhooks::whatsapp_webhook),
        )
        .route("/telegram/webhook", post(routes::webhooks::telegram_webhook))
        .route("/admin/chats", get(routes::admin::list_chats))
        .route("/admin/chats/{id}", get(routes::admin::get_chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

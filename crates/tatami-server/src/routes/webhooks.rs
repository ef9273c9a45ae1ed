//! Provider webhook endpoints.
//!
//! Both providers get an immediate `200 {"status":"sent"}` ack and the
//! actual work happens in a spawned task: Meta and Telegram both retry
//! aggressively on slow responses, and a user-visible error has nowhere
//! to go on a webhook anyway. Dispatch failures turn into the configured
//! fallback reply; delivery failures are logged and dropped.

use axum::Json;
use axum::extract::{Query, State};
use serde_json::{Value, json};
use tracing::{info, warn};

use tatami_channels::telegram::{self, Update};
use tatami_channels::whatsapp::{self, VerifyParams, WebhookPayload};
use tatami_types::event::InboundMessage;

use crate::ApiState;
use crate::error::ApiError;

/// `GET /whatsapp/webhook` -- Meta's registration handshake.
pub async fn verify_whatsapp(
    State(state): State<ApiState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, ApiError> {
    let challenge = whatsapp::verify_challenge(&params, &state.config.whatsapp.verify_token)?;
    info!("whatsapp webhook verified");
    Ok(challenge)
}

/// `POST /whatsapp/webhook`
pub async fn whatsapp_webhook(
    State(state): State<ApiState>,
    Json(payload): Json<WebhookPayload>,
) -> Json<Value> {
    tokio::spawn(process_whatsapp(state, payload));
    Json(json!({ "status": "sent" }))
}

/// `POST /telegram/webhook`
pub async fn telegram_webhook(
    State(state): State<ApiState>,
    Json(update): Json<Update>,
) -> Json<Value> {
    tokio::spawn(process_telegram(state, update));
    Json(json!({ "status": "sent" }))
}

/// Background processing for one WhatsApp webhook delivery.
pub(crate) async fn process_whatsapp(state: ApiState, payload: WebhookPayload) {
    let Some(inbound) = whatsapp::normalize(&payload) else {
        return;
    };

    let allowed = &state.config.whatsapp.allowed_numbers;
    if !allowed.is_empty() && !allowed.iter().any(|n| n == &inbound.peer_id) {
        warn!(sender = %inbound.peer_id, "whatsapp sender not in allow-list, ignoring");
        return;
    }

    let Some(client) = state.whatsapp.clone() else {
        warn!("whatsapp message received but no client configured");
        return;
    };

    let reply = dispatch_or_fallback(&state, &inbound).await;
    if let Err(e) = client.send_text(&inbound.peer_id, &reply).await {
        warn!(sender = %inbound.peer_id, error = %e, "whatsapp delivery failed");
    }
}

/// Background processing for one Telegram webhook delivery.
pub(crate) async fn process_telegram(state: ApiState, update: Update) {
    let Some(inbound) = telegram::normalize(&update) else {
        return;
    };
    let Ok(chat_id) = inbound.peer_id.parse::<i64>() else {
        warn!(peer_id = %inbound.peer_id, "telegram chat id is not numeric");
        return;
    };
    let Some(client) = state.telegram.clone() else {
        warn!("telegram message received but no client configured");
        return;
    };

    // /start gets the canned welcome, no agent involved.
    if telegram::is_start_command(&inbound.text) {
        if let Err(e) = client
            .send_message(chat_id, &state.config.telegram.welcome_text)
            .await
        {
            warn!(chat_id, error = %e, "telegram welcome delivery failed");
        }
        return;
    }

    let reply = dispatch_or_fallback(&state, &inbound).await;
    for part in telegram::split_reply(&reply) {
        if let Err(e) = client.send_message(chat_id, &part).await {
            warn!(chat_id, error = %e, "telegram delivery failed");
            return;
        }
    }
}

/// Run the dispatch, degrading to the configured fallback reply.
async fn dispatch_or_fallback(state: &ApiState, inbound: &InboundMessage) -> String {
    match state.dispatcher.handle(inbound).await {
        Ok(outbound) => outbound.text,
        Err(e) => {
            warn!(
                session_key = %inbound.session_key(),
                error = %e,
                "dispatch failed, sending fallback reply"
            );
            state.config.fallback_reply.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use tatami_channels::telegram::TelegramClient;
    use tatami_channels::whatsapp::WhatsAppClient;
    use tatami_core::{Agent, Dispatcher, SessionStore};
    use tatami_store::{TurnRecorder, TurnStore};
    use tatami_types::config::GatewayConfig;
    use tatami_types::error::{GatewayError, Result as GatewayResult};
    use tatami_types::event::ChannelKind;
    use tatami_types::turn::Turn;

    /// Agent that counts calls and answers a fixed reply, or always fails.
    struct ScriptedAgent {
        calls: AtomicUsize,
        reply: Option<String>,
    }

    impl ScriptedAgent {
        fn answering(reply: impl Into<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Some(reply.into()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: None,
            }
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn reply(
            &self,
            _text: &str,
            _context: &[Turn],
            _channel: ChannelKind,
        ) -> GatewayResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(GatewayError::UpstreamAgent("scripted failure".into())),
            }
        }
    }

    struct Rig {
        state: ApiState,
        store: TurnStore,
        shutdown: CancellationToken,
        recorder_task: tokio::task::JoinHandle<()>,
    }

    impl Rig {
        async fn drain(self) -> TurnStore {
            self.shutdown.cancel();
            self.recorder_task.await.unwrap();
            self.store
        }
    }

    async fn rig(
        agent: Arc<dyn Agent>,
        config: GatewayConfig,
        telegram: Option<Arc<TelegramClient>>,
        whatsapp: Option<Arc<WhatsAppClient>>,
    ) -> Rig {
        let store = TurnStore::connect("sqlite::memory:").await.unwrap();
        let shutdown = CancellationToken::new();
        let (recorder, recorder_task) = TurnRecorder::spawn(store.clone(), shutdown.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            agent,
            Arc::new(SessionStore::new(10)),
            Arc::new(recorder),
            Duration::from_millis(200),
            Duration::from_millis(1),
        ));
        let state = ApiState {
            dispatcher,
            store: store.clone(),
            telegram,
            whatsapp,
            config: Arc::new(config),
        };
        Rig {
            state,
            store,
            shutdown,
            recorder_task,
        }
    }

    fn tg_update(text: &str) -> Update {
        serde_json::from_value(json!({
            "message": {"chat": {"id": 777}, "text": text}
        }))
        .unwrap()
    }

    fn wa_payload(from: &str, text: &str) -> WebhookPayload {
        serde_json::from_value(json!({
            "entry": [{"changes": [{"value": {
                "messages": [{"from": from, "type": "text", "text": {"body": text}}]
            }}]}]
        }))
        .unwrap()
    }

    fn wa_config(api_url: &str) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.whatsapp.phone_number_id = "1099990000".into();
        config.whatsapp.access_token = "EAAtoken".into();
        config.whatsapp.api_url = api_url.into();
        config
    }

    fn telegram_ok_body() -> &'static str {
        r#"{"ok": true, "result": {"message_id": 1, "chat": {"id": 777}}}"#
    }

    #[tokio::test]
    async fn telegram_start_sends_welcome_without_dispatch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sendMessage")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["chat_id"] == 777
                    && body["text"].as_str().is_some_and(|t| t.contains("asistente"))
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(telegram_ok_body())
            .create_async()
            .await;

        let agent = Arc::new(ScriptedAgent::answering("nunca"));
        let client = Arc::new(TelegramClient::with_base_url(server.url()));
        let r = rig(agent.clone(), GatewayConfig::default(), Some(client), None).await;

        process_telegram(r.state.clone(), tg_update("/start")).await;

        mock.assert_async().await;
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);

        // A control command leaves no trace in the turn log.
        let store = r.drain().await;
        let (_, total) = store.list_chats(&Default::default()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn telegram_dispatch_failure_delivers_fallback() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sendMessage")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["text"].as_str().is_some_and(|t| t.contains("Disculpa"))
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(telegram_ok_body())
            .create_async()
            .await;

        let agent = Arc::new(ScriptedAgent::failing());
        let client = Arc::new(TelegramClient::with_base_url(server.url()));
        let r = rig(agent.clone(), GatewayConfig::default(), Some(client), None).await;

        process_telegram(r.state.clone(), tg_update("hola")).await;

        mock.assert_async().await;
        // Initial attempt plus the single retry.
        assert_eq!(agent.calls.load(Ordering::SeqCst), 2);

        let store = r.drain().await;
        let (_, total) = store.list_chats(&Default::default()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn telegram_long_reply_is_delivered_in_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(telegram_ok_body())
            .expect(3)
            .create_async()
            .await;

        // 1300 unbroken chars split into three parts.
        let agent = Arc::new(ScriptedAgent::answering("x".repeat(1300)));
        let client = Arc::new(TelegramClient::with_base_url(server.url()));
        let r = rig(agent, GatewayConfig::default(), Some(client), None).await;

        process_telegram(r.state.clone(), tg_update("cuéntame todo")).await;

        mock.assert_async().await;
        let store = r.drain().await;
        assert_eq!(store.get_chat("tg:777").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn whatsapp_reply_is_delivered_and_turn_persisted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v21.0/1099990000/messages")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["to"] == "5215550001111" && body["text"]["body"] == "claro que sí"
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": [{"id": "wamid.OUT1"}]}"#)
            .create_async()
            .await;

        let config = wa_config(&server.url());
        let client = Arc::new(WhatsAppClient::new(&config.whatsapp));
        let agent = Arc::new(ScriptedAgent::answering("claro que sí"));
        let r = rig(agent, config, None, Some(client)).await;

        process_whatsapp(r.state.clone(), wa_payload("5215550001111", "¿hay promos?")).await;

        mock.assert_async().await;
        let store = r.drain().await;
        let turns = store.get_chat("wa:5215550001111").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "¿hay promos?");
        assert_eq!(turns[0].reply_text, "claro que sí");
    }

    #[tokio::test]
    async fn whatsapp_allow_list_filters_unknown_sender() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v21.0/1099990000/messages")
            .expect(0)
            .create_async()
            .await;

        let mut config = wa_config(&server.url());
        config.whatsapp.allowed_numbers = vec!["5215550001111".into()];
        let client = Arc::new(WhatsAppClient::new(&config.whatsapp));
        let agent = Arc::new(ScriptedAgent::answering("hola"));
        let r = rig(agent.clone(), config, None, Some(client)).await;

        process_whatsapp(r.state.clone(), wa_payload("5215559999999", "hola")).await;

        // Filtered before dispatch: no agent call, no delivery, no turn.
        mock.assert_async().await;
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
        let store = r.drain().await;
        let (_, total) = store.list_chats(&Default::default()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn whatsapp_allowed_sender_passes_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v21.0/1099990000/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": [{"id": "wamid.OUT2"}]}"#)
            .create_async()
            .await;

        let mut config = wa_config(&server.url());
        config.whatsapp.allowed_numbers = vec!["5215550001111".into()];
        let client = Arc::new(WhatsAppClient::new(&config.whatsapp));
        let agent = Arc::new(ScriptedAgent::answering("hola"));
        let r = rig(agent, config, None, Some(client)).await;

        process_whatsapp(r.state.clone(), wa_payload("5215550001111", "hola")).await;

        mock.assert_async().await;
        let store = r.drain().await;
        assert_eq!(store.get_chat("wa:5215550001111").await.unwrap().len(), 1);
    }
}

//! Agent collaborator seam.
//!
//! [`Agent`] is the trait the dispatcher talks to; retrieval, tool use,
//! and the LLM call are opaque behind it. [`HttpAgent`] is the
//! production implementation: an OpenAI-compatible `/chat/completions`
//! call that replays the session context as alternating user/assistant
//! messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tatami_types::config::AgentConfig;
use tatami_types::error::{GatewayError, Result};
use tatami_types::event::ChannelKind;
use tatami_types::turn::Turn;

/// The external agent collaborator.
///
/// `context` holds the session's prior turns, oldest first. `channel`
/// is passed through so the backend can adjust tone or locale; the
/// dispatcher itself never interprets it.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Produce a reply to `text` given the session context.
    async fn reply(&self, text: &str, context: &[Turn], channel: ChannelKind) -> Result<String>;
}

/// One message in the chat-completions request.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

/// Response body for `/chat/completions`, reduced to what we read.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible HTTP agent backend.
///
/// The base URL comes from [`AgentConfig`], so tests can point it at a
/// local mock server.
pub struct HttpAgent {
    http: Client,
    config: AgentConfig,
}

impl HttpAgent {
    /// Create an agent client from its configuration.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Assemble the message list: system prompt, replayed context,
    /// then the new user message.
    fn build_messages(&self, text: &str, context: &[Turn], channel: ChannelKind) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(context.len() * 2 + 2);
        messages.push(ChatMessage {
            role: "system",
            content: format!("{}\n\nCanal: {channel}", self.config.system_prompt),
        });
        for turn in context {
            messages.push(ChatMessage {
                role: "user",
                content: turn.user_text.clone(),
            });
            messages.push(ChatMessage {
                role: "assistant",
                content: turn.reply_text.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: text.to_owned(),
        });
        messages
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn reply(&self, text: &str, context: &[Turn], channel: ChannelKind) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let req = CompletionRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(text, context, channel),
        };

        debug!(
            model = %req.model,
            messages = req.messages.len(),
            "calling agent backend"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose())
            .json(&req)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamAgent(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamAgent(format!(
                "backend returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::UpstreamAgent(format!("malformed completion: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GatewayError::UpstreamAgent("completion had no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tatami_types::event::InboundMessage;

    fn agent_for(server: &mockito::ServerGuard) -> HttpAgent {
        HttpAgent::new(AgentConfig {
            base_url: server.url(),
            ..Default::default()
        })
    }

    fn context_turn(text: &str, reply: &str) -> Turn {
        let inbound = InboundMessage::new(ChannelKind::Web, "c1", text);
        Turn::from_exchange(&inbound, reply)
    }

    #[tokio::test]
    async fn reply_returns_completion_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"El curso cuesta 50 USD."}}]}"#,
            )
            .create_async()
            .await;

        let agent = agent_for(&server);
        let reply = agent
            .reply("¿Cuánto cuesta el curso?", &[], ChannelKind::Web)
            .await
            .unwrap();
        assert_eq!(reply, "El curso cuesta 50 USD.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reply_replays_context_as_message_pairs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                let messages = body["messages"].as_array().unwrap();
                // system + 2 context turns * 2 + new user message
                messages.len() == 6
                    && messages[0]["role"] == "system"
                    && messages[1]["role"] == "user"
                    && messages[2]["role"] == "assistant"
                    && messages[5]["content"] == "¿y los horarios?"
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Entre semana por la tarde."}}]}"#)
            .create_async()
            .await;

        let context = vec![
            context_turn("hola", "¡hola!"),
            context_turn("¿qué cursos hay?", "defensa personal y judo"),
        ];

        let agent = agent_for(&server);
        let reply = agent
            .reply("¿y los horarios?", &context, ChannelKind::Telegram)
            .await
            .unwrap();
        assert_eq!(reply, "Entre semana por la tarde.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reply_system_prompt_carries_channel_tag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["messages"][0]["content"]
                    .as_str()
                    .is_some_and(|c| c.ends_with("Canal: wa"))
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let agent = agent_for(&server);
        agent.reply("hola", &[], ChannelKind::WhatsApp).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let agent = agent_for(&server);
        let err = agent.reply("hola", &[], ChannelKind::Web).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamAgent(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn empty_choices_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let agent = agent_for(&server);
        let err = agent.reply("hola", &[], ChannelKind::Web).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamAgent(_)));
    }

    #[tokio::test]
    async fn blank_content_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"   "}}]}"#)
            .create_async()
            .await;

        let agent = agent_for(&server);
        assert!(agent.reply("hola", &[], ChannelKind::Web).await.is_err());
    }
}

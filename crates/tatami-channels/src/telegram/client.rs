//! HTTP client for the Telegram Bot API.
//!
//! Covers the two methods the gateway needs: `sendMessage` for outbound
//! replies and `getMe` for startup token verification.

use reqwest::Client;
use tracing::debug;

use tatami_types::error::ChannelError;
use tatami_types::secret::SecretString;

use super::types::{Message, SendMessageRequest, TelegramResponse, User};

/// Typed wrapper over the Bot API.
pub struct TelegramClient {
    http: Client,
    /// `https://api.telegram.org/bot{token}` by default.
    base_url: String,
}

impl TelegramClient {
    /// Create a client for the given bot token.
    pub fn new(token: &SecretString) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("https://api.telegram.org/bot{}", token.expose()),
        }
    }

    /// Create a client pointing at a custom base URL.
    ///
    /// Production construction goes through [`TelegramClient::new`]; this
    /// lets callers aim the client at a local mock server.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Send a text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, ChannelError> {
        let url = format!("{}/sendMessage", self.base_url);
        let req = SendMessageRequest {
            chat_id,
            text: text.to_owned(),
            parse_mode: None,
        };

        debug!(chat_id, text_len = text.len(), "sending telegram message");

        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        let body: TelegramResponse<Message> = resp
            .json()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if !body.ok {
            let desc = body.description.unwrap_or_else(|| "unknown error".into());
            return Err(ChannelError::SendFailed(desc));
        }

        body.result
            .ok_or_else(|| ChannelError::SendFailed("missing result in response".into()))
    }

    /// Verify the bot token via `getMe`.
    pub async fn get_me(&self) -> Result<User, ChannelError> {
        let url = format!("{}/getMe", self.base_url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;

        let body: TelegramResponse<User> = resp
            .json()
            .await
            .map_err(|e| ChannelError::AuthFailed(e.to_string()))?;

        if !body.ok {
            let desc = body.description.unwrap_or_else(|| "unauthorized".into());
            return Err(ChannelError::AuthFailed(desc));
        }

        body.result
            .ok_or_else(|| ChannelError::AuthFailed("missing result in response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_embeds_token() {
        let client = TelegramClient::new(&SecretString::new("123:ABC"));
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:ABC");
    }

    #[tokio::test]
    async fn send_message_posts_to_bot_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sendMessage")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["chat_id"] == 42 && body["text"] == "hola"
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"message_id": 7, "chat": {"id": 42}}}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_base_url(server.url());
        let sent = client.send_message(42, "hola").await.unwrap();
        assert_eq!(sent.message_id, Some(7));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_message_maps_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_base_url(server.url());
        let err = client.send_message(42, "hola").await.unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed(_)));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn get_me_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/getMe")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "description": "Unauthorized"}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_base_url(server.url());
        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, ChannelError::AuthFailed(_)));
    }
}

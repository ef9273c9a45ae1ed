//! HTTP client for the WhatsApp Cloud API.

use reqwest::Client;
use tracing::debug;

use tatami_types::config::WhatsAppConfig;
use tatami_types::error::ChannelError;
use tatami_types::secret::SecretString;

use super::types::{SendResponse, SendTextRequest};

/// Typed wrapper over the Cloud API send endpoint.
pub struct WhatsAppClient {
    http: Client,
    /// Graph API root, `https://graph.facebook.com` in production.
    api_url: String,
    api_version: String,
    phone_number_id: String,
    access_token: SecretString,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
            api_version: config.api_version.clone(),
            phone_number_id: config.phone_number_id.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.api_url, self.api_version, self.phone_number_id
        )
    }

    /// Send a text message, returning the provider message id.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, ChannelError> {
        let req = SendTextRequest::text(to, body);

        debug!(to, body_len = body.len(), "sending whatsapp message");

        let resp = self
            .http
            .post(self.messages_url())
            .bearer_auth(self.access_token.expose())
            .json(&req)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!(
                "cloud api returned {status}: {detail}"
            )));
        }

        let body: SendResponse = resp
            .json()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        body.messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| ChannelError::SendFailed("no message id in response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            phone_number_id: "1099990000".into(),
            access_token: SecretString::new("EAAtoken"),
            verify_token: SecretString::new("verify"),
            api_url: api_url.into(),
            api_version: "v21.0".into(),
            allowed_numbers: Vec::new(),
        }
    }

    #[test]
    fn messages_url_layout() {
        let client = WhatsAppClient::new(&config("https://graph.facebook.com"));
        assert_eq!(
            client.messages_url(),
            "https://graph.facebook.com/v21.0/1099990000/messages"
        );
    }

    #[tokio::test]
    async fn send_text_posts_cloud_api_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v21.0/1099990000/messages")
            .match_header("authorization", "Bearer EAAtoken")
            .match_request(|req| {
                let body: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
                body["messaging_product"] == "whatsapp"
                    && body["to"] == "5215550001111"
                    && body["type"] == "text"
                    && body["text"]["body"] == "¡Hola Luisa!"
            })
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": [{"id": "wamid.OUT1"}]}"#)
            .create_async()
            .await;

        let client = WhatsAppClient::new(&config(&server.url()));
        let id = client
            .send_text("5215550001111", "¡Hola Luisa!")
            .await
            .unwrap();
        assert_eq!(id, "wamid.OUT1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_text_maps_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v21.0/1099990000/messages")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Invalid OAuth access token"}}"#)
            .create_async()
            .await;

        let client = WhatsAppClient::new(&config(&server.url()));
        let err = client.send_text("5215550001111", "hola").await.unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn send_text_requires_message_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v21.0/1099990000/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": []}"#)
            .create_async()
            .await;

        let client = WhatsAppClient::new(&config(&server.url()));
        let err = client.send_text("5215550001111", "hola").await.unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed(_)));
    }
}

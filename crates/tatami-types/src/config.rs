//! Gateway configuration schema.
//!
//! All values have serde defaults, so a config can be deserialized from a
//! partial JSON document or assembled from environment variables via
//! [`GatewayConfig::from_env`]. The environment reader goes through an
//! injectable lookup closure so tests never touch process globals.

use serde::{Deserialize, Serialize};

use crate::secret::SecretString;

/// Top-level configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite connection URL for the turn log.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum turns kept in the in-memory context window per session.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Agent backend settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Generic reply sent to the user when dispatch fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

// The serde field defaults only apply during deserialization, so
// `Default` is spelled out against the same `default_*` functions.
impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: default_database_url(),
            context_window: default_context_window(),
            agent: AgentConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            telegram: TelegramConfig::default(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Settings for the external agent backend (OpenAI-compatible
/// chat-completions endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// API base URL, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    /// API key for the agent backend.
    #[serde(default)]
    pub api_key: SecretString,

    /// Model name passed through to the backend.
    #[serde(default = "default_agent_model")]
    pub model: String,

    /// System prompt prepended to every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Deadline for a single agent call, in seconds.
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed backoff before the single retry, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_base_url(),
            api_key: SecretString::default(),
            model: default_agent_model(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_agent_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// WhatsApp Business phone number ID.
    #[serde(default)]
    pub phone_number_id: String,

    /// Graph API access token.
    #[serde(default)]
    pub access_token: SecretString,

    /// Webhook verify token compared against `hub.verify_token`.
    #[serde(default)]
    pub verify_token: SecretString,

    /// Graph API base URL.
    #[serde(default = "default_graph_api_url")]
    pub api_url: String,

    /// Graph API version segment.
    #[serde(default = "default_graph_api_version")]
    pub api_version: String,

    /// Allowed sender numbers. Empty = allow all.
    #[serde(default)]
    pub allowed_numbers: Vec<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            phone_number_id: String::new(),
            access_token: SecretString::default(),
            verify_token: SecretString::default(),
            api_url: default_graph_api_url(),
            api_version: default_graph_api_version(),
            allowed_numbers: Vec::new(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token.
    #[serde(default)]
    pub bot_token: SecretString,

    /// Canned reply to the `/start` command.
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: SecretString::default(),
            welcome_text: default_welcome_text(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "sqlite://tatami.db".into()
}
fn default_context_window() -> usize {
    10
}
fn default_agent_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_agent_model() -> String {
    "gpt-4o-mini".into()
}
fn default_system_prompt() -> String {
    "Eres el asistente comercial de la academia. Responde en español, \
     de forma breve y amable, sobre cursos, categorías y promociones."
        .into()
}
fn default_agent_timeout_secs() -> u64 {
    15
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_graph_api_url() -> String {
    "https://graph.facebook.com".into()
}
fn default_graph_api_version() -> String {
    "v21.0".into()
}
fn default_welcome_text() -> String {
    "¡Hola! 👋 Soy el asistente de la academia. Pregúntame por nuestros \
     cursos, horarios y promociones."
        .into()
}
fn default_fallback_reply() -> String {
    "🤖 Disculpa, tuve un problema procesando tu mensaje. \
     ¿Podrías intentar de nuevo?"
        .into()
}

impl GatewayConfig {
    /// Assemble a config from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Assemble a config from an arbitrary variable lookup.
    ///
    /// Unset or unparsable values fall back to the field default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("TATAMI_HOST") {
            cfg.server.host = v;
        }
        if let Some(v) = lookup("TATAMI_PORT").and_then(|v| v.parse().ok()) {
            cfg.server.port = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            cfg.database_url = v;
        }
        if let Some(v) = lookup("CONTEXT_WINDOW").and_then(|v| v.parse().ok()) {
            cfg.context_window = v;
        }

        if let Some(v) = lookup("AGENT_BASE_URL") {
            cfg.agent.base_url = v;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            cfg.agent.api_key = SecretString::new(v);
        }
        if let Some(v) = lookup("AGENT_MODEL") {
            cfg.agent.model = v;
        }
        if let Some(v) = lookup("SYSTEM_PROMPT") {
            cfg.agent.system_prompt = v;
        }
        if let Some(v) = lookup("AGENT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            cfg.agent.timeout_secs = v;
        }
        if let Some(v) = lookup("AGENT_RETRY_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            cfg.agent.retry_backoff_ms = v;
        }

        if let Some(v) = lookup("PHONE_ID") {
            cfg.whatsapp.phone_number_id = v;
        }
        if let Some(v) = lookup("ACCESS_TOKEN") {
            cfg.whatsapp.access_token = SecretString::new(v);
        }
        if let Some(v) = lookup("VERIFY_TOKEN") {
            cfg.whatsapp.verify_token = SecretString::new(v);
        }
        if let Some(v) = lookup("GRAPH_API_URL") {
            cfg.whatsapp.api_url = v;
        }
        if let Some(v) = lookup("GRAPH_API_VERSION") {
            cfg.whatsapp.api_version = v;
        }
        if let Some(v) = lookup("WHATSAPP_ALLOWED_NUMBERS") {
            cfg.whatsapp.allowed_numbers = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = lookup("TELEGRAM_BOT_TOKEN") {
            cfg.telegram.bot_token = SecretString::new(v);
        }
        if let Some(v) = lookup("TELEGRAM_WELCOME") {
            cfg.telegram.welcome_text = v;
        }

        if let Some(v) = lookup("FALLBACK_REPLY") {
            cfg.fallback_reply = v;
        }

        cfg
    }
}

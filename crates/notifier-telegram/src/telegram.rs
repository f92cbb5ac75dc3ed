//! Telegram Bot API `sendMessage` delivery.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use oi_alert_core::{Notifier, TelegramConfig, TelegramCredentials};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Posts alert messages to one Telegram chat.
pub struct TelegramNotifier {
    http: Client,
    base_url: String,
    bot_token: SecretString,
    chat_id: String,
    parse_mode: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig, credentials: TelegramCredentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("oi-alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let parse_mode = Some(config.parse_mode.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: credentials.bot_token,
            chat_id: credentials.chat_id,
            parse_mode,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn redact(&self, text: &str) -> String {
        let token = self.bot_token.expose_secret();
        if token.is_empty() {
            text.to_string()
        } else {
            text.replace(token, "<redacted>")
        }
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.bot_token.expose_secret()
        );
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
            disable_web_page_preview: true,
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Telegram request failed: {}", e.without_url()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let api: Option<ApiResponse> = serde_json::from_str(&text).ok();

        match api {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(anyhow!(
                "Telegram rejected message ({} {}): {}",
                status.as_u16(),
                api.error_code.unwrap_or_default(),
                self.redact(api.description.as_deref().unwrap_or("no description"))
            )),
            None => Err(anyhow!(
                "Telegram returned {}: {}",
                status,
                self.redact(&text)
            )),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        self.send_message(message).await?;
        tracing::info!("Alert delivered to Telegram chat {}", self.chat_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

//! Telegram Bot API delivery channel.
//!
//! Sends messages via the Telegram Bot API (`POST /bot<token>/sendMessage`).
//! Handles 429 rate limits by respecting the `parameters.retry_after` field
//! returned in the JSON response body, and sorts other rejections into
//! permanent (prune the chat) and transient (try again next broadcast).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{DeliveryChannel, DeliveryError};
use crate::subscribers::SubscriberId;

/// Maximum number of attempts for rate-limited requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Longest `retry_after` slept through. Longer flood waits fail the
/// attempt as transient.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(5);

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bad Request descriptions meaning the chat is gone for good.
const PERMANENT_DESCRIPTIONS: &[&str] = &["chat not found", "user is deactivated", "bot was kicked"];

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Parse mode for message formatting (HTML, Markdown, MarkdownV2).
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    #[serde(default = "default_true")]
    pub disable_web_page_preview: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout", with = "secs")]
    pub request_timeout: Duration,
}

fn default_parse_mode() -> String {
    "HTML".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            ..Default::default()
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            parse_mode: default_parse_mode(),
            disable_web_page_preview: true,
            api_base: default_api_base(),
            request_timeout: default_timeout(),
        }
    }
}

/// Telegram delivery channel.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> crate::Result<Self> {
        live_probe::client::install_rustls_provider();
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| crate::Error::Other(format!("Failed to build Telegram client: {e}")))?;
        Ok(Self { config, client })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Send request with rate limit handling.
    async fn send_with_retry(&self, payload: &serde_json::Value) -> Result<(), DeliveryError> {
        let url = self.send_message_url();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self
                .client
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(|e| DeliveryError::transient(format!("Telegram request failed: {e}")))?;

            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            let body: serde_json::Value = response.json().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = body
                    .pointer("/parameters/retry_after")
                    .and_then(|v| v.as_u64())
                    .map(Duration::from_secs);

                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        "Telegram rate limit: max retries ({}) exceeded, last retry_after was {:?}",
                        MAX_RATE_LIMIT_RETRIES, retry_after
                    );
                    return Err(DeliveryError::transient(format!(
                        "Telegram rate limit exceeded after {MAX_RATE_LIMIT_RETRIES} attempts"
                    )));
                }

                let wait_duration = retry_after.unwrap_or(Duration::from_secs(1));
                if wait_duration > MAX_RETRY_WAIT {
                    warn!(
                        "Telegram rate limit: retry_after {:?} exceeds {:?}, skipping this round",
                        wait_duration, MAX_RETRY_WAIT
                    );
                    return Err(DeliveryError::transient(format!(
                        "Telegram rate limited for {}s",
                        wait_duration.as_secs()
                    )));
                }
                debug!(
                    "Telegram rate limited (429), waiting {:?} before retry (attempt {}/{})",
                    wait_duration, attempts, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait_duration).await;
                continue;
            }

            let description = body
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or_default();
            return Err(classify_rejection(status, description));
        }
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&self, recipient: SubscriberId, text: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "chat_id": recipient.0,
            "text": truncate_message(text, TELEGRAM_MESSAGE_LIMIT),
            "parse_mode": self.config.parse_mode,
            "disable_web_page_preview": self.config.disable_web_page_preview,
        });

        self.send_with_retry(&payload).await?;

        debug!(chat_id = %recipient, "Telegram message sent");
        Ok(())
    }
}

/// Map a non-429 rejection onto a delivery error.
///
/// 403 means the bot was blocked or removed. A handful of 400 descriptions
/// mean the chat no longer exists. Anything else may clear up by itself.
fn classify_rejection(status: StatusCode, description: &str) -> DeliveryError {
    let message = format!("Telegram sendMessage failed: {status} - {description}");

    if status == StatusCode::FORBIDDEN {
        return DeliveryError::permanent(message);
    }

    if status == StatusCode::BAD_REQUEST {
        let lowered = description.to_lowercase();
        if PERMANENT_DESCRIPTIONS.iter().any(|d| lowered.contains(d)) {
            return DeliveryError::permanent(message);
        }
    }

    DeliveryError::transient(message)
}

/// Truncate a message to fit within the Telegram character limit.
fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit.saturating_sub(suffix.chars().count());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}

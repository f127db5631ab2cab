//! Delivery of reminders to their recipients.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const TELEGRAM_API_URL_TEMPLATE: &str = "https://api.telegram.org/bot{token}/sendMessage";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery request error: {0}")]
    Request(String),
    /// Non-success answer from the messaging API. Status 403 usually means
    /// the recipient has blocked the bot.
    #[error("delivery API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// Anything that can push a text message to a user.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Sender backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        Ok(Self {
            http,
            api_url: TELEGRAM_API_URL_TEMPLATE.replace("{token}", bot_token),
        })
    }

    /// Full endpoint URL. Embeds the bot token, so keep it out of logs.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(&self.api_url)
            .json(&SendMessage {
                chat_id: user_id,
                text,
            })
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(user_id, "Notification delivered");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());

        Err(DeliveryError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

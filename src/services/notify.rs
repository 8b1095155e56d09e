// src/services/notify.rs

//! Outbound notifications through the Telegram Bot API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::TelegramConfig;
use crate::utils::{endpoint, http};

/// Telegram error descriptions meaning the chat can never be reached again.
const PERMANENT_MARKERS: &[&str] = &[
    "bot was blocked",
    "user is deactivated",
    "chat not found",
    "bot was kicked",
];

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The address is gone for good (blocked, deactivated, deleted chat)
    PermanentlyUndeliverable { reason: String },
    /// Might succeed on a later cycle
    TransientFailure { reason: String },
}

/// Delivery channel for rendered messages.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn deliver(&self, address: &str, message: &str) -> DeliveryOutcome;
}

/// Classify a failed delivery by the channel's error description.
pub fn classify_failure(description: &str) -> DeliveryOutcome {
    let lowered = description.to_lowercase();
    if PERMANENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        DeliveryOutcome::PermanentlyUndeliverable {
            reason: description.to_string(),
        }
    } else {
        DeliveryOutcome::TransientFailure {
            reason: description.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// `sendMessage` client for a single bot.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::config(
                "telegram.bot_token is empty (set TELEGRAM_BOT_TOKEN)",
            ));
        }

        Ok(Self {
            client: http::create_async_client("jobwatch", config.timeout_secs)?,
            api_url: config.api_url.clone(),
            bot_token: config.bot_token.trim().to_string(),
        })
    }

    async fn send_message(&self, address: &str, message: &str) -> Result<DeliveryOutcome> {
        let url = endpoint(&self.api_url, &format!("bot{}/sendMessage", self.bot_token))?;
        let response = self
            .client
            .post(url)
            .json(&json!({
                "chat_id": address,
                "text": message,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        let outcome = match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(reply) if reply.ok => DeliveryOutcome::Delivered,
            Ok(reply) => classify_failure(
                reply
                    .description
                    .as_deref()
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error")),
            ),
            Err(_) => DeliveryOutcome::TransientFailure {
                reason: format!("unexpected response with status {status}"),
            },
        };

        Ok(outcome)
    }
}

#[async_trait]
impl NotificationPort for TelegramNotifier {
    async fn deliver(&self, address: &str, message: &str) -> DeliveryOutcome {
        match self.send_message(address, message).await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::TransientFailure {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_descriptions() {
        for description in [
            "Forbidden: bot was blocked by the user",
            "Forbidden: user is deactivated",
            "Bad Request: chat not found",
            "Forbidden: bot was kicked from the group chat",
        ] {
            assert!(
                matches!(
                    classify_failure(description),
                    DeliveryOutcome::PermanentlyUndeliverable { .. }
                ),
                "{description}"
            );
        }
    }

    #[test]
    fn test_transient_descriptions() {
        for description in [
            "Too Many Requests: retry after 5",
            "Bad Gateway",
            "Bad Request: message is too long",
        ] {
            assert!(
                matches!(
                    classify_failure(description),
                    DeliveryOutcome::TransientFailure { .. }
                ),
                "{description}"
            );
        }
    }

    #[test]
    fn test_notifier_requires_token() {
        assert!(TelegramNotifier::new(&TelegramConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_transport_error_is_transient_and_hides_token() {
        let config = TelegramConfig {
            api_url: "http://127.0.0.1:9".into(),
            bot_token: "123:SECRET".into(),
            timeout_secs: 2,
        };
        let notifier = TelegramNotifier::new(&config).unwrap();

        match notifier.deliver("1", "hello").await {
            DeliveryOutcome::TransientFailure { reason } => assert!(!reason.contains("SECRET")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

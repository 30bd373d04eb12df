//! Telegram Bot API message sink.
//!
//! Each call posts one `sendMessage` request with HTML parse mode. Message
//! sizing is handled upstream by the notifier.

use friendwatch_core::{MessageSink, NotifyError};

use crate::config::TelegramConfig;

/// Message sink posting to a Telegram chat.
pub struct TelegramSink {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    /// Create a sink sharing the given HTTP client.
    pub fn new(client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }
}

impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let body = message_body(&self.chat_id, text);

        // The URL embeds the bot token; strip it from transport errors.
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: error_body,
            });
        }

        Ok(())
    }
}

/// JSON payload for `sendMessage`.
fn message_body(chat_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "HTML",
    })
}

//! Telegram Bot API transport.
//!
//! Delivers reminder messages with the `sendMessage` method. Recipients are
//! addressed by username; the stored handle must match what Telegram knows.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{MessageFormat, MessageTransport, TransportError};

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends messages through the Telegram Bot API.
pub struct TelegramTransport {
    client: reqwest::Client,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramTransport {
    /// Create a transport for the given bot token.
    pub fn new(bot_token: impl Into<String>) -> Result<Self, TransportError> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(TransportError::Config(
                "Telegram bot token is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, bot_token })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.bot_token, method)
    }
}

/// Build the `sendMessage` payload for a recipient handle.
fn message_payload(handle: &str, text: &str, format: MessageFormat) -> Value {
    let mut payload = json!({
        "chat_id": format!("@{}", handle),
        "text": text,
    });
    if format == MessageFormat::Markdown {
        payload["parse_mode"] = Value::String("Markdown".to_string());
    }
    payload
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send(
        &self,
        recipient: &str,
        title: &str,
        body: &str,
        format: MessageFormat,
    ) -> Result<(), TransportError> {
        let handle = recipient.trim().trim_start_matches('@');
        if handle.is_empty() {
            return Err(TransportError::InvalidRecipient(recipient.to_string()));
        }

        let text = format!("{}\n\n{}", title, body);
        let payload = message_payload(handle, &text, format);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let result: ApiResponse = response.json().await?;
        if !result.ok {
            return Err(TransportError::Api(result.description.unwrap_or_else(
                || format!("sendMessage returned HTTP {}", status),
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_embeds_token() {
        let transport = TelegramTransport::new("123:abc").unwrap();
        assert_eq!(
            transport.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            TelegramTransport::new("  "),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn test_payload_plain_omits_parse_mode() {
        let payload = message_payload("jdoe", "hello", MessageFormat::Plain);
        assert_eq!(payload["chat_id"], "@jdoe");
        assert_eq!(payload["text"], "hello");
        assert!(payload.get("parse_mode").is_none());
    }

    #[test]
    fn test_payload_markdown_sets_parse_mode() {
        let payload = message_payload("jdoe", "hello", MessageFormat::Markdown);
        assert_eq!(payload["parse_mode"], "Markdown");
    }
}

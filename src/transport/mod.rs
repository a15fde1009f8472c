//! Outbound messaging transport.
//!
//! The reminder dispatcher sends through the `MessageTransport` trait so the
//! concrete channel (Telegram in production, a mock in tests) stays
//! swappable.

pub mod telegram;

pub use telegram::TelegramTransport;

use async_trait::async_trait;

/// Rendering hint for the message body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageFormat {
    Plain,
    Markdown,
}

/// Errors surfaced by a messaging transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rejected the message: {0}")]
    Api(String),

    #[error("Invalid recipient handle: {0}")]
    InvalidRecipient(String),

    #[error("Transport misconfigured: {0}")]
    Config(String),
}

/// A channel that can deliver one rendered message to one recipient.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver `body` under `title` to `recipient`, a channel-specific handle
    /// (for Telegram, a username without the leading `@`).
    async fn send(
        &self,
        recipient: &str,
        title: &str,
        body: &str,
        format: MessageFormat,
    ) -> Result<(), TransportError>;

    /// Transport name for logs.
    fn name(&self) -> &str;
}

/// Transport used when no messaging credentials are configured. Every send
/// fails, which the dispatcher counts as a failed delivery.
#[derive(Debug, Default)]
pub struct DisabledTransport;

#[async_trait]
impl MessageTransport for DisabledTransport {
    async fn send(
        &self,
        _recipient: &str,
        _title: &str,
        _body: &str,
        _format: MessageFormat,
    ) -> Result<(), TransportError> {
        Err(TransportError::Config(
            "messaging transport is not configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

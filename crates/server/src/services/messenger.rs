//! Outbound messaging abstraction.
//!
//! Notifications go through [`Messenger`] so the dispatcher can be driven by
//! the Telegram client in production and by a recording double in tests.

use async_trait::async_trait;
use boutique_core::ChatId;
use thiserror::Error;

/// Transport-level failures when delivering a message.
///
/// These are never business errors: the order they relate to is already
/// persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// The client could not be constructed.
    #[error("messaging configuration error: {0}")]
    Config(String),

    /// The request did not complete in time.
    #[error("messaging request timed out")]
    Timeout,

    /// HTTP request failed.
    #[error("messaging request failed: {0}")]
    Request(String),

    /// Failed to parse the response.
    #[error("messaging response error: {0}")]
    Response(String),

    /// The messaging API rejected the call.
    #[error("messaging API error {code}: {description}")]
    Api {
        /// API error code (HTTP-like).
        code: i64,
        /// Human-readable reason.
        description: String,
    },
}

/// A file sent alongside a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name shown to the recipient.
    pub filename: String,
    /// MIME type of `bytes`.
    pub mime: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Caption shown under the file.
    pub caption: String,
}

impl Document {
    /// A PDF document.
    #[must_use]
    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>, caption: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            mime: "application/pdf",
            bytes,
            caption: caption.into(),
        }
    }
}

/// Sends text and documents to opaque destinations.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send an HTML-formatted text message.
    async fn send_text(&self, to: &ChatId, html: &str) -> Result<(), MessagingError>;

    /// Send a document with a caption.
    async fn send_document(&self, to: &ChatId, document: &Document) -> Result<(), MessagingError>;
}

//! Telegram Bot API client.
//!
//! Implements [`Messenger`] over `sendMessage` and `sendDocument`. Every
//! call is bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use boutique_core::ChatId;

use crate::services::messenger::{Document, Messenger, MessagingError};

/// Bot API envelope shared by every method.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// API base URL, without trailing slash.
    api_base: String,
    /// Bot token, part of every method URL.
    bot_token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new Telegram client.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Config` if the HTTP client cannot be built.
    pub fn new(
        bot_token: SecretString,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MessagingError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Read the API envelope and turn `ok: false` into an error.
    async fn check(response: reqwest::Response, method: &str) -> Result<(), MessagingError> {
        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|e| {
            MessagingError::Response(format!("{method}: HTTP {status}: {}", e.without_url()))
        })?;

        if !body.ok {
            let code = body.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
            let description = body
                .description
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(method, code, description = %description, "Telegram API error");
            return Err(MessagingError::Api { code, description });
        }

        Ok(())
    }
}

/// Map a transport error, stripping the URL (it embeds the bot token).
fn request_error(e: reqwest::Error) -> MessagingError {
    if e.is_timeout() {
        MessagingError::Timeout
    } else {
        MessagingError::Request(e.without_url().to_string())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    #[instrument(skip(self, html), fields(chat_id = %to))]
    async fn send_text(&self, to: &ChatId, html: &str) -> Result<(), MessagingError> {
        let message = SendMessage {
            chat_id: to.as_str(),
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&message)
            .send()
            .await
            .map_err(request_error)?;

        Self::check(response, "sendMessage").await?;
        debug!("Message sent to Telegram");
        Ok(())
    }

    #[instrument(skip(self, document), fields(chat_id = %to, filename = %document.filename))]
    async fn send_document(&self, to: &ChatId, document: &Document) -> Result<(), MessagingError> {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.filename.clone())
            .mime_str(document.mime)
            .map_err(|e| MessagingError::Request(e.without_url().to_string()))?;

        let form = Form::new()
            .text("chat_id", to.as_str().to_string())
            .text("caption", document.caption.clone())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        Self::check(response, "sendDocument").await?;
        debug!("Document sent to Telegram");
        Ok(())
    }
}

//! Telegram WebApp `initData` verification.
//!
//! The storefront runs as a Telegram WebApp; the client forwards the raw
//! `initData` query string. Its `hash` field is
//! `hex(HMAC_SHA256(HMAC_SHA256("WebAppData", bot_token), data_check_string))`
//! where `data_check_string` is every other field as `key=value`, sorted by
//! key and joined with `\n`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::services::admin_session::constant_time_compare;

/// Errors that can occur when verifying `initData`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitDataError {
    /// No `hash` field.
    #[error("initData has no hash")]
    MissingHash,

    /// The hash does not match the payload.
    #[error("initData signature mismatch")]
    InvalidSignature,

    /// `auth_date` is missing or unparseable.
    #[error("initData has no valid auth_date")]
    MissingAuthDate,

    /// `auth_date` is older than the accepted age.
    #[error("initData expired")]
    Expired,

    /// No parseable `user` field.
    #[error("initData has no valid user: {0}")]
    InvalidUser(String),
}

/// The Telegram user vouched for by a verified `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebAppUser {
    /// Telegram user id, usable as a private chat id.
    pub id: i64,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Public username, without `@`.
    #[serde(default)]
    pub username: Option<String>,
}

/// Verifies `initData` with a fixed bot token and freshness bound.
#[derive(Clone)]
pub struct InitDataVerifier {
    bot_token: SecretString,
    max_age: Duration,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("bot_token", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl InitDataVerifier {
    /// Create a verifier.
    #[must_use]
    pub const fn new(bot_token: SecretString, max_age: Duration) -> Self {
        Self { bot_token, max_age }
    }

    /// Verify `init_data` at `now`.
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify(
        &self,
        init_data: &str,
        now: DateTime<Utc>,
    ) -> Result<WebAppUser, InitDataError> {
        verify(init_data, self.bot_token.expose_secret(), self.max_age, now)
    }
}

/// Verify `init_data` against `bot_token` and return the user it carries.
///
/// # Errors
///
/// Returns an [`InitDataError`] if the payload is unsigned, tampered with,
/// older than `max_age` at `now`, or has no user.
pub fn verify(
    init_data: &str,
    bot_token: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<WebAppUser, InitDataError> {
    let mut hash = None;
    let mut fields: Vec<(String, String)> = Vec::new();
    for (key, value) in url::form_urlencoded::parse(init_data.trim().as_bytes()) {
        if key == "hash" {
            hash = Some(value.into_owned());
        } else {
            fields.push((key.into_owned(), value.into_owned()));
        }
    }
    let hash = hash.ok_or(InitDataError::MissingHash)?;

    fields.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let expected = sign(&data_check_string, bot_token)?;
    if !constant_time_compare(&expected, &hash.to_ascii_lowercase()) {
        return Err(InitDataError::InvalidSignature);
    }

    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let auth_date = field("auth_date")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(InitDataError::MissingAuthDate)?;
    let age = now.signed_duration_since(auth_date);
    if age > chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX) {
        return Err(InitDataError::Expired);
    }

    let user = field("user").ok_or_else(|| InitDataError::InvalidUser("missing".to_string()))?;
    serde_json::from_str(user).map_err(|e| InitDataError::InvalidUser(e.to_string()))
}

/// Build a signed `initData` query string from `fields`.
///
/// This is what Telegram hands a WebApp; it is exposed for tooling and tests
/// that need to impersonate a client.
///
/// # Errors
///
/// Returns `InitDataError::InvalidSignature` if the HMAC cannot be keyed.
pub fn sign_init_data(fields: &[(&str, &str)], bot_token: &str) -> Result<String, InitDataError> {
    let mut sorted = fields.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let data_check_string = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let hash = sign(&data_check_string, bot_token)?;

    let mut out = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in fields {
        out.append_pair(k, v);
    }
    out.append_pair("hash", &hash);
    Ok(out.finish())
}

/// Compute the expected hex hash for a data-check string.
fn sign(data_check_string: &str, bot_token: &str) -> Result<String, InitDataError> {
    let mut secret = <Hmac<Sha256> as Mac>::new_from_slice(b"WebAppData")
        .map_err(|_| InitDataError::InvalidSignature)?;
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&secret_key)
        .map_err(|_| InitDataError::InvalidSignature)?;
    mac.update(data_check_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

//! Admin session guard.
//!
//! Password login mints an opaque bearer token. Each successful
//! authorization slides the token's expiry window forward; a token idle for
//! longer than the timeout is rejected and evicted. A background reaper
//! sweeps abandoned tokens so memory stays bounded.
//!
//! Failed logins are not rate limited.

mod error;
mod store;

pub use error::AdminAuthError;
pub use store::{AdminSession, InMemorySessionStore, SessionStore};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Random bytes per token (hex-encoded to 48 characters).
const TOKEN_BYTES: usize = 24;

/// Issues and validates admin bearer tokens.
#[derive(Clone)]
pub struct AdminSessionGuard {
    password: Option<SecretString>,
    timeout: Duration,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for AdminSessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSessionGuard")
            .field("enabled", &self.password.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AdminSessionGuard {
    /// Create a guard.
    ///
    /// With `password = None` every login is refused with
    /// [`AdminAuthError::Disabled`].
    #[must_use]
    pub fn new(
        password: Option<SecretString>,
        timeout: std::time::Duration,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            password,
            timeout: Duration::from_std(timeout).unwrap_or(Duration::MAX),
            store,
        }
    }

    /// Whether a password is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.password.is_some()
    }

    /// Exchange the admin password for a new token.
    ///
    /// # Errors
    ///
    /// Returns [`AdminAuthError::Disabled`] when no password is configured and
    /// [`AdminAuthError::InvalidPassword`] on mismatch.
    pub async fn login(&self, password: &str) -> Result<String, AdminAuthError> {
        self.login_at(password, Utc::now()).await
    }

    /// [`login`](Self::login) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub async fn login_at(
        &self,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AdminAuthError> {
        let expected = self.password.as_ref().ok_or(AdminAuthError::Disabled)?;

        if !constant_time_compare(expected.expose_secret(), password) {
            warn!("Admin login rejected: invalid password");
            return Err(AdminAuthError::InvalidPassword);
        }

        let token = generate_token();
        self.store.put(&token, AdminSession::new(now)).await;
        info!("Admin session issued");

        Ok(token)
    }

    /// Check a token and slide its expiry window.
    ///
    /// # Errors
    ///
    /// Returns [`AdminAuthError::Unauthorized`] if the token is unknown or
    /// has been idle longer than the timeout.
    pub async fn authorize(&self, token: &str) -> Result<AdminSession, AdminAuthError> {
        self.authorize_at(token, Utc::now()).await
    }

    /// [`authorize`](Self::authorize) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Same as [`authorize`](Self::authorize).
    pub async fn authorize_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AdminAuthError> {
        if token.is_empty() {
            return Err(AdminAuthError::Unauthorized);
        }

        self.store
            .touch(token, now, self.timeout)
            .await
            .ok_or_else(|| {
                debug!("Admin token unknown or expired");
                AdminAuthError::Unauthorized
            })
    }

    /// Revoke a token. Returns whether it was active.
    pub async fn logout(&self, token: &str) -> bool {
        self.store.remove(token).await
    }

    /// Evict every session expired at `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        self.store.sweep(now, self.timeout).await
    }

    /// Spawn the periodic reaper.
    ///
    /// The task runs until aborted through the returned handle.
    #[must_use]
    pub fn spawn_reaper(&self, period: std::time::Duration) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = guard.sweep_at(Utc::now()).await;
                if evicted > 0 {
                    info!(evicted, "Swept expired admin sessions");
                }
            }
        })
    }
}

/// Generate a random hex token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

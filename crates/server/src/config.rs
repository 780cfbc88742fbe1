//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Database
//! - `BOUTIQUE_DATABASE_URL` - `SQLite` connection string (fallback: `DATABASE_URL`,
//!   default: `sqlite://data.db?mode=rwc`)
//!
//! ## Server
//! - `BOUTIQUE_HOST` - Bind address (default: 127.0.0.1)
//! - `BOUTIQUE_PORT` - Listen port (fallback: `PORT`, default: 3000)
//!
//! ## Shop
//! - `SHOP_NAME` - Name printed on receipts (default: Boutique Center)
//! - `SHOP_CURRENCY` - Currency label (default: EUR)
//! - `SHOP_TIMEZONE` - IANA zone for receipt timestamps (default: Europe/Paris)
//!
//! ## Admin
//! - `ADMIN_PASS` - Admin password; admin login is disabled when unset
//! - `ADMIN_SESSION_TIMEOUT_SECS` - Sliding session lifetime (default: 86400)
//! - `ADMIN_SESSION_SWEEP_SECS` - Expired session sweep period (default: 600)
//!
//! ## Messaging
//! - `TELEGRAM_BOT_TOKEN` - Bot token; notifications are disabled when unset
//! - `ADMIN_CHAT_ID` - Admin destination
//! - `DRIVER_CHAT_ID` - Driver destination
//! - `TELEGRAM_API_BASE` - API base URL (default: <https://api.telegram.org>)
//! - `MESSAGING_TIMEOUT_SECS` - Outbound request timeout (default: 10)
//! - `TELEGRAM_INIT_DATA_MAX_AGE_SECS` - Accepted `initData` age (default: 86400)
//!
//! ## Loyalty
//! - `LOYALTY_INTERVAL` - Every Nth order is discounted (default: 10)
//! - `LOYALTY_DISCOUNT` - Discount in minor units (default: 10)
//!
//! ## Other
//! - `MAPBOX_KEY` - Geocoding access token; geocoding is unavailable when unset
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use boutique_core::{ChatId, LoyaltyPolicy, Money};
use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://data.db?mode=rwc";
const MIN_ADMIN_PASSWORD_LENGTH: usize = 8;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct BoutiqueConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shop identity and presentation
    pub shop: ShopConfig,
    /// Admin surface configuration
    pub admin: AdminConfig,
    /// Messaging configuration
    pub telegram: TelegramConfig,
    /// Nth-order discount rule
    pub loyalty: LoyaltyPolicy,
    /// Mapbox access token for the geocoding proxy
    pub mapbox_key: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shop identity printed on receipts.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Display name
    pub name: String,
    /// Currency label appended to amounts
    pub currency: String,
    /// Zone used to localize receipt timestamps
    pub timezone: Tz,
}

/// Admin authentication configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminConfig {
    /// Admin password (login disabled when `None`)
    pub password: Option<SecretString>,
    /// Sliding session lifetime
    pub session_timeout: Duration,
    /// How often expired sessions are swept
    pub sweep_interval: Duration,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("session_timeout", &self.session_timeout)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token (notifications disabled when `None`)
    pub bot_token: Option<SecretString>,
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Destination for admin notifications
    pub admin_chat: Option<ChatId>,
    /// Destination for driver notifications
    pub driver_chat: Option<ChatId>,
    /// Timeout applied to every outbound call
    pub timeout: Duration,
    /// Maximum accepted age of WebApp `initData`
    pub init_data_max_age: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("admin_chat", &self.admin_chat)
            .field("driver_chat", &self.driver_chat)
            .field("timeout", &self.timeout)
            .field("init_data_max_age", &self.init_data_max_age)
            .finish()
    }
}

impl BoutiqueConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the admin password
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`BoutiqueConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database_url = SecretString::from(
            env.first_of(&["BOUTIQUE_DATABASE_URL", "DATABASE_URL"])
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        );
        let host = env.parsed::<IpAddr>("BOUTIQUE_HOST", "127.0.0.1")?;
        let port = match env.first_of(&["BOUTIQUE_PORT", "PORT"]) {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ConfigError::InvalidEnvVar("BOUTIQUE_PORT".to_string(), e.to_string())
            })?,
            None => 3000,
        };

        let shop = ShopConfig::from_env(&env)?;
        let admin = AdminConfig::from_env(&env)?;
        let telegram = TelegramConfig::from_env(&env)?;

        let interval = env.parsed::<u32>("LOYALTY_INTERVAL", "10")?;
        let discount = env.parsed::<i64>("LOYALTY_DISCOUNT", "10")?;
        let loyalty = LoyaltyPolicy::new(interval, Money::from_minor(discount)).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "LOYALTY_INTERVAL".to_string(),
                "interval must be at least 1 and discount must not be negative".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            shop,
            admin,
            telegram,
            loyalty,
            mapbox_key: env.optional("MAPBOX_KEY").map(SecretString::from),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            name: env.or_default("SHOP_NAME", "Boutique Center"),
            currency: env.or_default("SHOP_CURRENCY", "EUR"),
            timezone: env.parsed::<Tz>("SHOP_TIMEZONE", "Europe/Paris")?,
        })
    }
}

impl AdminConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let password = env.optional("ADMIN_PASS").map(SecretString::from);
        if let Some(password) = &password {
            validate_admin_password(password, "ADMIN_PASS")?;
        }

        Ok(Self {
            password,
            session_timeout: Duration::from_secs(
                env.parsed::<u64>("ADMIN_SESSION_TIMEOUT_SECS", "86400")?,
            ),
            sweep_interval: Duration::from_secs(
                env.parsed::<u64>("ADMIN_SESSION_SWEEP_SECS", "600")?.max(1),
            ),
        })
    }
}

impl TelegramConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: env.optional("TELEGRAM_BOT_TOKEN").map(SecretString::from),
            api_base: env
                .or_default("TELEGRAM_API_BASE", "https://api.telegram.org")
                .trim_end_matches('/')
                .to_string(),
            admin_chat: env.chat_id("ADMIN_CHAT_ID")?,
            driver_chat: env.chat_id("DRIVER_CHAT_ID")?,
            timeout: Duration::from_secs(env.parsed::<u64>("MESSAGING_TIMEOUT_SECS", "10")?),
            init_data_max_age: Duration::from_secs(
                env.parsed::<u64>("TELEGRAM_INIT_DATA_MAX_AGE_SECS", "86400")?,
            ),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment accessor over a key lookup.
struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get the first set variable among `keys`.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.optional(key))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default) into `T`.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an optional messaging destination.
    fn chat_id(&self, key: &str) -> Result<Option<ChatId>, ConfigError> {
        self.optional(key)
            .map(|raw| {
                ChatId::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}

/// Validate that the admin password is long enough and not a placeholder.
fn validate_admin_password(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.chars().count() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters"),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::BoutiqueConfig;
use crate::services::admin_session::{AdminSessionGuard, InMemorySessionStore};
use crate::services::geocoding::{Geocoder, GeocodingError};
use crate::services::messenger::{Messenger, MessagingError};
use crate::services::notify::NotificationDispatcher;
use crate::services::orders::OrderService;
use crate::services::receipt::ReceiptFormatter;
use crate::services::telegram::{InitDataVerifier, TelegramClient};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("messaging client: {0}")]
    Messaging(#[from] MessagingError),
    #[error("geocoding client: {0}")]
    Geocoding(#[from] GeocodingError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BoutiqueConfig,
    pool: SqlitePool,
    formatter: ReceiptFormatter,
    orders: OrderService,
    admin: AdminSessionGuard,
    geocoder: Geocoder,
}

impl AppState {
    /// Create a new application state with production collaborators.
    ///
    /// Notifications are disabled when no bot token is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: BoutiqueConfig, pool: SqlitePool) -> Result<Self, StateError> {
        let messenger = config
            .telegram
            .bot_token
            .clone()
            .map(|token| {
                TelegramClient::new(token, &config.telegram.api_base, config.telegram.timeout)
                    .map(|client| Arc::new(client) as Arc<dyn Messenger>)
            })
            .transpose()?;
        let geocoder = Geocoder::new(config.mapbox_key.clone())?;

        Ok(Self::with_services(config, pool, messenger, geocoder))
    }

    /// Create application state around explicit collaborators.
    #[must_use]
    pub fn with_services(
        config: BoutiqueConfig,
        pool: SqlitePool,
        messenger: Option<Arc<dyn Messenger>>,
        geocoder: Geocoder,
    ) -> Self {
        let formatter = ReceiptFormatter::from_config(&config.shop);
        let dispatcher = NotificationDispatcher::new(
            messenger,
            formatter.clone(),
            config.telegram.admin_chat.clone(),
            config.telegram.driver_chat.clone(),
        );
        let verifier = config
            .telegram
            .bot_token
            .clone()
            .map(|token| InitDataVerifier::new(token, config.telegram.init_data_max_age));
        let orders = OrderService::new(
            pool.clone(),
            config.shop.name.clone(),
            config.loyalty,
            dispatcher,
            verifier,
        );
        let admin = AdminSessionGuard::new(
            config.admin.password.clone(),
            config.admin.session_timeout,
            Arc::new(InMemorySessionStore::new()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                formatter,
                orders,
                admin,
                geocoder,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &BoutiqueConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Receipt formatter for the configured shop.
    #[must_use]
    pub fn formatter(&self) -> &ReceiptFormatter {
        &self.inner.formatter
    }

    /// Checkout orchestrator.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Admin session guard.
    #[must_use]
    pub fn admin(&self) -> &AdminSessionGuard {
        &self.inner.admin
    }

    /// Address autocomplete client.
    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.inner.geocoder
    }
}

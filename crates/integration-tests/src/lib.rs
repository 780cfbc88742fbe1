//! Integration tests for Boutique.
//!
//! Every test boots the full router on an ephemeral port over an in-memory
//! database and talks to it with a real HTTP client. Outbound notifications
//! go to a [`RecordingMessenger`] instead of Telegram.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p boutique-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - Order intake, loyalty and notifications
//! - `admin_api` - Admin login, order management, receipts and export
//! - `health` - Liveness, readiness and the geocoding proxy

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use boutique_core::ChatId;
use boutique_server::config::BoutiqueConfig;
use boutique_server::services::geocoding::Geocoder;
use boutique_server::services::messenger::{Document, Messenger, MessagingError};
use boutique_server::state::AppState;
use boutique_server::{app, db};

/// Admin password configured for every test app.
pub const ADMIN_PASSWORD: &str = "k9!vQ2#rT7";
/// Bot token used to sign and verify `initData`.
pub const BOT_TOKEN: &str = "123456:integration-token";
/// Admin notification destination.
pub const ADMIN_CHAT: &str = "1001";
/// Driver notification destination.
pub const DRIVER_CHAT: &str = "1002";

/// A message captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// A text message.
    Text { to: String, html: String },
    /// A document with its caption.
    Document {
        to: String,
        filename: String,
        caption: String,
    },
}

impl Sent {
    /// Destination of the message.
    #[must_use]
    pub fn to(&self) -> &str {
        match self {
            Self::Text { to, .. } | Self::Document { to, .. } => to,
        }
    }
}

/// Messenger that records deliveries and fails for chosen destinations.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    /// Make every delivery to `chat` fail.
    pub fn fail_for(&self, chat: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chat.to_string());
    }

    /// Everything delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages delivered to `chat`.
    #[must_use]
    pub fn sent_to(&self, chat: &str) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.to() == chat).collect()
    }

    fn check(&self, to: &ChatId) -> Result<(), MessagingError> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.iter().any(|f| f == to.as_str()) {
            return Err(MessagingError::Request("connection refused".to_string()));
        }
        Ok(())
    }

    fn record(&self, sent: Sent) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sent);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, to: &ChatId, html: &str) -> Result<(), MessagingError> {
        self.check(to)?;
        self.record(Sent::Text {
            to: to.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }

    async fn send_document(&self, to: &ChatId, document: &Document) -> Result<(), MessagingError> {
        self.check(to)?;
        self.record(Sent::Document {
            to: to.to_string(),
            filename: document.filename.clone(),
            caption: document.caption.clone(),
        });
        Ok(())
    }
}

/// Configuration shared by every test app, with `overrides` applied.
///
/// # Panics
///
/// Panics if the resulting configuration is invalid.
#[must_use]
pub fn test_config(overrides: &[(&str, &str)]) -> BoutiqueConfig {
    let mut vars: HashMap<String, String> = [
        ("ADMIN_PASS", ADMIN_PASSWORD),
        ("TELEGRAM_BOT_TOKEN", BOT_TOKEN),
        ("ADMIN_CHAT_ID", ADMIN_CHAT),
        ("DRIVER_CHAT_ID", DRIVER_CHAT),
        ("SHOP_NAME", "Boutique Center"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert((*k).to_string(), (*v).to_string());
    }

    BoutiqueConfig::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test configuration")
}

/// A running server plus handles on its collaborators.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub pool: SqlitePool,
    pub messenger: Arc<RecordingMessenger>,
    pub state: AppState,
    server: JoinHandle<()>,
}

impl TestApp {
    /// Start an app with the default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Start an app with configuration overrides.
    ///
    /// # Panics
    ///
    /// Panics if the database or the listener cannot be set up.
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let config = test_config(overrides);

        let pool = db::create_memory_pool()
            .await
            .expect("Failed to open in-memory database");
        db::migrate(&pool).await.expect("Failed to run migrations");

        let messenger = Arc::new(RecordingMessenger::default());
        let geocoder = Geocoder::new(None).expect("Failed to build geocoder");
        let state = AppState::with_services(
            config,
            pool.clone(),
            Some(messenger.clone() as Arc<dyn Messenger>),
            geocoder,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = app(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            pool,
            messenger,
            state,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /api/create-order` with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn create_order(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/create-order"))
            .json(body)
            .send()
            .await
            .expect("Failed to send create-order")
    }

    /// Log in as admin and return the session token.
    ///
    /// # Panics
    ///
    /// Panics if login does not succeed.
    pub async fn login(&self) -> String {
        let resp = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&serde_json::json!({ "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to send login");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let body: Value = resp.json().await.expect("Login body is not JSON");
        body["token"]
            .as_str()
            .expect("Login response has no token")
            .to_string()
    }

    /// Number of stored orders.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn order_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count orders");
        count
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A one-line cart: `qty` x `price` of "Pizza Margherita".
#[must_use]
pub fn order_body(customer: &str, qty: i64, price: i64) -> Value {
    serde_json::json!({
        "customer": customer,
        "type": "Livraison",
        "address": "1 rue de la Paix",
        "items": [
            { "name": "Pizza Margherita", "variant": "Large", "qty": qty, "price": price }
        ],
        "total": qty * price,
    })
}

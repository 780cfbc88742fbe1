//! Address autocomplete proxy.
//!
//! Forwards free-text queries to the Mapbox places endpoint so the access
//! token never reaches the browser. Responses are passed through untouched
//! and cached for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

/// Default Mapbox places endpoint.
pub const MAPBOX_PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

const SUGGESTION_LIMIT: &str = "6";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while geocoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeocodingError {
    /// No access token is configured.
    #[error("geocoding is not configured")]
    Unavailable,

    /// The endpoint URL or HTTP client is unusable.
    #[error("geocoding configuration error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("geocoding request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("geocoding provider returned HTTP {0}")]
    Upstream(u16),

    /// The provider's body was not JSON.
    #[error("geocoding response error: {0}")]
    Response(String),
}

/// Cached client for place suggestions.
#[derive(Clone)]
pub struct Geocoder {
    inner: Arc<GeocoderInner>,
}

struct GeocoderInner {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<SecretString>,
    cache: Cache<String, Value>,
}

impl std::fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geocoder")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

impl Geocoder {
    /// Create a geocoder against the public Mapbox endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Config` if the HTTP client cannot be built.
    pub fn new(access_token: Option<SecretString>) -> Result<Self, GeocodingError> {
        Self::with_endpoint(access_token, MAPBOX_PLACES_URL)
    }

    /// Create a geocoder against a specific places endpoint.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Config` if `endpoint` is not a base URL or
    /// the HTTP client cannot be built.
    pub fn with_endpoint(
        access_token: Option<SecretString>,
        endpoint: &str,
    ) -> Result<Self, GeocodingError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| GeocodingError::Config(e.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(GeocodingError::Config(format!(
                "{endpoint} cannot be a base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeocodingError::Config(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(GeocoderInner {
                client,
                endpoint,
                access_token,
                cache,
            }),
        })
    }

    /// Whether an access token is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.access_token.is_some()
    }

    /// Suggest places for a free-text query.
    ///
    /// An empty query yields `{"features": []}` without contacting the
    /// provider.
    ///
    /// # Errors
    ///
    /// Returns `GeocodingError::Unavailable` when no token is configured, or
    /// a transport/provider error.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Result<Value, GeocodingError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(json!({ "features": [] }));
        }
        let token = self
            .inner
            .access_token
            .as_ref()
            .ok_or(GeocodingError::Unavailable)?;

        let key = query.to_lowercase();
        if let Some(cached) = self.inner.cache.get(&key).await {
            debug!("Geocoding cache hit");
            return Ok(cached);
        }

        let url = self.request_url(query, token)?;
        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodingError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Geocoding provider returned non-success status");
            return Err(GeocodingError::Upstream(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GeocodingError::Response(e.without_url().to_string()))?;

        self.inner.cache.insert(key, body.clone()).await;
        Ok(body)
    }

    fn request_url(&self, query: &str, token: &SecretString) -> Result<Url, GeocodingError> {
        let mut url = self.inner.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| GeocodingError::Config("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", token.expose_secret())
            .append_pair("autocomplete", "true")
            .append_pair("limit", SUGGESTION_LIMIT);
        Ok(url)
    }
}

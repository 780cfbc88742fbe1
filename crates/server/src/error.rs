//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding. Every error body has the same JSON shape:
//!
//! ```json
//! { "ok": false, "error": "<code>", "message": "<human readable>" }
//! ```
//!
//! All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use boutique_core::OrderError;

use crate::db::RepositoryError;
use crate::services::admin_session::AdminAuthError;
use crate::services::geocoding::GeocodingError;
use crate::services::orders::CheckoutError;
use crate::services::receipt::ReceiptError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] OrderError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Admin authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Geocoding failed.
    #[error("Geocoding error: {0}")]
    Geocoding(#[from] GeocodingError),

    /// Receipt rendering failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(e) => Self::Validation(e),
            CheckoutError::Storage(e) => Self::Database(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    error: &'a str,
    message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Receipt(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(AdminAuthError::Disabled) | Self::Geocoding(GeocodingError::Unavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Geocoding(GeocodingError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Geocoding(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::BadRequest(_) => "invalid_body",
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => "not_found",
            Self::Auth(AdminAuthError::Disabled) => "admin_disabled",
            Self::Auth(AdminAuthError::InvalidPassword) => "invalid_password",
            Self::Auth(AdminAuthError::Unauthorized) => "unauthorized",
            Self::Geocoding(GeocodingError::Unavailable) => "geocoding_unavailable",
            Self::Geocoding(GeocodingError::Config(_)) => "internal_error",
            Self::Geocoding(_) => "upstream_error",
            Self::Database(_) | Self::Receipt(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
            && !matches!(
                self,
                Self::Auth(AdminAuthError::Disabled) | Self::Geocoding(GeocodingError::Unavailable)
            )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Database(RepositoryError::NotFound) => "Order not found".to_string(),
            Self::Auth(e) => e.to_string(),
            Self::Geocoding(GeocodingError::Unavailable) => {
                "Address search is not available".to_string()
            }
            Self::Geocoding(GeocodingError::Config(_)) => "Internal server error".to_string(),
            Self::Geocoding(_) => "External service error".to_string(),
            Self::Database(_) | Self::Receipt(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody {
            ok: false,
            error: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for admin actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("admin", "Deleted order", Some(&[("order_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

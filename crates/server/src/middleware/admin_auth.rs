//! Admin token extractor.
//!
//! Admin endpoints take a bearer token, either as `x-admin-token` or as
//! `Authorization: Bearer <token>`. Every successful extraction slides the
//! session's expiry window forward.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::error::AppError;
use crate::services::admin_session::{AdminAuthError, AdminSession};
use crate::state::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that requires a valid admin token.
///
/// Rejects with `503 admin_disabled` when no admin password is configured
/// and with `401 unauthorized` when the token is missing, unknown or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(admin: RequireAdmin) -> impl IntoResponse {
///     format!("Session started at {}", admin.session.issued_at)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    /// The presented token.
    pub token: String,
    /// The refreshed session.
    pub session: AdminSession,
}

/// Read the admin token from request headers.
///
/// `x-admin-token` takes precedence over `Authorization`.
#[must_use]
pub fn admin_token(headers: &HeaderMap) -> Option<String> {
    let from_custom = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let from_bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
            })
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };

    from_custom.or_else(from_bearer).map(String::from)
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.admin().is_enabled() {
            return Err(AdminAuthError::Disabled.into());
        }
        let token = admin_token(&parts.headers).ok_or(AdminAuthError::Unauthorized)?;
        let session = state.admin().authorize(&token).await?;

        Ok(Self { token, session })
    }
}

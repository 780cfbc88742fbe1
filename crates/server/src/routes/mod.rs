//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database ping)
//!
//! # Storefront
//! POST   /api/create-order                - Checkout
//! GET    /api/geocode?q=                  - Address autocomplete
//!
//! # Admin (token required except login)
//! POST   /api/admin/login                 - Exchange password for token
//! POST   /api/admin/logout                - Revoke token
//! GET    /api/admin/orders                - List orders, newest first
//! GET    /api/admin/orders/{id}           - Order detail
//! PATCH  /api/admin/orders/{id}           - Update status and/or address
//! DELETE /api/admin/orders/{id}           - Delete order
//! GET    /api/admin/orders/{id}/receipt   - PDF receipt
//! GET    /api/admin/stats?period=         - Sales figures for a period
//! GET    /api/admin/recap-pdf?period=     - Sales recap PDF
//! GET    /api/admin/export                - CSV export
//! ```

pub mod admin;
pub mod geocode;
pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/orders", get(admin::list))
        .route(
            "/orders/{id}",
            get(admin::show).patch(admin::update).delete(admin::delete),
        )
        .route("/orders/{id}/receipt", get(admin::receipt))
        .route("/stats", get(admin::stats))
        .route("/recap-pdf", get(admin::recap_pdf))
        .route("/export", get(admin::export))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/create-order", post(orders::create))
        .route("/api/geocode", get(geocode::search))
        .nest("/api/admin", admin_routes())
}

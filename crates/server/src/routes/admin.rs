//! Admin API route handlers.
//!
//! Everything except login requires [`RequireAdmin`].

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use tracing::{info, instrument};

use boutique_core::OrderId;
use chrono::{DateTime, Utc};

use crate::db::{OrderChanges, OrderRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{
    LoginRequest, LoginResponse, OkResponse, OrderResponse, OrdersResponse, StatsQuery,
    StatsResponse, UpdateOrderRequest,
};
use crate::services::export::{CSV_FILENAME, orders_csv};
use crate::services::receipt::ReceiptFormatter;
use crate::services::stats::{Period, SalesStats};
use crate::state::AppState;

fn stats_period(
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Period> {
    query
        .map(|Query(q)| q.period)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn period_stats(state: &AppState, period: Period, now: DateTime<Utc>) -> Result<SalesStats> {
    let tz = state.config().shop.timezone;
    let orders = OrderRepository::new(state.pool())
        .list_since(period.since(now, tz))
        .await?;
    Ok(SalesStats::from_orders(&orders, tz))
}

fn order_id(path: std::result::Result<Path<OrderId>, PathRejection>) -> Result<OrderId> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// `POST /api/admin/login`
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let token = state.admin().login(&request.password).await?;
    add_breadcrumb("admin", "Admin logged in", None);

    Ok(Json(LoginResponse { ok: true, token }))
}

/// `POST /api/admin/logout`
pub async fn logout(State(state): State<AppState>, admin: RequireAdmin) -> Json<OkResponse> {
    state.admin().logout(&admin.token).await;
    add_breadcrumb("admin", "Admin logged out", None);
    Json(OkResponse::OK)
}

/// `GET /api/admin/orders`
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<OrdersResponse>> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(Json(OrdersResponse { ok: true, orders }))
}

/// `GET /api/admin/orders/{id}`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    path: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderResponse>> {
    let id = order_id(path)?;
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;

    Ok(Json(OrderResponse { ok: true, order }))
}

/// `PATCH /api/admin/orders/{id}`
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    path: std::result::Result<Path<OrderId>, PathRejection>,
    body: std::result::Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>> {
    let id = order_id(path)?;
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let changes = OrderChanges::from(request);
    if changes.is_empty() {
        return Err(AppError::BadRequest(
            "Nothing to update: provide status and/or address".to_string(),
        ));
    }

    let order = OrderRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    info!(order_id = %id, status = %order.status, "Order updated");

    Ok(Json(OrderResponse { ok: true, order }))
}

/// `DELETE /api/admin/orders/{id}`
#[instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    path: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OkResponse>> {
    let id = order_id(path)?;
    OrderRepository::new(state.pool()).delete(id).await?;

    let id_str = id.to_string();
    add_breadcrumb("admin", "Deleted order", Some(&[("order_id", id_str.as_str())]));
    info!(order_id = %id, "Order deleted");

    Ok(Json(OkResponse::OK))
}

/// `GET /api/admin/orders/{id}/receipt`
///
/// Renders the PDF receipt on demand.
#[instrument(skip_all)]
pub async fn receipt(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    path: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<impl IntoResponse> {
    let id = order_id(path)?;
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;

    let pdf = state.formatter().pdf(&order)?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        ReceiptFormatter::pdf_filename(&order)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

/// `GET /api/admin/stats?period=all|today|week|month`
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>> {
    let period = stats_period(query)?;
    let stats = period_stats(&state, period, Utc::now()).await?;
    Ok(Json(StatsResponse {
        ok: true,
        period,
        stats,
    }))
}

/// `GET /api/admin/recap-pdf?period=all|today|week|month`
///
/// Sales recap of the period as a PDF download.
#[instrument(skip_all)]
pub async fn recap_pdf(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let period = stats_period(query)?;
    let now = Utc::now();
    let stats = period_stats(&state, period, now).await?;
    info!(?period, orders = stats.total_orders, "Rendering sales recap");

    let formatter = state.formatter();
    let pdf = formatter.recap_pdf(&state.config().shop.name, period, &stats, now)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        formatter.recap_filename(now)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

/// `GET /api/admin/export`
///
/// CSV of every order, newest first.
#[instrument(skip_all)]
pub async fn export(State(state): State<AppState>, _admin: RequireAdmin) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    info!(orders = orders.len(), "Exporting orders");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        orders_csv(&orders),
    ))
}

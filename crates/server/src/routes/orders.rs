//! Checkout route handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{CreateOrderRequest, CreateOrderResponse};
use crate::services::orders::CheckoutDraft;
use crate::state::AppState;

/// `POST /api/create-order`
///
/// Validates the cart, applies the loyalty discount, stores the order and
/// notifies admin, driver and customer. Notification failures only show up
/// as `receipt_sent: false`.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = state
        .orders()
        .checkout(CheckoutDraft::from(request))
        .await?;

    Ok(Json(CreateOrderResponse::from(&outcome)))
}

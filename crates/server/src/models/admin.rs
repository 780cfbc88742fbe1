//! Admin API request and response bodies.

use serde::{Deserialize, Serialize};

use boutique_core::{Order, OrderStatus};

use crate::db::OrderChanges;
use crate::services::stats::{Period, SalesStats};

/// `POST /api/admin/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Admin password.
    #[serde(default)]
    pub password: String,
}

/// `POST /api/admin/login` success body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Always `true`.
    pub ok: bool,
    /// Bearer token for subsequent admin calls.
    pub token: String,
}

/// `PATCH /api/admin/orders/{id}` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    /// New status label.
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// New delivery address.
    #[serde(default)]
    pub address: Option<String>,
}

impl From<UpdateOrderRequest> for OrderChanges {
    fn from(req: UpdateOrderRequest) -> Self {
        Self {
            status: req.status,
            address: req.address,
        }
    }
}

/// `{ ok: true }`.
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    /// Always `true`.
    pub ok: bool,
}

impl OkResponse {
    /// The success body.
    pub const OK: Self = Self { ok: true };
}

/// Order list body.
#[derive(Debug, Clone, Serialize)]
pub struct OrdersResponse {
    /// Always `true`.
    pub ok: bool,
    /// Orders, newest first.
    pub orders: Vec<Order>,
}

/// Single order body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    /// Always `true`.
    pub ok: bool,
    /// The order.
    pub order: Order,
}

/// `?period=` query of the stats and recap endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StatsQuery {
    /// Reporting window, all time when omitted.
    #[serde(default)]
    pub period: Period,
}

/// Dashboard figures body.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Always `true`.
    pub ok: bool,
    /// Window the figures cover.
    pub period: Period,
    /// Aggregates.
    pub stats: SalesStats,
}

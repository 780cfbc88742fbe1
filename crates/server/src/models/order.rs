//! Checkout request and response bodies.
//!
//! The WebApp front-end sends camelCase; older clients used snake_case for
//! some fields, so both spellings are accepted.

use serde::{Deserialize, Serialize};

use boutique_core::{Money, OrderId};

use crate::services::orders::{CheckoutDraft, CheckoutOutcome, CustomerIdentity, DraftItem};

/// `POST /api/create-order` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Customer name; defaults to "Client".
    #[serde(default)]
    pub customer: Option<String>,
    /// Fulfillment type (delivery, pickup, ...).
    #[serde(default, rename = "type", alias = "fulfillment")]
    pub fulfillment: Option<String>,
    /// Delivery address.
    #[serde(default)]
    pub address: Option<String>,
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    /// Declared total in minor units.
    #[serde(default)]
    pub total: i64,
    /// Signed Telegram WebApp `initData`.
    #[serde(default, alias = "telegram_init_data", alias = "initData")]
    pub telegram_init_data: Option<String>,
    /// Raw Telegram user id (number or numeric string).
    #[serde(default, rename = "telegram_user_id", alias = "telegramUserId")]
    pub telegram_user_id: Option<RawUserId>,
}

/// One cart line in a checkout request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Variant label.
    #[serde(default)]
    pub variant: Option<String>,
    /// Quantity.
    pub qty: i64,
    /// Unit price in minor units.
    pub price: i64,
    /// Client-computed line total; checked when present.
    #[serde(default, alias = "line_total")]
    pub line_total: Option<i64>,
}

/// A user id sent either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawUserId {
    /// `123456`
    Number(i64),
    /// `"123456"`
    Text(String),
}

impl RawUserId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl From<CreateOrderRequest> for CheckoutDraft {
    fn from(req: CreateOrderRequest) -> Self {
        Self {
            customer: req.customer,
            fulfillment: req.fulfillment.unwrap_or_default(),
            address: req.address.unwrap_or_default(),
            items: req
                .items
                .into_iter()
                .map(|item| DraftItem {
                    name: item.name,
                    variant: item.variant.unwrap_or_default(),
                    qty: item.qty,
                    price: item.price,
                    line_total: item.line_total,
                })
                .collect(),
            total: req.total,
            identity: CustomerIdentity {
                init_data: req.telegram_init_data,
                user_id: req.telegram_user_id.map(RawUserId::into_string),
            },
        }
    }
}

/// `POST /api/create-order` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderResponse {
    /// Always `true`.
    pub ok: bool,
    /// Assigned order id.
    pub id: OrderId,
    /// Loyalty discount applied.
    pub discount: Money,
    /// Final total.
    pub total: Money,
    /// Whether the customer received their receipt.
    pub receipt_sent: bool,
}

impl From<&CheckoutOutcome> for CreateOrderResponse {
    fn from(outcome: &CheckoutOutcome) -> Self {
        Self {
            ok: true,
            id: outcome.order.id,
            discount: outcome.order.discount,
            total: outcome.order.total,
            receipt_sent: outcome.receipt_sent,
        }
    }
}

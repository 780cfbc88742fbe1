//! HTTP request and response bodies.
//!
//! Domain types live in `boutique-core`; these are the wire shapes of the
//! JSON API and their conversions into service inputs.

pub mod admin;
pub mod order;

pub use admin::{
    LoginRequest, LoginResponse, OkResponse, OrderResponse, OrdersResponse, StatsQuery,
    StatsResponse, UpdateOrderRequest,
};
pub use order::{CreateOrderRequest, CreateOrderResponse, OrderItemRequest, RawUserId};

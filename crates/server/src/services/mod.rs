//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Checkout orchestration (validate, loyalty, persist, notify)
//! - `notify` - Per-role notification fan-out with isolated failures
//! - `receipt` - Text and PDF receipt rendering
//! - `messenger` / `telegram` - Outbound messaging and WebApp identity
//! - `admin_session` - Admin login and sliding-expiry tokens
//! - `geocoding` - Cached address autocomplete proxy
//! - `export` - CSV export of the order book
//! - `stats` - Period sales figures for the dashboard and recaps

pub mod admin_session;
pub mod export;
pub mod geocoding;
pub mod messenger;
pub mod notify;
pub mod orders;
pub mod receipt;
pub mod stats;
pub mod telegram;

//! Core types for Boutique.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod chat;
pub mod id;
pub mod loyalty;
pub mod money;
pub mod order;
pub mod status;

pub use chat::{ChatId, ChatIdError};
pub use id::*;
pub use loyalty::LoyaltyPolicy;
pub use money::Money;
pub use order::{DEFAULT_CUSTOMER, LineItem, NewOrder, Order, OrderError, final_total, validate_cart};
pub use status::OrderStatus;

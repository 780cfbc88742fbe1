//! Boutique Core - Shared types library.
//!
//! This crate provides the domain types used across all Boutique components:
//! - `server` - Order intake, notification fan-out and admin API
//! - `cli` - Command-line tools for migrations, receipts and exports
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including from tests that never touch a network.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money and chat destinations, the
//!   order model, and the loyalty milestone rule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Telegram integration.
//!
//! - [`TelegramClient`] delivers notifications through the Bot API
//! - [`init_data`] verifies the identity the WebApp front-end forwards

mod client;
pub mod init_data;

pub use client::TelegramClient;
pub use init_data::{InitDataError, InitDataVerifier, WebAppUser, sign_init_data};

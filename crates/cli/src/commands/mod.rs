//! CLI subcommands.

pub mod export;
pub mod migrate;
pub mod receipt;

use thiserror::Error;

use boutique_server::config::ConfigError;
use boutique_server::db::RepositoryError;
use boutique_server::services::receipt::ReceiptError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// No order has the requested id.
    #[error("Order {0} not found")]
    OrderNotFound(i64),

    /// Receipt rendering failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! boutique migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BOUTIQUE_DATABASE_URL` - `SQLite` connection string (fallback: `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, embedded at compile time.

use sqlx::SqlitePool;

use boutique_server::db;

use super::CommandError;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CommandError::Migration` if a migration fails.
pub async fn run(pool: &SqlitePool) -> Result<(), CommandError> {
    tracing::info!("Running migrations...");
    db::migrate(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = db::create_memory_pool().await.unwrap();
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}

//! Receipt command.
//!
//! # Usage
//!
//! ```bash
//! # Write the PDF receipt of order 42 to receipt_42.pdf
//! boutique receipt 42
//!
//! # Choose the output file
//! boutique receipt 42 --output /tmp/order.pdf
//! ```

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;

use boutique_core::OrderId;
use boutique_server::db::OrderRepository;
use boutique_server::services::receipt::ReceiptFormatter;

use super::CommandError;

/// Render the PDF receipt of an order to a file.
///
/// Writes to `output`, or `receipt_<id>.pdf` in the working directory.
/// Returns the path written.
///
/// # Errors
///
/// Returns `CommandError::OrderNotFound` if the order does not exist.
pub async fn run(
    pool: &SqlitePool,
    formatter: &ReceiptFormatter,
    id: i64,
    output: Option<&Path>,
) -> Result<PathBuf, CommandError> {
    let order = OrderRepository::new(pool)
        .get(OrderId::new(id))
        .await?
        .ok_or(CommandError::OrderNotFound(id))?;

    let pdf = formatter.pdf(&order)?;
    let path = output.map_or_else(
        || PathBuf::from(ReceiptFormatter::pdf_filename(&order)),
        Path::to_path_buf,
    );
    tokio::fs::write(&path, &pdf).await?;

    tracing::info!(order_id = id, path = %path.display(), bytes = pdf.len(), "Receipt written");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::{LineItem, Money, NewOrder};
    use boutique_server::db;

    use super::*;

    async fn pool_with_order() -> (SqlitePool, i64) {
        let pool = db::create_memory_pool().await.unwrap();
        db::migrate(&pool).await.unwrap();
        let item = LineItem::new(1, "A", "std", 2, Money::from_minor(1000)).unwrap();
        let draft = NewOrder::new(
            "Boutique Center",
            "Bob",
            "Livraison",
            "1 rue de la Paix",
            vec![item],
            Money::from_minor(2000),
            Money::ZERO,
        )
        .unwrap();
        let order = OrderRepository::new(&pool).create(&draft).await.unwrap();
        (pool, order.id.as_i64())
    }

    fn formatter() -> ReceiptFormatter {
        ReceiptFormatter::new("EUR", chrono_tz::Europe::Paris)
    }

    #[tokio::test]
    async fn test_writes_pdf() {
        let (pool, id) = pool_with_order().await;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pdf");

        let path = run(&pool, &formatter(), id, Some(&out)).await.unwrap();
        assert_eq!(path, out);
        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_missing_order() {
        let (pool, _) = pool_with_order().await;
        let dir = tempfile::tempdir().unwrap();
        let err = run(&pool, &formatter(), 999, Some(&dir.path().join("x.pdf")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::OrderNotFound(999)));
    }
}

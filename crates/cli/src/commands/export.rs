//! CSV export command.
//!
//! # Usage
//!
//! ```bash
//! # Print the export
//! boutique export
//!
//! # Write it to a file
//! boutique export --output orders.csv
//! ```

use std::io::Write;
use std::path::Path;

use sqlx::SqlitePool;

use boutique_server::db::OrderRepository;
use boutique_server::services::export::orders_csv;

use super::CommandError;

/// Export every order as CSV, newest first.
///
/// Writes to `output` when given, otherwise to `stdout`.
///
/// # Errors
///
/// Returns an error if the orders cannot be read or the output written.
pub async fn run(
    pool: &SqlitePool,
    output: Option<&Path>,
    stdout: &mut impl Write,
) -> Result<usize, CommandError> {
    let orders = OrderRepository::new(pool).list().await?;
    let csv = orders_csv(&orders);

    match output {
        Some(path) => {
            tokio::fs::write(path, csv.as_bytes()).await?;
            tracing::info!(orders = orders.len(), path = %path.display(), "Export written");
        }
        None => stdout.write_all(csv.as_bytes())?,
    }

    Ok(orders.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::{LineItem, Money, NewOrder};
    use boutique_server::db;
    use boutique_server::services::export::CSV_HEADER;

    use super::*;

    async fn pool_with_orders(n: usize) -> SqlitePool {
        let pool = db::create_memory_pool().await.unwrap();
        db::migrate(&pool).await.unwrap();
        let repo = OrderRepository::new(&pool);
        for i in 0..n {
            let item = LineItem::new(1, "A", "", 1, Money::from_minor(500)).unwrap();
            let draft = NewOrder::new(
                "Boutique Center",
                format!("Customer {i}"),
                "Retrait",
                "",
                vec![item],
                Money::from_minor(500),
                Money::ZERO,
            )
            .unwrap();
            repo.create(&draft).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_export_to_writer() {
        let pool = pool_with_orders(2).await;
        let mut out = Vec::new();

        let count = run(&pool, None, &mut out).await.unwrap();
        assert_eq!(count, 2);

        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.first().copied(), Some(CSV_HEADER));
        assert!(lines.get(1).unwrap().contains("Customer 1"));
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let pool = pool_with_orders(1).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let mut unused = Vec::new();

        run(&pool, Some(&path), &mut unused).await.unwrap();
        assert!(unused.is_empty());
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with(CSV_HEADER));
    }
}

//! Order repository.
//!
//! Orders are append-only from the checkout flow; the admin surface may
//! update their status or address, or delete them. Line items live in the
//! `items` column as a JSON array.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{instrument, warn};

use boutique_core::{LineItem, Money, NewOrder, Order, OrderId, OrderStatus};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, created_at, shop, customer, fulfillment, address, items, \
                             gross_total, discount, total, status";

/// Raw `orders` row.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
    shop: String,
    customer: String,
    fulfillment: String,
    address: String,
    items: String,
    gross_total: i64,
    discount: i64,
    total: i64,
    status: String,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status for order {}: {e}", self.id))
        })?;

        Ok(Order {
            items: decode_items(self.id, &self.items),
            id: self.id,
            created_at: self.created_at,
            shop: self.shop,
            customer: self.customer,
            fulfillment: self.fulfillment,
            address: self.address,
            gross_total: Money::from_minor(self.gross_total),
            discount: Money::from_minor(self.discount),
            total: Money::from_minor(self.total),
            status,
        })
    }
}

/// Parse the embedded items, degrading to an empty list when unreadable.
fn decode_items(id: OrderId, raw: &str) -> Vec<LineItem> {
    match serde_json::from_str::<Vec<LineItem>>(raw) {
        Ok(items) => items.into_iter().map(LineItem::recomputed).collect(),
        Err(e) => {
            warn!(order_id = %id, error = %e, "Unreadable line items, rendering order without them");
            Vec::new()
        }
    }
}

/// Admin-side edits to an order. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderChanges {
    /// New lifecycle status.
    pub status: Option<OrderStatus>,
    /// New delivery address.
    pub address: Option<String>,
}

impl OrderChanges {
    /// Whether nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.address.is_none()
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new order.
    ///
    /// The id and creation timestamp are assigned here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, order), fields(customer = %order.customer))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let items = serde_json::to_string(&order.items)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable items: {e}")))?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders \
                (created_at, shop, customer, fulfillment, address, items, \
                 gross_total, discount, total, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(&order.shop)
        .bind(&order.customer)
        .bind(&order.fulfillment)
        .bind(&order.address)
        .bind(items)
        .bind(order.gross_total.minor())
        .bind(order.discount.minor())
        .bind(order.total.minor())
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(self.pool)
        .await?;

        row.into_order()
    }

    /// Count orders already placed under an exact customer name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_customer(&self, customer: &str) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer = ?")
            .bind(customer)
            .fetch_one(self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative order count {count}")))
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        self.list_since(None).await
    }

    /// List orders created at or after `since`, newest first. `None` lists
    /// every order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ?1 IS NULL OR julianday(created_at) >= julianday(?1) \
             ORDER BY id DESC"
        ))
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Apply admin edits to an order and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders \
             SET status = COALESCE(?, status), address = COALESCE(?, address) \
             WHERE id = ? \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(changes.status.as_ref().map(OrderStatus::as_str))
        .bind(changes.address.as_deref())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_order()
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

//! Order creation orchestrator.
//!
//! Each checkout runs a strictly forward pipeline:
//! 1. Validate the cart (no side effects on failure)
//! 2. Count the customer's prior orders
//! 3. Compute the loyalty discount and final total
//! 4. Persist the order
//! 5. Format receipts and dispatch notifications
//!
//! Steps 2-4 run under a per-customer lock so concurrent checkouts by the
//! same customer cannot both observe the same prior count. Once step 4
//! succeeds the order exists; notification failures never undo it.

use std::sync::Arc;

use boutique_core::{ChatId, LineItem, LoyaltyPolicy, Money, NewOrder, Order, OrderError, validate_cart};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::db::{OrderRepository, RepositoryError};
use crate::services::notify::{DeliveryReport, NotificationDispatcher};
use crate::services::telegram::InitDataVerifier;

/// Errors that abort a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart was rejected before anything was stored.
    #[error(transparent)]
    Validation(#[from] OrderError),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// One cart line as received from the client, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    /// Product name.
    pub name: String,
    /// Variant label.
    pub variant: String,
    /// Requested quantity.
    pub qty: i64,
    /// Unit price in minor units.
    pub price: i64,
    /// Line total computed by the client, if sent.
    pub line_total: Option<i64>,
}

/// How the customer can be reached, as claimed by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerIdentity {
    /// Signed Telegram WebApp `initData`.
    pub init_data: Option<String>,
    /// Raw numeric user id, unverified.
    pub user_id: Option<String>,
}

/// A checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDraft {
    /// Customer name; blank falls back to the default name.
    pub customer: Option<String>,
    /// Fulfillment type.
    pub fulfillment: String,
    /// Delivery address.
    pub address: String,
    /// Cart lines.
    pub items: Vec<DraftItem>,
    /// Declared total in minor units.
    pub total: i64,
    /// Messaging identity for the customer receipt.
    pub identity: CustomerIdentity,
}

impl CheckoutDraft {
    /// Validate the cart into line items.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderError`] found.
    pub fn line_items(&self) -> Result<Vec<LineItem>, OrderError> {
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let line = i + 1;
                let qty = u32::try_from(item.qty)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(OrderError::InvalidQuantity { line })?;
                LineItem::with_supplied_total(
                    line,
                    item.name.trim(),
                    item.variant.trim(),
                    qty,
                    Money::from_minor(item.price),
                    item.line_total.map(Money::from_minor),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        validate_cart(&items, Money::from_minor(self.total))?;
        Ok(items)
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// The persisted order.
    pub order: Order,
    /// Whether the customer received their receipt.
    pub receipt_sent: bool,
    /// Per-recipient delivery reports.
    pub reports: Vec<DeliveryReport>,
}

/// Keyed async mutex serializing work per customer name.
///
/// Entries are removed once nobody holds or waits for them, so the map only
/// grows with the number of customers checking out concurrently.
#[derive(Debug, Clone, Default)]
pub struct CustomerLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CustomerLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> CustomerLockGuard {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        CustomerLockGuard {
            guard: Some(mutex.lock_owned().await),
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one customer key, released on drop.
#[derive(Debug)]
pub struct CustomerLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for CustomerLockGuard {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference when idle.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Runs checkouts end to end.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    shop: String,
    loyalty: LoyaltyPolicy,
    locks: CustomerLocks,
    dispatcher: NotificationDispatcher,
    verifier: Option<InitDataVerifier>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        shop: impl Into<String>,
        loyalty: LoyaltyPolicy,
        dispatcher: NotificationDispatcher,
        verifier: Option<InitDataVerifier>,
    ) -> Self {
        Self {
            pool,
            shop: shop.into(),
            loyalty,
            locks: CustomerLocks::new(),
            dispatcher,
            verifier,
        }
    }

    /// Lock table used to serialize checkouts.
    #[must_use]
    pub const fn locks(&self) -> &CustomerLocks {
        &self.locks
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` before anything is stored, or
    /// `CheckoutError::Storage` if the store fails. Notification failures
    /// are never errors.
    #[instrument(skip(self, draft), fields(items = draft.items.len()))]
    pub async fn checkout(&self, draft: CheckoutDraft) -> Result<CheckoutOutcome, CheckoutError> {
        let items = draft.line_items()?;
        let gross_total = Money::from_minor(draft.total);
        let customer = draft.customer.unwrap_or_default();

        let draft_order = NewOrder::new(
            &self.shop,
            customer,
            draft.fulfillment,
            draft.address,
            items,
            gross_total,
            Money::ZERO,
        )?;

        let order = {
            let repo = OrderRepository::new(&self.pool);
            let _lock = self.locks.lock(&draft_order.customer).await;
            let prior = repo.count_by_customer(&draft_order.customer).await?;
            let discount = self.loyalty.discount_for(prior);
            debug!(prior, discount = %discount, "Loyalty evaluated");
            repo.create(&draft_order.with_discount(discount)).await?
        };

        info!(
            order_id = %order.id,
            customer = %order.customer,
            discount = %order.discount,
            total = %order.total,
            "Order created"
        );

        let destination = self.resolve_customer(&draft.identity, Utc::now());
        let dispatch = self.dispatcher.dispatch(&order, destination.as_ref()).await;

        Ok(CheckoutOutcome {
            receipt_sent: dispatch.receipt_sent(),
            reports: dispatch.reports,
            order,
        })
    }

    /// Resolve where the customer receipt goes.
    ///
    /// A verified `initData` wins; otherwise a numeric raw id is used as is.
    #[must_use]
    pub fn resolve_customer(
        &self,
        identity: &CustomerIdentity,
        now: DateTime<Utc>,
    ) -> Option<ChatId> {
        let init_data = identity
            .init_data
            .as_deref()
            .filter(|raw| !raw.trim().is_empty());

        if let (Some(verifier), Some(raw)) = (&self.verifier, init_data) {
            match verifier.verify(raw, now) {
                Ok(user) => return Some(ChatId::from_user_id(user.id)),
                Err(e) => warn!(error = %e, "Rejected Telegram initData"),
            }
        }

        identity
            .user_id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(ChatId::from_user_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use boutique_core::OrderStatus;

    use super::*;
    use crate::db::create_memory_pool;
    use crate::services::receipt::tests::formatter;
    use crate::services::telegram::sign_init_data;

    const BOT_TOKEN: &str = "123456:TEST";

    fn item(qty: i64, price: i64) -> DraftItem {
        DraftItem {
            name: "A".to_string(),
            variant: "std".to_string(),
            qty,
            price,
            line_total: None,
        }
    }

    fn draft(customer: &str, items: Vec<DraftItem>, total: i64) -> CheckoutDraft {
        CheckoutDraft {
            customer: Some(customer.to_string()),
            fulfillment: "Livraison".to_string(),
            address: "1 rue de la Paix".to_string(),
            items,
            total,
            identity: CustomerIdentity::default(),
        }
    }

    async fn service() -> OrderService {
        let pool = create_memory_pool().await.unwrap();
        crate::db::migrate(&pool).await.unwrap();
        let dispatcher = NotificationDispatcher::new(None, formatter(), None, None);
        let verifier = InitDataVerifier::new(BOT_TOKEN.into(), Duration::from_secs(3600));
        OrderService::new(
            pool,
            "Boutique Center",
            LoyaltyPolicy::default(),
            dispatcher,
            Some(verifier),
        )
    }

    #[test]
    fn test_line_items_recomputed() {
        let items = draft("Bob", vec![item(2, 1000)], 2000).line_items().unwrap();
        assert_eq!(items[0].line_total, Money::from_minor(2000));
    }

    #[test]
    fn test_line_items_reject_bad_quantities() {
        for qty in [0, -1, i64::from(u32::MAX) + 1] {
            assert_eq!(
                draft("Bob", vec![item(qty, 1000)], 2000).line_items(),
                Err(OrderError::InvalidQuantity { line: 1 })
            );
        }
    }

    #[test]
    fn test_line_items_reject_mismatched_total() {
        let mut line = item(2, 1000);
        line.line_total = Some(1500);
        assert!(matches!(
            draft("Bob", vec![line], 2000).line_items(),
            Err(OrderError::LineTotalMismatch { line: 1, .. })
        ));
    }

    #[test]
    fn test_line_items_cart_rules() {
        assert_eq!(
            draft("Bob", vec![], 2000).line_items(),
            Err(OrderError::EmptyCart)
        );
        assert_eq!(
            draft("Bob", vec![item(1, 100)], 0).line_items(),
            Err(OrderError::NonPositiveTotal(Money::ZERO))
        );
    }

    #[tokio::test]
    async fn test_tenth_order_is_discounted() {
        let service = service().await;
        for _ in 0..9 {
            let outcome = service
                .checkout(draft("Bob", vec![item(2, 1000)], 2000))
                .await
                .unwrap();
            assert_eq!(outcome.order.discount, Money::ZERO);
        }

        let tenth = service
            .checkout(draft("Bob", vec![item(2, 1000)], 2000))
            .await
            .unwrap();
        assert_eq!(tenth.order.discount, Money::from_minor(10));
        assert_eq!(tenth.order.total, Money::from_minor(1990));
        assert_eq!(tenth.order.status, OrderStatus::Pending);
        assert!(!tenth.receipt_sent);
    }

    #[tokio::test]
    async fn test_validation_failure_stores_nothing() {
        let service = service().await;
        let err = service.checkout(draft("Bob", vec![], 2000)).await;
        assert!(matches!(err, Err(CheckoutError::Validation(OrderError::EmptyCart))));

        let repo = OrderRepository::new(&service.pool);
        assert_eq!(repo.list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_blank_customer_defaults() {
        let service = service().await;
        let outcome = service
            .checkout(draft("  ", vec![item(1, 500)], 500))
            .await
            .unwrap();
        assert_eq!(outcome.order.customer, "Client");
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_award_one_discount() {
        let service = service().await;
        for _ in 0..8 {
            service
                .checkout(draft("Bob", vec![item(1, 100)], 100))
                .await
                .unwrap();
        }

        // Orders 9 and 10 race; exactly one of them is the 10th.
        let (a, b) = tokio::join!(
            service.checkout(draft("Bob", vec![item(1, 100)], 100)),
            service.checkout(draft("Bob", vec![item(1, 100)], 100)),
        );
        let discounts = [a.unwrap().order.discount, b.unwrap().order.discount];
        assert_eq!(
            discounts.iter().filter(|d| d.is_positive()).count(),
            1,
            "{discounts:?}"
        );
        assert!(service.locks().is_empty());
    }

    #[tokio::test]
    async fn test_locks_are_released() {
        let locks = CustomerLocks::new();
        {
            let _a = locks.lock("Bob").await;
            let _b = locks.lock("Alice").await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = CustomerLocks::new();
        let held = locks.lock("Bob").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("Bob").await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(held);
        contender.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_customer_prefers_verified_identity() {
        let service = service().await;
        let now = Utc::now();
        let auth_date = now.timestamp().to_string();
        let init_data = sign_init_data(
            &[
                ("auth_date", auth_date.as_str()),
                ("user", r#"{"id":777,"first_name":"Bob"}"#),
            ],
            BOT_TOKEN,
        )
        .unwrap();

        let identity = CustomerIdentity {
            init_data: Some(init_data),
            user_id: Some("555".to_string()),
        };
        assert_eq!(
            service.resolve_customer(&identity, now).unwrap().as_str(),
            "777"
        );
    }

    #[tokio::test]
    async fn test_resolve_customer_falls_back_to_raw_id() {
        let service = service().await;
        let identity = CustomerIdentity {
            init_data: Some("user=%7B%7D&hash=deadbeef".to_string()),
            user_id: Some(" 555 ".to_string()),
        };
        assert_eq!(
            service
                .resolve_customer(&identity, Utc::now())
                .unwrap()
                .as_str(),
            "555"
        );

        let none = CustomerIdentity {
            init_data: None,
            user_id: Some("not-a-number".to_string()),
        };
        assert!(service.resolve_customer(&none, Utc::now()).is_none());
        assert!(
            service
                .resolve_customer(&CustomerIdentity::default(), Utc::now())
                .is_none()
        );
    }
}

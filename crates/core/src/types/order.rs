//! Order model.
//!
//! An [`Order`] is created exactly once per checkout. Line items are embedded
//! in the order (stored as a serialized collection, never as child rows) and
//! always carry a line total recomputed from quantity and unit price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::money::Money;
use super::status::OrderStatus;

/// Customer name used when the checkout form leaves it blank.
pub const DEFAULT_CUSTOMER: &str = "Client";

/// Validation failures for order input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The cart has no line items.
    #[error("cart is empty")]
    EmptyCart,

    /// The declared order total is zero or negative.
    #[error("order total must be positive (got {0})")]
    NonPositiveTotal(Money),

    /// A line item quantity is zero, negative or out of range.
    #[error("line {line}: quantity must be a positive integer")]
    InvalidQuantity {
        /// 1-based line number.
        line: usize,
    },

    /// A line item has a negative unit price.
    #[error("line {line}: unit price cannot be negative")]
    NegativePrice {
        /// 1-based line number.
        line: usize,
    },

    /// `qty * price` does not fit in the money range.
    #[error("line {line}: line total overflows")]
    LineTotalOverflow {
        /// 1-based line number.
        line: usize,
    },

    /// The client's line total disagrees with `qty * price`.
    #[error("line {line}: line total {supplied} does not match {expected}")]
    LineTotalMismatch {
        /// 1-based line number.
        line: usize,
        /// Recomputed line total.
        expected: Money,
        /// Line total sent by the client.
        supplied: Money,
    },

    /// A line item has an empty product name.
    #[error("line {line}: product name is required")]
    MissingName {
        /// 1-based line number.
        line: usize,
    },
}

impl OrderError {
    /// Stable machine-readable code for API error payloads.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::NonPositiveTotal(_) => "invalid_total",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::NegativePrice { .. } => "invalid_price",
            Self::LineTotalOverflow { .. } => "line_total_overflow",
            Self::LineTotalMismatch { .. } => "line_total_mismatch",
            Self::MissingName { .. } => "missing_item_name",
        }
    }
}

/// One cart line embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name.
    pub name: String,
    /// Variant label (e.g. "10g").
    #[serde(default)]
    pub variant: String,
    /// Quantity, always positive.
    pub qty: u32,
    /// Unit price.
    #[serde(rename = "price")]
    pub unit_price: Money,
    /// `qty * unit_price`.
    #[serde(rename = "lineTotal")]
    pub line_total: Money,
}

impl LineItem {
    /// Build a line item, recomputing the line total.
    ///
    /// `line` is the 1-based position used in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty name, zero quantity, negative price or
    /// an overflowing line total.
    pub fn new(
        line: usize,
        name: impl Into<String>,
        variant: impl Into<String>,
        qty: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OrderError::MissingName { line });
        }
        if qty == 0 {
            return Err(OrderError::InvalidQuantity { line });
        }
        if unit_price.is_negative() {
            return Err(OrderError::NegativePrice { line });
        }
        let line_total = unit_price
            .checked_mul(qty)
            .ok_or(OrderError::LineTotalOverflow { line })?;

        Ok(Self {
            name,
            variant: variant.into(),
            qty,
            unit_price,
            line_total,
        })
    }

    /// Build a line item and check a client-supplied line total against it.
    ///
    /// # Errors
    ///
    /// Everything [`LineItem::new`] rejects, plus
    /// [`OrderError::LineTotalMismatch`] when `supplied` disagrees.
    pub fn with_supplied_total(
        line: usize,
        name: impl Into<String>,
        variant: impl Into<String>,
        qty: u32,
        unit_price: Money,
        supplied: Option<Money>,
    ) -> Result<Self, OrderError> {
        let item = Self::new(line, name, variant, qty, unit_price)?;
        match supplied {
            Some(supplied) if supplied != item.line_total => Err(OrderError::LineTotalMismatch {
                line,
                expected: item.line_total,
                supplied,
            }),
            _ => Ok(item),
        }
    }

    /// Whether the stored line total equals `qty * unit_price`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unit_price.checked_mul(self.qty) == Some(self.line_total)
    }

    /// Copy of this line with the line total recomputed from `qty * unit_price`.
    ///
    /// Used when reading items back from storage, which may predate
    /// recomputation.
    #[must_use]
    pub fn recomputed(mut self) -> Self {
        if let Some(total) = self.unit_price.checked_mul(self.qty) {
            self.line_total = total;
        }
        self
    }
}

/// Final total after applying a discount: `max(0, declared - discount)`.
#[must_use]
pub fn final_total(declared: Money, discount: Money) -> Money {
    declared.minus_floor_zero(discount)
}

/// An order about to be persisted (no id or timestamp yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Shop the order was placed in.
    pub shop: String,
    /// Customer name, also the loyalty key.
    pub customer: String,
    /// Fulfillment type (delivery, pickup, ...), free text.
    pub fulfillment: String,
    /// Delivery address, may be empty.
    pub address: String,
    /// Ordered line items.
    pub items: Vec<LineItem>,
    /// Declared total before discount.
    pub gross_total: Money,
    /// Loyalty discount applied.
    pub discount: Money,
    /// Post-discount total.
    pub total: Money,
}

impl NewOrder {
    /// Assemble a validated order draft.
    ///
    /// The final total is derived from `gross_total` and `discount`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] when `items` is empty and
    /// [`OrderError::NonPositiveTotal`] when `gross_total <= 0`.
    pub fn new(
        shop: impl Into<String>,
        customer: impl Into<String>,
        fulfillment: impl Into<String>,
        address: impl Into<String>,
        items: Vec<LineItem>,
        gross_total: Money,
        discount: Money,
    ) -> Result<Self, OrderError> {
        validate_cart(&items, gross_total)?;

        let customer = customer.into();
        let customer = if customer.trim().is_empty() {
            DEFAULT_CUSTOMER.to_string()
        } else {
            customer
        };

        Ok(Self {
            shop: shop.into(),
            customer,
            fulfillment: fulfillment.into(),
            address: address.into(),
            items,
            gross_total,
            discount,
            total: final_total(gross_total, discount),
        })
    }
}

impl NewOrder {
    /// Apply a loyalty discount, recomputing the final total.
    #[must_use]
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self.total = final_total(self.gross_total, discount);
        self
    }
}

/// Check the cart-level invariants: non-empty and positive declared total.
///
/// # Errors
///
/// Returns [`OrderError::EmptyCart`] or [`OrderError::NonPositiveTotal`].
pub const fn validate_cart(items: &[LineItem], gross_total: Money) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    if !gross_total.is_positive() {
        return Err(OrderError::NonPositiveTotal(gross_total));
    }
    Ok(())
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned id, strictly increasing.
    pub id: OrderId,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Shop the order was placed in.
    pub shop: String,
    /// Customer name.
    pub customer: String,
    /// Fulfillment type.
    #[serde(rename = "type")]
    pub fulfillment: String,
    /// Delivery address, may be empty.
    pub address: String,
    /// Ordered line items.
    pub items: Vec<LineItem>,
    /// Declared total before discount.
    pub gross_total: Money,
    /// Loyalty discount applied.
    pub discount: Money,
    /// Post-discount total.
    pub total: Money,
    /// Lifecycle status.
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(qty: u32, price: i64) -> LineItem {
        LineItem::new(1, "A", "std", qty, Money::from_minor(price)).unwrap()
    }

    #[test]
    fn test_line_total_is_recomputed() {
        let line = item(2, 1000);
        assert_eq!(line.line_total, Money::from_minor(2000));
        assert!(line.is_consistent());
    }

    #[test]
    fn test_supplied_line_total_mismatch_rejected() {
        let err = LineItem::with_supplied_total(
            3,
            "A",
            "std",
            2,
            Money::from_minor(1000),
            Some(Money::from_minor(1500)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            OrderError::LineTotalMismatch {
                line: 3,
                expected: Money::from_minor(2000),
                supplied: Money::from_minor(1500),
            }
        );
        assert_eq!(err.code(), "line_total_mismatch");
    }

    #[test]
    fn test_supplied_line_total_match_accepted() {
        let line = LineItem::with_supplied_total(
            1,
            "A",
            "std",
            3,
            Money::from_minor(250),
            Some(Money::from_minor(750)),
        );
        assert!(line.is_ok());
    }

    #[test]
    fn test_invalid_lines() {
        assert_eq!(
            LineItem::new(2, "A", "", 0, Money::from_minor(1)),
            Err(OrderError::InvalidQuantity { line: 2 })
        );
        assert_eq!(
            LineItem::new(1, "A", "", 1, Money::from_minor(-1)),
            Err(OrderError::NegativePrice { line: 1 })
        );
        assert_eq!(
            LineItem::new(1, "  ", "", 1, Money::from_minor(1)),
            Err(OrderError::MissingName { line: 1 })
        );
        assert_eq!(
            LineItem::new(1, "A", "", u32::MAX, Money::from_minor(i64::MAX)),
            Err(OrderError::LineTotalOverflow { line: 1 })
        );
    }

    #[test]
    fn test_recomputed_fixes_stale_total() {
        let mut line = item(2, 1000);
        line.line_total = Money::from_minor(1);
        assert!(!line.is_consistent());
        assert!(line.recomputed().is_consistent());
    }

    #[test]
    fn test_new_order_applies_discount_and_default_customer() {
        let order = NewOrder::new(
            "Boutique Center",
            "",
            "Livraison",
            "",
            vec![item(2, 1000)],
            Money::from_minor(2000),
            Money::from_minor(10),
        )
        .unwrap();
        assert_eq!(order.customer, DEFAULT_CUSTOMER);
        assert_eq!(order.total, Money::from_minor(1990));
    }

    #[test]
    fn test_final_total_never_negative() {
        for (declared, discount) in [(1, 10), (10, 10), (0, 0), (100, 0)] {
            let total = final_total(Money::from_minor(declared), Money::from_minor(discount));
            assert!(!total.is_negative());
            assert_eq!(total.minor(), (declared - discount).max(0));
        }
    }

    #[test]
    fn test_cart_validation() {
        assert_eq!(
            validate_cart(&[], Money::from_minor(100)),
            Err(OrderError::EmptyCart)
        );
        assert_eq!(
            validate_cart(&[item(1, 1)], Money::ZERO),
            Err(OrderError::NonPositiveTotal(Money::ZERO))
        );
        assert!(validate_cart(&[item(1, 1)], Money::from_minor(1)).is_ok());
    }

    #[test]
    fn test_line_item_json_field_names() {
        let json = serde_json::to_value(item(2, 1000)).unwrap();
        assert_eq!(json["price"], 1000);
        assert_eq!(json["lineTotal"], 2000);
        assert_eq!(json["qty"], 2);
    }
}

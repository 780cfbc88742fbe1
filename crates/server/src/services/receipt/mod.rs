//! Receipt rendering.
//!
//! A receipt always lists, in order: shop header, order id, localized
//! timestamp, customer (unless anonymized), fulfillment type, item lines,
//! delivery address, discount (only when non-zero) and finally the total.
//!
//! Rendering never fails for a stored order. PDFs are produced in memory on
//! demand; nothing is written to disk. The same renderer also lays out the
//! admin sales recap of a [`Period`].

mod pdf;
mod text;

pub use pdf::ReceiptError;
pub use text::{ReceiptText, escape_html};

use boutique_core::{LineItem, Money, Order};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::ShopConfig;
use crate::services::stats::{Period, SalesStats};

/// Placeholder printed when an order has no delivery address.
pub const NO_ADDRESS: &str = "—";

/// Whether a receipt names the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Full receipt (admin, customer).
    Named,
    /// Customer name omitted (driver).
    Anonymous,
}

/// Formats orders as text and PDF receipts.
#[derive(Debug, Clone)]
pub struct ReceiptFormatter {
    currency: String,
    timezone: Tz,
}

impl ReceiptFormatter {
    /// Create a formatter for a currency label and display timezone.
    #[must_use]
    pub fn new(currency: impl Into<String>, timezone: Tz) -> Self {
        Self {
            currency: currency.into(),
            timezone,
        }
    }

    /// Create a formatter from the shop configuration.
    #[must_use]
    pub fn from_config(shop: &ShopConfig) -> Self {
        Self::new(shop.currency.clone(), shop.timezone)
    }

    /// Format an amount with the currency label (`19.90 EUR`).
    #[must_use]
    pub fn amount(&self, money: Money) -> String {
        format!("{money} {}", self.currency)
    }

    /// Localized creation timestamp (`19/10/2026 14:05`).
    #[must_use]
    pub fn timestamp(&self, order: &Order) -> String {
        self.local_time(order.created_at)
    }

    /// Any instant in the display timezone, same format as [`Self::timestamp`].
    #[must_use]
    pub fn local_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%d/%m/%Y %H:%M")
            .to_string()
    }

    /// One item line: `1. Name - variant - 2 × 10.00 EUR = 20.00 EUR`.
    ///
    /// The line total is recomputed from quantity and unit price.
    #[must_use]
    pub fn item_line(&self, index: usize, item: &LineItem) -> String {
        let line_total = item.unit_price.checked_mul(item.qty).unwrap_or(item.line_total);
        format!(
            "{index}. {} - {} - {} × {} = {}",
            item.name,
            item.variant,
            item.qty,
            self.amount(item.unit_price),
            self.amount(line_total),
        )
    }

    /// Render the text receipt.
    #[must_use]
    pub fn text(&self, order: &Order, audience: Audience) -> ReceiptText {
        text::render(self, order, audience)
    }

    /// Render the PDF receipt.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Pdf` if the document cannot be serialized.
    pub fn pdf(&self, order: &Order) -> Result<Vec<u8>, ReceiptError> {
        pdf::render(self, order)
    }

    /// File name used for an order's PDF receipt.
    #[must_use]
    pub fn pdf_filename(order: &Order) -> String {
        format!("receipt_{}.pdf", order.id)
    }

    /// Render the sales recap of a period.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Pdf` if the document cannot be serialized.
    pub fn recap_pdf(
        &self,
        shop: &str,
        period: Period,
        stats: &SalesStats,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, ReceiptError> {
        pdf::render_recap(self, shop, period, stats, generated_at)
    }

    /// File name of a recap, dated in the display timezone.
    #[must_use]
    pub fn recap_filename(&self, generated_at: DateTime<Utc>) -> String {
        format!(
            "recap_{}.pdf",
            generated_at.with_timezone(&self.timezone).format("%Y-%m-%d")
        )
    }
}

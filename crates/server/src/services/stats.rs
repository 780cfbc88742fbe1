//! Sales dashboard figures.
//!
//! Stats are computed from the orders created within a [`Period`]. Product
//! figures come from the line items embedded in each order; dates are
//! bucketed in the shop timezone.

use std::collections::BTreeMap;

use boutique_core::{Money, Order};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Number of entries kept in [`SalesStats::top_products`].
pub const TOP_PRODUCTS: usize = 10;

/// Reporting window for dashboard stats and recaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Every order ever placed.
    #[default]
    All,
    /// Since local midnight in the shop timezone.
    Today,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl Period {
    /// Human-readable label printed on recaps.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "Depuis le début",
            Self::Today => "Aujourd'hui",
            Self::Week => "7 derniers jours",
            Self::Month => "30 derniers jours",
        }
    }

    /// Earliest creation time included in the period, `None` for all time.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Today => {
                let midnight = now.with_timezone(&tz).date_naive().and_hms_opt(0, 0, 0)?;
                let start = tz
                    .from_local_datetime(&midnight)
                    .earliest()
                    .map_or_else(|| now - Duration::days(1), |local| local.with_timezone(&Utc));
                Some(start)
            }
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now - Duration::days(30)),
        }
    }
}

/// Units sold and revenue for one product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub name: String,
    pub qty: u64,
    pub revenue: Money,
}

/// Orders and revenue for one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub orders: u64,
    pub revenue: Money,
}

/// Aggregated sales figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesStats {
    pub total_orders: u64,
    /// Sum of post-discount totals.
    pub total_revenue: Money,
    /// Revenue divided by order count, rounded; zero without orders.
    pub avg_basket: Money,
    pub total_discounts: Money,
    /// Order count per fulfillment type.
    pub by_type: BTreeMap<String, u64>,
    /// Best sellers by quantity, then revenue, then name.
    pub top_products: Vec<ProductSales>,
    /// One entry per day with orders, oldest first.
    pub daily_trend: Vec<DailyRevenue>,
}

impl SalesStats {
    /// Aggregate a set of orders, bucketing days in `tz`.
    #[must_use]
    pub fn from_orders(orders: &[Order], tz: Tz) -> Self {
        let mut revenue = 0_i64;
        let mut discounts = 0_i64;
        let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
        let mut products: BTreeMap<&str, (u64, i64)> = BTreeMap::new();
        let mut days: BTreeMap<NaiveDate, (u64, i64)> = BTreeMap::new();

        for order in orders {
            revenue = revenue.saturating_add(order.total.minor());
            discounts = discounts.saturating_add(order.discount.minor());
            *by_type.entry(order.fulfillment.clone()).or_default() += 1;

            for item in &order.items {
                let entry = products.entry(item.name.trim()).or_default();
                entry.0 += u64::from(item.qty);
                entry.1 = entry.1.saturating_add(item.line_total.minor());
            }

            let day = order.created_at.with_timezone(&tz).date_naive();
            let entry = days.entry(day).or_default();
            entry.0 += 1;
            entry.1 = entry.1.saturating_add(order.total.minor());
        }

        let total_orders = orders.len() as u64;

        let mut top_products: Vec<ProductSales> = products
            .into_iter()
            .map(|(name, (qty, revenue))| ProductSales {
                name: name.to_string(),
                qty,
                revenue: Money::from_minor(revenue),
            })
            .collect();
        top_products.sort_by(|a, b| {
            b.qty
                .cmp(&a.qty)
                .then(b.revenue.cmp(&a.revenue))
                .then_with(|| a.name.cmp(&b.name))
        });
        top_products.truncate(TOP_PRODUCTS);

        Self {
            total_orders,
            total_revenue: Money::from_minor(revenue),
            avg_basket: Money::from_minor(average(revenue, total_orders)),
            total_discounts: Money::from_minor(discounts),
            by_type,
            top_products,
            daily_trend: days
                .into_iter()
                .map(|(date, (orders, revenue))| DailyRevenue {
                    date,
                    orders,
                    revenue: Money::from_minor(revenue),
                })
                .collect(),
        }
    }
}

/// Integer mean rounded half away from zero.
fn average(sum: i64, count: u64) -> i64 {
    let Ok(count) = i64::try_from(count) else {
        return 0;
    };
    if count == 0 {
        return 0;
    }
    let half = count / 2;
    if sum >= 0 {
        sum.saturating_add(half) / count
    } else {
        sum.saturating_sub(half) / count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use boutique_core::{LineItem, OrderId, OrderStatus};
    use chrono_tz::Europe::Paris;

    use super::*;

    fn order(id: i64, at: DateTime<Utc>, kind: &str, items: &[(&str, u32, i64)], discount: i64) -> Order {
        let items: Vec<LineItem> = items
            .iter()
            .enumerate()
            .map(|(i, (name, qty, price))| {
                LineItem::new(i + 1, *name, "", *qty, Money::from_minor(*price)).unwrap()
            })
            .collect();
        let gross: i64 = items.iter().map(|i| i.line_total.minor()).sum();
        Order {
            id: OrderId::new(id),
            created_at: at,
            shop: "Boutique Center".to_string(),
            customer: "Bob".to_string(),
            fulfillment: kind.to_string(),
            address: String::new(),
            items,
            gross_total: Money::from_minor(gross),
            discount: Money::from_minor(discount),
            total: Money::from_minor(gross - discount),
            status: OrderStatus::Pending,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_stats() {
        let stats = SalesStats::from_orders(&[], Paris);
        assert_eq!(stats, SalesStats::default());
        assert_eq!(stats.avg_basket, Money::ZERO);
    }

    #[test]
    fn test_totals_and_average_basket() {
        let orders = [
            order(1, at(2, 10), "Livraison", &[("Amnesia", 1, 1000)], 0),
            order(2, at(2, 11), "Retrait", &[("Gelato", 1, 501)], 0),
            order(3, at(3, 12), "Livraison", &[("Amnesia", 2, 1000)], 10),
        ];
        let stats = SalesStats::from_orders(&orders, Paris);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue, Money::from_minor(3491));
        assert_eq!(stats.total_discounts, Money::from_minor(10));
        // 3491 / 3 = 1163.67, rounded.
        assert_eq!(stats.avg_basket, Money::from_minor(1164));
        assert_eq!(stats.by_type["Livraison"], 2);
        assert_eq!(stats.by_type["Retrait"], 1);
    }

    #[test]
    fn test_top_products_by_quantity_then_revenue() {
        let orders = [
            order(1, at(2, 10), "Livraison", &[("Gelato", 2, 500), ("Amnesia", 1, 1000)], 0),
            order(2, at(2, 11), "Livraison", &[("Amnesia", 1, 1000), ("OG Kush", 1, 2000)], 0),
        ];
        let stats = SalesStats::from_orders(&orders, Paris);
        let names: Vec<_> = stats.top_products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Amnesia", "Gelato", "OG Kush"]);
        assert_eq!(stats.top_products[0].qty, 2);
        assert_eq!(stats.top_products[0].revenue, Money::from_minor(2000));
    }

    #[test]
    fn test_top_products_capped() {
        let items: Vec<(String, u32, i64)> =
            (0..15).map(|i| (format!("Item {i:02}"), 1, 100)).collect();
        let refs: Vec<(&str, u32, i64)> =
            items.iter().map(|(n, q, p)| (n.as_str(), *q, *p)).collect();
        let stats = SalesStats::from_orders(&[order(1, at(2, 10), "Livraison", &refs, 0)], Paris);
        assert_eq!(stats.top_products.len(), TOP_PRODUCTS);
        assert_eq!(stats.top_products[0].name, "Item 00");
    }

    #[test]
    fn test_daily_trend_uses_local_dates() {
        // 23:30 UTC on March 2nd is already March 3rd in Paris.
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        let orders = [
            order(1, at(3, 10), "Livraison", &[("Amnesia", 1, 1000)], 0),
            order(2, late, "Livraison", &[("Gelato", 1, 500)], 0),
            order(3, at(1, 10), "Retrait", &[("Gelato", 1, 500)], 0),
        ];
        let stats = SalesStats::from_orders(&orders, Paris);
        let trend: Vec<_> = stats
            .daily_trend
            .iter()
            .map(|d| (d.date.to_string(), d.orders, d.revenue.minor()))
            .collect();
        assert_eq!(
            trend,
            [("2026-03-01".to_string(), 1, 500), ("2026-03-03".to_string(), 2, 1500)]
        );
    }

    #[test]
    fn test_period_since() {
        let now = at(10, 15);
        assert_eq!(Period::All.since(now, Paris), None);
        assert_eq!(Period::Week.since(now, Paris), Some(at(3, 15)));
        assert_eq!(Period::Month.since(now, Paris), Some(now - Duration::days(30)));
        // Paris is UTC+1 in March before the DST switch.
        assert_eq!(Period::Today.since(now, Paris), Some(at(9, 23)));
    }

    #[test]
    fn test_period_parses_lowercase() {
        let p: Period = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(p, Period::Week);
        assert!(serde_json::from_str::<Period>("\"year\"").is_err());
    }

    #[test]
    fn test_average_rounding() {
        assert_eq!(average(10, 4), 3);
        assert_eq!(average(9, 4), 2);
        assert_eq!(average(5, 0), 0);
    }
}

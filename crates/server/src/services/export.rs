//! CSV export of the order book.

use std::fmt::Write;

use boutique_core::Order;

/// Header row of the orders export.
pub const CSV_HEADER: &str = "id,created_at,shop,customer,type,address,items,discount,total,status";

/// File name offered for the export download.
pub const CSV_FILENAME: &str = "orders.csv";

/// Render orders as CSV, one row per order, in the given order.
///
/// Items are embedded as their JSON array; amounts use major units.
#[must_use]
pub fn orders_csv(orders: &[Order]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for order in orders {
        let items = serde_json::to_string(&order.items).unwrap_or_else(|_| "[]".to_string());
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{}",
            order.id,
            order.created_at.to_rfc3339(),
            field(&order.shop),
            field(&order.customer),
            field(&order.fulfillment),
            field(&order.address),
            field(&items),
            order.discount,
            order.total,
            field(order.status.as_str()),
        );
    }

    csv
}

/// Quote a field when it contains a delimiter, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::receipt::tests::sample_order;

    #[test]
    fn test_field_quoting() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a,b"), "\"a,b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(orders_csv(&[]), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn test_export_row() {
        let csv = orders_csv(&[sample_order(10)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER);

        let row = lines.next().unwrap();
        assert!(row.starts_with("42,2026-01-15T13:05:00+00:00,Boutique Center,Bob,Livraison,1 rue de la Paix,\"[{"));
        assert!(row.ends_with(",0.10,25.40,pending"));
        assert!(row.contains("\"\"name\"\":\"\"Amnesia\"\""));
        assert!(lines.next().is_none());
    }
}

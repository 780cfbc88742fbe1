//! Text receipt.

use boutique_core::Order;

use super::{Audience, NO_ADDRESS, ReceiptFormatter};

/// A rendered text receipt: body lines followed by the total line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptText {
    /// Every line before the total (blank strings are spacing).
    pub lines: Vec<String>,
    /// The total line, always last.
    pub total: String,
}

impl ReceiptText {
    /// Plain text, newline separated.
    #[must_use]
    pub fn plain(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out.push_str(&self.total);
        out
    }

    /// Telegram HTML: content escaped, total in bold.
    #[must_use]
    pub fn html(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|line| escape_html(line))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str("\n<b>");
        out.push_str(&escape_html(&self.total));
        out.push_str("</b>");
        out
    }
}

pub(super) fn render(f: &ReceiptFormatter, order: &Order, audience: Audience) -> ReceiptText {
    let mut lines = vec![
        format!("Commande {}", order.shop),
        format!("ID commande : #{}", order.id),
        format!("Date : {}", f.timestamp(order)),
    ];

    if audience == Audience::Named {
        lines.push(format!("Client : {}", order.customer));
    }

    lines.push(String::new());
    lines.push("⸻ Détails de la commande ⸻".to_string());
    lines.push(format!("Type de commande : {}", order.fulfillment));
    lines.extend(
        order
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| f.item_line(i + 1, item)),
    );

    lines.push(String::new());
    lines.push("Adresse de livraison :".to_string());
    lines.push(if order.address.trim().is_empty() {
        NO_ADDRESS.to_string()
    } else {
        order.address.clone()
    });

    lines.push(String::new());
    if order.discount.is_positive() {
        lines.push(format!("Remise fidélité : -{}", f.amount(order.discount)));
    }

    ReceiptText {
        lines,
        total: format!("Total de la commande : {}", f.amount(order.total)),
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

//! PDF receipt.
//!
//! Layout is computed as a list of styled lines first, then drawn onto A4
//! pages with the built-in Helvetica faces.

use boutique_core::Order;
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use thiserror::Error;

use super::{NO_ADDRESS, ReceiptFormatter};
use crate::services::stats::{Period, SalesStats};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.5;
const WRAP_COLUMNS: usize = 90;
const LAYER_NAME: &str = "Receipt";

/// Errors that can occur while rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The PDF backend failed.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
    Total,
}

impl Style {
    const fn size(self) -> f32 {
        match self {
            Self::Title => 18.0,
            Self::Heading => 13.0,
            Self::Body => 11.0,
            Self::Total => 14.0,
        }
    }

    const fn bold(self) -> bool {
        matches!(self, Self::Title | Self::Heading | Self::Total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PdfLine {
    text: String,
    style: Style,
}

impl PdfLine {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new(Style::Body, "")
    }
}

/// Receipt content as styled lines, total last.
fn layout(f: &ReceiptFormatter, order: &Order) -> Vec<PdfLine> {
    let mut lines = vec![
        PdfLine::new(Style::Title, order.shop.clone()),
        PdfLine::new(Style::Heading, "Reçu de commande"),
        PdfLine::blank(),
        PdfLine::new(Style::Body, format!("Commande #{}", order.id)),
        PdfLine::new(Style::Body, format!("Date : {}", f.timestamp(order))),
        PdfLine::new(Style::Body, format!("Client : {}", order.customer)),
        PdfLine::new(Style::Body, format!("Type : {}", order.fulfillment)),
        PdfLine::blank(),
        PdfLine::new(Style::Heading, "Articles"),
    ];

    for (i, item) in order.items.iter().enumerate() {
        lines.push(PdfLine::new(Style::Body, f.item_line(i + 1, item)));
    }

    lines.push(PdfLine::blank());
    lines.push(PdfLine::new(Style::Heading, "Adresse de livraison"));
    let address = if order.address.trim().is_empty() {
        NO_ADDRESS
    } else {
        order.address.as_str()
    };
    lines.push(PdfLine::new(Style::Body, address));
    lines.push(PdfLine::blank());

    if order.discount.is_positive() {
        lines.push(PdfLine::new(
            Style::Body,
            format!("Remise fidélité : -{}", f.amount(order.discount)),
        ));
    }
    lines.push(PdfLine::new(
        Style::Total,
        format!("Total : {}", f.amount(order.total)),
    ));

    lines
}

/// Sales recap content as styled lines, revenue last.
fn recap_layout(
    f: &ReceiptFormatter,
    shop: &str,
    period: Period,
    stats: &SalesStats,
    generated_at: DateTime<Utc>,
) -> Vec<PdfLine> {
    let mut lines = vec![
        PdfLine::new(Style::Title, shop),
        PdfLine::new(Style::Heading, "Récapitulatif des ventes"),
        PdfLine::blank(),
        PdfLine::new(Style::Body, format!("Période : {}", period.label())),
        PdfLine::new(Style::Body, format!("Généré le : {}", f.local_time(generated_at))),
        PdfLine::blank(),
        PdfLine::new(Style::Body, format!("Commandes : {}", stats.total_orders)),
        PdfLine::new(Style::Body, format!("Panier moyen : {}", f.amount(stats.avg_basket))),
        PdfLine::new(
            Style::Body,
            format!("Remises fidélité : -{}", f.amount(stats.total_discounts)),
        ),
    ];

    if stats.total_orders == 0 {
        lines.push(PdfLine::blank());
        lines.push(PdfLine::new(Style::Body, "Aucune commande sur la période."));
    } else {
        lines.push(PdfLine::blank());
        lines.push(PdfLine::new(Style::Heading, "Par type"));
        for (kind, count) in &stats.by_type {
            lines.push(PdfLine::new(Style::Body, format!("{kind} : {count}")));
        }

        lines.push(PdfLine::blank());
        lines.push(PdfLine::new(Style::Heading, "Top produits"));
        for (i, product) in stats.top_products.iter().enumerate() {
            lines.push(PdfLine::new(
                Style::Body,
                format!(
                    "{}. {} - {} vendus - {}",
                    i + 1,
                    product.name,
                    product.qty,
                    f.amount(product.revenue)
                ),
            ));
        }

        lines.push(PdfLine::blank());
        lines.push(PdfLine::new(Style::Heading, "Tendance quotidienne"));
        for day in &stats.daily_trend {
            lines.push(PdfLine::new(
                Style::Body,
                format!(
                    "{} : {} commandes - {}",
                    day.date.format("%d/%m/%Y"),
                    day.orders,
                    f.amount(day.revenue)
                ),
            ));
        }
    }

    lines.push(PdfLine::blank());
    lines.push(PdfLine::new(
        Style::Total,
        format!("Chiffre d'affaires : {}", f.amount(stats.total_revenue)),
    ));

    lines
}

/// Built-in PDF fonts only cover WinAnsi; map what receipts commonly use
/// and replace the rest.
fn to_winansi_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '×' => 'x',
            '—' | '–' | '⸻' => '-',
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'É' | 'È' => 'E',
            'À' => 'A',
            'Ç' => 'C',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// Split a line into chunks of at most `columns` characters on word boundaries.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > columns && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    out.push(current);
    out
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub(super) fn render(f: &ReceiptFormatter, order: &Order) -> Result<Vec<u8>, ReceiptError> {
    draw(&format!("Reçu commande #{}", order.id), layout(f, order))
}

pub(super) fn render_recap(
    f: &ReceiptFormatter,
    shop: &str,
    period: Period,
    stats: &SalesStats,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ReceiptError> {
    draw(
        &format!("Récapitulatif {}", period.label()),
        recap_layout(f, shop, period, stats, generated_at),
    )
}

/// Draw styled lines top to bottom, adding A4 pages as needed.
fn draw(title: &str, lines: Vec<PdfLine>) -> Result<Vec<u8>, ReceiptError> {
    let (doc, page, layer) = PdfDocument::new(
        to_winansi_safe(title),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        LAYER_NAME.to_string(),
    );
    let fonts = Fonts {
        regular: add_font(&doc, BuiltinFont::Helvetica)?,
        bold: add_font(&doc, BuiltinFont::HelveticaBold)?,
    };

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT.0 - MARGIN;

    for line in lines {
        let font = if line.style.bold() {
            &fonts.bold
        } else {
            &fonts.regular
        };
        let height = LINE_HEIGHT * line.style.size() / Style::Body.size();

        for chunk in wrap(&to_winansi_safe(&line.text), WRAP_COLUMNS) {
            if y - height < MARGIN {
                let (next_page, next_layer) =
                    doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME.to_string());
                current = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT.0 - MARGIN;
            }
            y -= height;
            if !chunk.is_empty() {
                current.use_text(chunk, line.style.size(), Mm(MARGIN), Mm(y), font);
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ReceiptError::Pdf(e.to_string()))
}

fn add_font(
    doc: &PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, ReceiptError> {
    doc.add_builtin_font(font)
        .map_err(|e| ReceiptError::Pdf(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::{LineItem, Money};

    use super::super::tests::{formatter, sample_order};
    use super::*;

    #[test]
    fn test_layout_total_last_and_bold() {
        let lines = layout(&formatter(), &sample_order(10));
        let last = lines.last().unwrap();
        assert_eq!(last.style, Style::Total);
        assert!(last.style.bold());
        assert_eq!(last.text, "Total : 25.40 EUR");
    }

    #[test]
    fn test_layout_discount_only_when_positive() {
        let has_discount = |order: Order| {
            layout(&formatter(), &order)
                .iter()
                .any(|l| l.text.starts_with("Remise"))
        };
        assert!(!has_discount(sample_order(0)));
        assert!(has_discount(sample_order(10)));
    }

    #[test]
    fn test_layout_item_lines_in_order() {
        let lines = layout(&formatter(), &sample_order(0));
        let items: Vec<_> = lines
            .iter()
            .filter(|l| l.text.starts_with("1. ") || l.text.starts_with("2. "))
            .map(|l| l.text.clone())
            .collect();
        assert_eq!(items.len(), 2);
        assert!(items.first().unwrap().starts_with("1. Amnesia"));
    }

    fn recap_stats() -> SalesStats {
        SalesStats::from_orders(&[sample_order(10)], chrono_tz::Europe::Paris)
    }

    fn generated_at() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2026, 1, 15, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_recap_layout_sections() {
        let lines = recap_layout(
            &formatter(),
            "Boutique Center",
            Period::Week,
            &recap_stats(),
            generated_at(),
        );
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&"Période : 7 derniers jours"));
        assert!(texts.contains(&"Généré le : 15/01/2026 19:30"));
        assert!(texts.contains(&"Commandes : 1"));
        assert!(texts.contains(&"Panier moyen : 25.40 EUR"));
        assert!(texts.contains(&"Livraison : 1"));
        assert!(texts.contains(&"1. Amnesia - 2 vendus - 20.00 EUR"));
        assert!(texts.contains(&"15/01/2026 : 1 commandes - 25.40 EUR"));

        let last = lines.last().unwrap();
        assert_eq!(last.style, Style::Total);
        assert_eq!(last.text, "Chiffre d'affaires : 25.40 EUR");
    }

    #[test]
    fn test_recap_layout_without_orders() {
        let lines = recap_layout(
            &formatter(),
            "Boutique Center",
            Period::Today,
            &SalesStats::default(),
            generated_at(),
        );
        assert!(lines.iter().any(|l| l.text == "Aucune commande sur la période."));
        assert!(!lines.iter().any(|l| l.text == "Top produits"));
        assert_eq!(lines.last().unwrap().text, "Chiffre d'affaires : 0.00 EUR");
    }

    #[test]
    fn test_recap_pdf_bytes() {
        let bytes = formatter()
            .recap_pdf("Boutique Center", Period::All, &recap_stats(), generated_at())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_winansi_mapping() {
        assert_eq!(to_winansi_safe("Reçu - 2 × 5 — é"), "Recu - 2 x 5 - e");
        assert_eq!(to_winansi_safe("日本"), "??");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("", 10), vec![String::new()]);
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("averyveryverylongword x", 5), vec!["averyveryverylongword", "x"]);
    }

    #[test]
    fn test_pdf_bytes() {
        let bytes = formatter().pdf(&sample_order(10)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_spills_onto_new_pages() {
        let mut order = sample_order(0);
        order.items = (0..120)
            .map(|i| LineItem::new(i + 1, format!("Item {i}"), "1g", 1, Money::from_minor(100)).unwrap())
            .collect();
        let long = formatter().pdf(&order).unwrap();
        let short = formatter().pdf(&sample_order(0)).unwrap();
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_pdf_without_items_or_address() {
        let mut order = sample_order(0);
        order.items.clear();
        order.address.clear();
        assert!(formatter().pdf(&order).is_ok());
    }
}

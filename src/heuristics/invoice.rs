use regex::{Captures, Regex};
use time::Date;
use time::macros::format_description;
use tracing::warn;

use super::{InvoiceData, InvoiceLineItem};
use crate::config::RowPolicy;
use crate::error::ExtractError;

/// Extract fixed invoice fields from model output.
///
/// Each scalar pattern is applied independently; a field without a
/// match resolves to `None`. Only a line-item row that matches the
/// grammar but fails numeric coercion can error, and then only under
/// `RowPolicy::Abort`. Pure function of its input.
pub fn extract_invoice(text: &str, policy: RowPolicy) -> Result<InvoiceData, ExtractError> {
    Ok(InvoiceData {
        invoice_number: extract_invoice_number(text),
        invoice_date: extract_date(text, r"(?i)Invoice\s+Date\s*:?\s*(\d{2}/\d{2}/\d{4})"),
        due_date: extract_date(text, r"(?i)Due\s+Date\s*:?\s*(\d{2}/\d{2}/\d{4})"),
        total_amount: extract_total_amount(text),
        line_items: extract_line_items(text, policy)?,
    })
}

fn extract_invoice_number(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Invoice\s*#\s*:\s*(\d+)").ok()?;
    re.captures(text).map(|c| c[1].to_string())
}

/// Match a labeled MM/DD/YYYY date and reformat it as MM-DD-YYYY.
/// Matches that are not real calendar dates resolve to None.
fn extract_date(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let raw = re.captures(text).map(|c| c[1].to_string())?;
    let format = format_description!("[month]/[day]/[year]");
    Date::parse(&raw, &format).ok()?;
    Some(raw.replace('/', "-"))
}

/// The grand total sits between the invoice-number anchor and the
/// "Pay this amount" stub on the remittance slip.
fn extract_total_amount(text: &str) -> Option<f64> {
    let re =
        Regex::new(r"(?is)Invoice\s*#\s*:.*?Pay\s+this\s+amount\s*:?\s*\$?\s*([\d,]+\.\d{2})")
            .ok()?;
    let cap = re.captures(text)?;
    cap[1].replace(',', "").parse().ok()
}

/// Row grammar: `quantity item_number size description net ext`.
/// The size column is matched for alignment but not carried.
fn extract_line_items(
    text: &str,
    policy: RowPolicy,
) -> Result<Vec<InvoiceLineItem>, ExtractError> {
    let row_re =
        Regex::new(r"(?m)^\s*(\d+)\s+(\S+)\s+(\S+)\s+(.+?)\s+([\d.,]+)\s+([\d.,]+)\s*$").unwrap();

    let mut items = Vec::new();
    for cap in row_re.captures_iter(text) {
        match coerce_row(&cap) {
            Some(item) => items.push(item),
            None => match policy {
                RowPolicy::Abort => {
                    return Err(ExtractError::RowCoercion {
                        row: cap[0].trim().to_string(),
                    });
                }
                RowPolicy::Skip => {
                    warn!(row = cap[0].trim(), "Skipping row that failed numeric coercion");
                }
            },
        }
    }
    Ok(items)
}

fn coerce_row(cap: &Captures<'_>) -> Option<InvoiceLineItem> {
    let quantity: u32 = cap[1].parse().ok()?;
    let net_amount: f64 = cap[5].replace(',', "").parse().ok()?;
    let ext_amount: f64 = cap[6].replace(',', "").parse().ok()?;
    Some(InvoiceLineItem {
        item_number: cap[2].to_string(),
        description: cap[4].trim().to_string(),
        quantity,
        price: net_amount,
        net_amount,
        ext_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ACME WHOLESALE
Invoice #: 1001
Invoice Date: 02/14/2026
Due Date: 03/16/2026

2 SKU1 750ml WidgetX 10.00 20.00
1 SKU2 1L GadgetY 5.25 5.25

Pay this amount: $87.65";

    #[test]
    fn extracts_scalar_fields() {
        let invoice = extract_invoice(SAMPLE, RowPolicy::Abort).unwrap();
        assert_eq!(invoice.invoice_number.as_deref(), Some("1001"));
        assert_eq!(invoice.invoice_date.as_deref(), Some("02-14-2026"));
        assert_eq!(invoice.due_date.as_deref(), Some("03-16-2026"));
        assert_eq!(invoice.total_amount, Some(87.65));
        assert_eq!(invoice.coverage(), (4, 4));
    }

    #[test]
    fn parses_line_item_rows() {
        let invoice = extract_invoice(SAMPLE, RowPolicy::Abort).unwrap();
        assert_eq!(invoice.line_items.len(), 2);

        let first = &invoice.line_items[0];
        assert_eq!(first.item_number, "SKU1");
        assert_eq!(first.description, "WidgetX");
        assert_eq!(first.quantity, 2);
        assert_eq!(first.price, 10.00);
        assert_eq!(first.net_amount, 10.00);
        assert_eq!(first.ext_amount, 20.00);
    }

    #[test]
    fn multi_word_descriptions_are_kept_whole() {
        let text = "3 SKU9 12oz Cold Brew Can 2.50 7.50";
        let invoice = extract_invoice(text, RowPolicy::Abort).unwrap();
        assert_eq!(invoice.line_items[0].description, "Cold Brew Can");
    }

    #[test]
    fn missing_fields_resolve_to_none() {
        let invoice = extract_invoice("nothing invoice-like here", RowPolicy::Abort).unwrap();
        assert_eq!(invoice.invoice_number, None);
        assert_eq!(invoice.invoice_date, None);
        assert_eq!(invoice.due_date, None);
        assert_eq!(invoice.total_amount, None);
        assert!(invoice.line_items.is_empty());
        assert_eq!(invoice.coverage(), (0, 4));
    }

    #[test]
    fn impossible_calendar_date_resolves_to_none() {
        let invoice =
            extract_invoice("Invoice Date: 02/30/2026", RowPolicy::Abort).unwrap();
        assert_eq!(invoice.invoice_date, None);
    }

    #[test]
    fn total_requires_both_anchors() {
        let invoice =
            extract_invoice("Pay this amount: $87.65", RowPolicy::Abort).unwrap();
        assert_eq!(invoice.total_amount, None);
    }

    #[test]
    fn coercion_failure_aborts_under_abort_policy() {
        let text = "2 SKU1 750ml WidgetX 10.00.1 20.00";
        let err = extract_invoice(text, RowPolicy::Abort).unwrap_err();
        assert!(matches!(err, ExtractError::RowCoercion { .. }));
    }

    #[test]
    fn coercion_failure_is_dropped_under_skip_policy() {
        let text = "2 SKU1 750ml WidgetX 10.00.1 20.00\n1 SKU2 1L GadgetY 5.25 5.25";
        let invoice = extract_invoice(text, RowPolicy::Skip).unwrap();
        assert_eq!(invoice.line_items.len(), 1);
        assert_eq!(invoice.line_items[0].item_number, "SKU2");
    }

    #[test]
    fn thousands_separators_are_tolerated() {
        let text = "10 SKU3 2kg Anvil 1,250.00 12,500.00";
        let invoice = extract_invoice(text, RowPolicy::Abort).unwrap();
        assert_eq!(invoice.line_items[0].net_amount, 1250.00);
        assert_eq!(invoice.line_items[0].ext_amount, 12500.00);
    }
}

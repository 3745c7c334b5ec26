use regex::Regex;

use super::{ReceiptDocument, ReceiptItem};

/// Parse cleaned receipt text into a field mapping plus line items.
///
/// Rules are tried per non-blank line in a fixed order that downstream
/// consumers depend on:
///   1. `<label> <price>` — no colon in the label, price with exactly
///      two fraction digits: one item, recorded and closed out;
///   2. `<key>: <value>` — a top-level field;
///   3. anything else — a bare label with no value.
///
/// Absence of a match never fails the call; unrecognizable text just
/// yields an empty document.
pub fn structure_text(text: &str) -> ReceiptDocument {
    let item_re = Regex::new(r"^([^:]+?)\s+(\d+\.\d{2})\b").unwrap();
    let kv_re = Regex::new(r"^(.+?):\s*(.+)").unwrap();

    let mut doc = ReceiptDocument::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(cap) = item_re.captures(line) {
            doc.items.push(ReceiptItem {
                label: cap[1].trim().to_string(),
                price: cap[2].to_string(),
            });
            continue;
        }

        if let Some(cap) = kv_re.captures(line) {
            doc.set_field(cap[1].trim(), Some(cap[2].trim().to_string()));
            continue;
        }

        doc.set_field(line, None);
    }

    doc
}

/// Best-effort answer for a label query ("total", "date", ...).
///
/// First bridges the query to the nearest two-fraction-digit price,
/// across line breaks; failing that, echoes the first line mentioning
/// the query; failing that, a fixed apology. Always returns a string.
pub fn answer_query(text: &str, query: &str) -> String {
    let text_lower = text.to_lowercase();
    let query_lower = query.to_lowercase();

    let price_re = Regex::new(&format!(
        r"(?s){}.*?(\d+\.\d{{2}})",
        regex::escape(&query_lower)
    ))
    .unwrap();
    if let Some(cap) = price_re.captures(&text_lower) {
        return format!("{}: {}", capitalize(query), &cap[1]);
    }

    for line in text.lines() {
        if line.to_lowercase().contains(&query_lower) {
            return line.trim().to_string();
        }
    }

    format!("Sorry, no information found for the prompt '{query}'.")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn colon_lines_become_fields_and_price_lines_become_items() {
        let doc = structure_text("Total:  42.50\nVendor: Acme\nSubtotal 10.00");
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "Total": "42.50",
                "Vendor": "Acme",
                "items": [{"Subtotal": "10.00"}],
            })
        );
    }

    #[test]
    fn unrecognizable_text_yields_empty_document() {
        assert!(structure_text("").is_empty());
        assert!(structure_text("\n  \n\t\n").is_empty());
        let rendered = serde_json::to_string(&structure_text("   ")).unwrap();
        assert_eq!(rendered, "{}");
    }

    #[test]
    fn no_items_key_without_items() {
        let doc = structure_text("Vendor: Acme");
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("items").is_none());
    }

    #[test]
    fn bare_lines_become_null_fields() {
        let doc = structure_text("ACME SUPERMARKET\nVendor: Acme");
        assert_eq!(doc.get("ACME SUPERMARKET"), Some(&None));
        assert_eq!(
            doc.get("Vendor"),
            Some(&Some("Acme".to_string()))
        );
    }

    #[test]
    fn price_needs_exactly_two_fraction_digits() {
        // Three fraction digits fails the item rule and falls through
        // to the bare-label rule.
        let doc = structure_text("Coffee 3.505");
        assert!(doc.items.is_empty());
        assert_eq!(doc.get("Coffee 3.505"), Some(&None));
    }

    #[test]
    fn each_item_line_is_its_own_item() {
        let doc = structure_text("Coffee 3.50\nBagel 2.25");
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].label, "Coffee");
        assert_eq!(doc.items[0].price, "3.50");
        assert_eq!(doc.items[1].label, "Bagel");
        assert_eq!(doc.items[1].price, "2.25");
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let doc = structure_text("Vendor: Acme\nVendor: Globex");
        assert_eq!(doc.get("Vendor"), Some(&Some("Globex".to_string())));
        assert_eq!(doc.fields.len(), 1);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let doc = structure_text("Vendor: Acme\n\n\nCoffee 3.50");
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.items.len(), 1);
    }

    #[test]
    fn query_bridges_label_to_price() {
        assert_eq!(
            answer_query("Grand total $42.50 due", "total"),
            "Total: 42.50"
        );
    }

    #[test]
    fn query_bridges_across_lines() {
        assert_eq!(
            answer_query("Amount Due\nplease remit\n87.65 by Friday", "amount due"),
            "Amount due: 87.65"
        );
    }

    #[test]
    fn query_falls_back_to_matching_line_verbatim() {
        let text = "Vendor: Acme\n  Payment method: VISA card  \nThanks";
        assert_eq!(answer_query(text, "PAYMENT"), "Payment method: VISA card");
    }

    #[test]
    fn query_without_matches_returns_fixed_message() {
        assert_eq!(
            answer_query("Vendor: Acme", "warranty"),
            "Sorry, no information found for the prompt 'warranty'."
        );
    }

    #[test]
    fn query_never_fails_on_regex_metacharacters() {
        // The query is escaped before being spliced into the pattern.
        let answer = answer_query("a(b) 1.00", "a(b)");
        assert_eq!(answer, "A(b): 1.00");
    }
}

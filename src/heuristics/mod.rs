// src/heuristics/mod.rs

mod cleanup;
mod invoice;
mod receipt;

pub use cleanup::clean_model_text;
pub use invoice::extract_invoice;
pub use receipt::{answer_query, structure_text};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One purchased article and its price, parsed from a single text line.
/// Serializes as a one-entry map: `{"<label>": "<price>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptItem {
    pub label: String,
    /// Price in string form, two fraction digits as matched.
    pub price: String,
}

impl Serialize for ReceiptItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.price)?;
        map.end()
    }
}

/// The structured mapping produced from model-generated receipt text.
///
/// Fields keep the order their lines appeared in; a key seen twice
/// keeps its first position with the later value. Serialization
/// flattens the fields into one JSON object and attaches the items
/// under a reserved `items` key only when at least one was collected.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReceiptDocument {
    pub fields: Vec<(String, Option<String>)>,
    pub items: Vec<ReceiptItem>,
}

impl ReceiptDocument {
    pub(crate) fn set_field(&mut self, key: &str, value: Option<String>) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.items.is_empty()
    }
}

impl Serialize for ReceiptDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.items.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if !self.items.is_empty() {
            map.serialize_entry("items", &self.items)?;
        }
        map.end()
    }
}

/// A single row from the invoice's line-item table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub item_number: String,
    pub description: String,
    pub quantity: u32,
    /// Per-unit price; the observed row format carries it in the net
    /// amount column.
    pub price: f64,
    pub net_amount: f64,
    pub ext_amount: f64,
}

/// Scalar invoice fields plus the line-item table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub invoice_number: Option<String>,
    /// MM-DD-YYYY once validated, as the downstream store expects.
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub total_amount: Option<f64>,
    pub line_items: Vec<InvoiceLineItem>,
}

impl InvoiceData {
    /// How many of the scalar fields were extracted.
    pub fn coverage(&self) -> (usize, usize) {
        let total = 4;
        let filled = [
            self.invoice_number.is_some(),
            self.invoice_date.is_some(),
            self.due_date.is_some(),
            self.total_amount.is_some(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, total)
    }
}

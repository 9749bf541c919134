//! # Tabular Data Model
//!
//! Records are ordered field-value rows as delivered by the host (one row per
//! spreadsheet line). The mapper in [`mapper`] turns a record slice plus an
//! axis selection into renderable bar descriptors.
//!
//! ## Usage
//!
//! ```rust
//! use cairn::data::{Record, map_dataset};
//! use cairn::config::ChartConfig;
//!
//! let rows = vec![
//!     Record::new().with_text("month", "Jan").with_number("sales", 120.0),
//!     Record::new().with_text("month", "Feb").with_number("sales", 90.0),
//! ];
//! let bars = map_dataset(&rows, "month", "sales", &ChartConfig::default()).unwrap();
//! assert_eq!(bars.len(), 2);
//! ```

pub mod mapper;

pub use mapper::{map_dataset, BarDescriptor, HEIGHT_SCALE};

use std::collections::HashMap;

/// A single cell value as parsed upstream: free text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Numeric coercion: numbers pass through, text parses if it looks
    /// numeric. Mirrors how spreadsheet cells arrive as strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Label coercion: text passes through, numbers format without a
    /// trailing `.0` for whole values.
    pub fn as_label(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

/// One dataset row: a mapping from field name to cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with_text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, FieldValue::Text(value.into()));
        self
    }

    pub fn with_number(mut self, field: impl Into<String>, value: f64) -> Self {
        self.insert(field, FieldValue::Number(value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion_accepts_numbers_and_numeric_text() {
        assert_eq!(FieldValue::Number(12.5).as_number(), Some(12.5));
        assert_eq!(FieldValue::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(FieldValue::Text("n/a".into()).as_number(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
        assert_eq!(FieldValue::Number(f64::INFINITY).as_number(), None);
    }

    #[test]
    fn label_coercion_trims_whole_numbers() {
        assert_eq!(FieldValue::Number(20.0).as_label(), "20");
        assert_eq!(FieldValue::Number(2.5).as_label(), "2.5");
        assert_eq!(FieldValue::Text("Q1".into()).as_label(), "Q1");
    }

    #[test]
    fn record_lookup_by_field_name() {
        let record = Record::new()
            .with_text("region", "EMEA")
            .with_number("revenue", 1200.0);
        assert_eq!(record.get("region"), Some(&FieldValue::Text("EMEA".into())));
        assert_eq!(record.get("revenue").and_then(FieldValue::as_number), Some(1200.0));
        assert!(record.get("missing").is_none());
    }
}

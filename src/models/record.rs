// file: src/models/record.rs
// description: final per-document record with typed field values and provenance
// reference: internal data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A validated field value. `Missing` is an explicit marker: every schema
/// field appears in every record, either with a value or as `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Cell representation for the tabular output. Missing fields render as
    /// an empty cell; the JSON report keeps the explicit marker.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Complete,
    Partial,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Complete => "Complete",
            RecordStatus::Partial => "Partial",
            RecordStatus::Failed => "Failed",
        }
    }
}

/// The structured result for one document: one row of pipeline output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub fields: BTreeMap<String, FieldValue>,
    /// Which chunk contributed each field; `None` for missing fields.
    pub provenance: BTreeMap<String, Option<usize>>,
    pub status: RecordStatus,
}

impl Record {
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_missing())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

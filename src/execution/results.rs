//! Result normalizer
//!
//! Turns whatever row shapes the driver hands back into uniform
//! field → value records.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::db::RawRow;

/// One normalized output row: ordered field → value pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionRecord {
    fields: Vec<(String, Value)>,
}

impl ExecutionRecord {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ExecutionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Normalize raw rows against the column descriptor
///
/// - record rows pass through unchanged
/// - positional rows are zipped with `column_names`; positions past the
///   descriptor get `col_{i}`
/// - scalars become `{"value": v}`
pub fn normalize_rows(rows: Vec<RawRow>, column_names: &[String]) -> Vec<ExecutionRecord> {
    rows.into_iter()
        .map(|row| match row {
            RawRow::Record(fields) => ExecutionRecord::new(fields),
            RawRow::Positional(values) => ExecutionRecord::new(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let name = column_names
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("col_{}", i));
                        (name, value)
                    })
                    .collect(),
            ),
            RawRow::Scalar(value) => ExecutionRecord::new(vec![("value".to_string(), value)]),
        })
        .collect()
}

//! Deterministic fallback formatter
//!
//! Used whenever the summarizer is unavailable or fails. Depends on nothing
//! but the records themselves.

use serde_json::Value;
use std::fmt::Write;

use crate::execution::ExecutionRecord;

/// Message for a successful query that matched nothing
pub fn no_results_message(question: &str) -> String {
    format!("No results found for: '{}'", question)
}

/// Enumerate records as `field: value` pairs
///
/// Null values are skipped; values longer than `value_char_budget`
/// characters are cut and marked with `...`.
pub fn format_records(question: &str, records: &[ExecutionRecord], value_char_budget: usize) -> String {
    if records.is_empty() {
        return no_results_message(question);
    }

    let mut out = format!("Found {} result(s) for '{}':", records.len(), question);
    for (idx, record) in records.iter().enumerate() {
        let items: Vec<String> = record
            .fields()
            .filter(|(_, value)| !value.is_null())
            .map(|(field, value)| format!("{}: {}", field, clip(&display(value), value_char_budget)))
            .collect();
        let _ = write!(out, "\n{}. {}", idx + 1, items.join(", "));
    }
    out
}

/// Strings without quotes; everything else as JSON text
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clip(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: &[(&str, Value)]) -> ExecutionRecord {
        ExecutionRecord::new(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_enumerates_records() {
        let records = vec![
            record(&[("id", json!(1)), ("name", json!("John Doe"))]),
            record(&[("id", json!(2)), ("name", json!("Ann"))]),
        ];
        assert_eq!(
            format_records("list customers", &records, 50),
            "Found 2 result(s) for 'list customers':\n1. id: 1, name: John Doe\n2. id: 2, name: Ann"
        );
    }

    #[test]
    fn test_skips_nulls_and_clips_long_values() {
        let long = "x".repeat(60);
        let records = vec![record(&[
            ("note", json!(long)),
            ("missing", Value::Null),
            ("ok", json!(true)),
        ])];
        let text = format_records("q", &records, 50);
        assert!(text.contains(&format!("note: {}...", "x".repeat(50))));
        assert!(!text.contains("missing"));
        assert!(text.ends_with("ok: true"));
    }

    #[test]
    fn test_budget_counts_characters() {
        assert_eq!(clip("héllo wörld", 5), "héllo...");
        assert_eq!(clip("exact", 5), "exact");
    }

    #[test]
    fn test_empty_records_use_no_results_message() {
        assert_eq!(format_records("q", &[], 50), "No results found for: 'q'");
    }
}

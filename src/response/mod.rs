//! Outward-facing response
//!
//! - `assembler.rs`: ResponseAssembler (summary or fallback, error wrapping)
//! - `fallback.rs`: deterministic record formatter

pub mod assembler;
pub mod fallback;

pub use assembler::ResponseAssembler;
pub use fallback::{format_records, no_results_message};

use serde::Serialize;

use crate::error::ErrorKind;
use crate::execution::ExecutionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Result of one `query`/`execute_raw` call
///
/// `status == Error` implies `records` is empty. `tables_used` lists the
/// tables of the validated query only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    pub status: ResponseStatus,
    pub question: String,
    pub sql_query: String,
    pub records: Vec<ExecutionRecord>,
    pub natural_language_response: String,
    pub tables_used: Vec<String>,
    /// More rows matched than the row limit allowed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl AgentResponse {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> String {
        // Only string keys and JSON values inside; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","error_details":"{}"}}"#, e)
        })
    }
}

//! Agent error taxonomy
//!
//! Every failure the pipeline can produce is one of these kinds. They are
//! recovered into an `AgentResponse` at the `SqlAgent` boundary, except
//! `Configuration` and construction-time `Connection`, which stop the agent
//! from being built at all.

use serde::{Deserialize, Serialize};

use crate::db::DbError;
use crate::llm::AdapterError;

/// Agent errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// Connection parameters or credentials missing/invalid at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database unreachable (introspection or execution)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Candidate query rejected before execution
    #[error("Validation error: {reason}")]
    Validation {
        reason: String,
        suggestions: Vec<String>,
    },

    /// Query passed validation but the engine rejected it
    #[error("Execution error: {0}")]
    Execution(String),

    /// The SQL generator could not produce a candidate
    #[error("Generation error: {0}")]
    Generation(String),

    /// The summarizer failed (never surfaced; downgraded to the fallback formatter)
    #[error("Formatting error: {0}")]
    Formatting(String),
}

/// Serializable error kind carried in `AgentResponse.error_kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    ConnectionError,
    ValidationError,
    ExecutionError,
    GenerationError,
    FormattingError,
}

impl AgentError {
    /// Shorthand for a validation failure without suggestions
    pub fn validation(reason: impl Into<String>) -> Self {
        AgentError::Validation {
            reason: reason.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Configuration(_) => ErrorKind::ConfigurationError,
            AgentError::Connection(_) => ErrorKind::ConnectionError,
            AgentError::Validation { .. } => ErrorKind::ValidationError,
            AgentError::Execution(_) => ErrorKind::ExecutionError,
            AgentError::Generation(_) => ErrorKind::GenerationError,
            AgentError::Formatting(_) => ErrorKind::FormattingError,
        }
    }

    /// Detail text without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            AgentError::Configuration(msg)
            | AgentError::Connection(msg)
            | AgentError::Execution(msg)
            | AgentError::Generation(msg)
            | AgentError::Formatting(msg) => msg,
            AgentError::Validation { reason, .. } => reason,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            AgentError::Validation { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

impl From<DbError> for AgentError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Connection(msg) => AgentError::Connection(msg),
            DbError::Statement(msg) => AgentError::Execution(msg),
        }
    }
}

impl From<AdapterError> for AgentError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Configuration(msg) => AgentError::Configuration(msg),
            other => AgentError::Generation(other.to_string()),
        }
    }
}

impl From<crate::config::ConfigError> for AgentError {
    fn from(err: crate::config::ConfigError) -> Self {
        AgentError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_split_into_connection_and_execution() {
        let conn: AgentError = DbError::Connection("refused".to_string()).into();
        assert_eq!(conn.kind(), ErrorKind::ConnectionError);

        let stmt: AgentError = DbError::Statement("no such column: x".to_string()).into();
        assert_eq!(stmt.kind(), ErrorKind::ExecutionError);
        assert_eq!(stmt.detail(), "no such column: x");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ValidationError).unwrap();
        assert_eq!(json, "\"validation_error\"");
    }

    #[test]
    fn test_validation_suggestions_exposed() {
        let err = AgentError::Validation {
            reason: "Query references invalid tables: customer".to_string(),
            suggestions: vec!["customers".to_string()],
        };
        assert_eq!(err.suggestions(), ["customers".to_string()]);
        assert!(AgentError::Execution("x".to_string()).suggestions().is_empty());
    }
}

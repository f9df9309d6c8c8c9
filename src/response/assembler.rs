//! Response assembler
//!
//! The only place an `AgentResponse` is built. Success messages come from the
//! summarizer when one is configured, else from the fallback formatter.
//! Error messages wrap the failure in plain prose; raw engine text only
//! appears in the message when `verbose_errors` is set (it is always kept in
//! `error_details`).

use tracing::warn;

use crate::error::{AgentError, ErrorKind};
use crate::execution::ExecutionRecord;
use crate::llm::Summarizer;
use crate::response::fallback::{format_records, no_results_message};
use crate::response::{AgentResponse, ResponseStatus};

pub struct ResponseAssembler {
    summarizer: Option<Box<dyn Summarizer>>,
    value_char_budget: usize,
    verbose_errors: bool,
}

impl ResponseAssembler {
    pub fn new(value_char_budget: usize) -> Self {
        Self {
            summarizer: None,
            value_char_budget,
            verbose_errors: false,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = verbose;
        self
    }

    /// Build the response for a finished request
    pub fn assemble(
        &self,
        question: &str,
        sql_query: &str,
        outcome: Result<Vec<ExecutionRecord>, AgentError>,
        tables_used: Vec<String>,
    ) -> AgentResponse {
        match outcome {
            Ok(records) => self.success(question, sql_query, records, tables_used),
            Err(err) => self.failure(question, sql_query, &err, tables_used),
        }
    }

    pub fn success(
        &self,
        question: &str,
        sql_query: &str,
        records: Vec<ExecutionRecord>,
        tables_used: Vec<String>,
    ) -> AgentResponse {
        let message = self.describe(question, &records);
        AgentResponse {
            status: ResponseStatus::Success,
            question: question.to_string(),
            sql_query: sql_query.to_string(),
            records,
            natural_language_response: message,
            tables_used,
            truncated: false,
            error_kind: None,
            error_details: None,
            suggestions: Vec::new(),
        }
    }

    /// Error response; records are always empty
    pub fn failure(
        &self,
        question: &str,
        sql_query: &str,
        err: &AgentError,
        tables_used: Vec<String>,
    ) -> AgentResponse {
        let tables_used = match err.kind() {
            ErrorKind::ValidationError | ErrorKind::GenerationError => Vec::new(),
            _ => tables_used,
        };

        AgentResponse {
            status: ResponseStatus::Error,
            question: question.to_string(),
            sql_query: sql_query.to_string(),
            records: Vec::new(),
            natural_language_response: self.error_message(question, err),
            tables_used,
            truncated: false,
            error_kind: Some(err.kind()),
            error_details: Some(err.detail().to_string()),
            suggestions: err.suggestions().to_vec(),
        }
    }

    /// Error response for caller-supplied SQL
    ///
    /// Nothing was generated, so a rejection reads `Invalid SQL: <reason>`.
    pub fn direct_failure(
        &self,
        question: &str,
        sql_query: &str,
        err: &AgentError,
        tables_used: Vec<String>,
    ) -> AgentResponse {
        let mut response = self.failure(question, sql_query, err, tables_used);
        if let AgentError::Validation {
            reason,
            suggestions,
        } = err
        {
            response.natural_language_response =
                with_suggestions(format!("Invalid SQL: {}", reason), suggestions);
        }
        response
    }

    /// Natural-language text for successful records
    pub fn describe(&self, question: &str, records: &[ExecutionRecord]) -> String {
        if records.is_empty() {
            return no_results_message(question);
        }

        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(question, records) {
                Ok(text) => return text,
                Err(err) => warn!(error = %err, "summarizer failed, using fallback formatter"),
            }
        }
        format_records(question, records, self.value_char_budget)
    }

    fn error_message(&self, question: &str, err: &AgentError) -> String {
        let mut message = match err {
            AgentError::Validation {
                reason,
                suggestions,
            } => {
                return with_suggestions(
                    format!("Unable to generate valid SQL for: '{}'. {}", question, reason),
                    suggestions,
                );
            }
            AgentError::Configuration(detail) => {
                return format!("The agent is not configured to answer '{}': {}", question, detail);
            }
            AgentError::Generation(_) => format!(
                "Unable to generate SQL for: '{}'. The language model did not return a usable query.",
                question
            ),
            AgentError::Execution(_) => format!(
                "The database could not run the query for: '{}'.",
                question
            ),
            AgentError::Connection(_) => format!(
                "The database could not be reached while answering: '{}'.",
                question
            ),
            AgentError::Formatting(_) => {
                format!("The results for '{}' could not be formatted.", question)
            }
        };

        if self.verbose_errors {
            message.push_str(&format!(" Details: {}", err.detail()));
        }
        message
    }
}

fn with_suggestions(mut text: String, suggestions: &[String]) -> String {
    if !suggestions.is_empty() {
        text.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
    }
    text
}

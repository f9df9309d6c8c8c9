//! SQL generator collaborator
//!
//! Turns a question plus the loaded schema description into candidate SQL
//! text. The output is untrusted: it goes through the normalizer and the
//! static validator before anything executes.

use std::sync::Arc;
use tracing::debug;

use crate::db::Dialect;
use crate::error::AgentError;
use crate::llm::adapters::LlmAdapter;
use crate::llm::prompts;

/// Everything a generator gets to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub question: &'a str,
    /// Produced by `SchemaSnapshot::describe`, never hand-written
    pub schema_description: &'a str,
    pub row_limit: usize,
    pub dialect: Dialect,
}

/// Proposes candidate SQL for a question
///
/// May return `NO_QUERY_SENTINEL` when the schema cannot answer.
pub trait SqlGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, AgentError>;
}

impl<F> SqlGenerator for F
where
    F: Fn(&GenerationRequest<'_>) -> Result<String, AgentError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, AgentError> {
        self(request)
    }
}

/// Generator backed by any LLM adapter
pub struct LlmSqlGenerator {
    adapter: Arc<dyn LlmAdapter>,
}

impl LlmSqlGenerator {
    pub fn new(adapter: Arc<dyn LlmAdapter>) -> Self {
        Self { adapter }
    }
}

impl SqlGenerator for LlmSqlGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, AgentError> {
        let system = prompts::sql_system_prompt(request.dialect);
        let prompt = prompts::sql_prompt(
            request.question,
            request.schema_description,
            request.row_limit,
            request.dialect,
        );

        let raw = self
            .adapter
            .generate(&system, &prompt)
            .map_err(|e| AgentError::Generation(e.to_string()))?;
        debug!(
            provider = self.adapter.provider_name(),
            raw = %raw,
            "candidate SQL generated"
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::adapters::{AdapterError, StubAdapter};

    fn request<'a>(question: &'a str, schema: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            question,
            schema_description: schema,
            row_limit: 5,
            dialect: Dialect::Sqlite,
        }
    }

    #[test]
    fn test_llm_generator_sends_schema_and_question() {
        let stub = Arc::new(StubAdapter::with_response("SELECT name FROM customers".into()));
        let generator = LlmSqlGenerator::new(stub.clone());

        let sql = generator
            .generate(&request("Who are our customers?", "CREATE TABLE customers (name TEXT)"))
            .unwrap();
        assert_eq!(sql, "SELECT name FROM customers");

        let prompt = &stub.prompts()[0];
        assert!(prompt.contains("Who are our customers?"));
        assert!(prompt.contains("CREATE TABLE customers"));
        assert!(prompt.contains("LIMIT 5"));
    }

    #[test]
    fn test_adapter_failure_is_generation_error() {
        let stub = Arc::new(StubAdapter::with_error(AdapterError::Network("down".into())));
        let generator = LlmSqlGenerator::new(stub);
        let err = generator.generate(&request("q", "")).unwrap_err();
        assert!(matches!(err, AgentError::Generation(msg) if msg.contains("down")));
    }

    #[test]
    fn test_closure_generator() {
        let generator =
            |req: &GenerationRequest<'_>| Ok::<_, AgentError>(format!("-- {}", req.question));
        assert_eq!(generator.generate(&request("hi", "")).unwrap(), "-- hi");
    }
}

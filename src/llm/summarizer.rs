//! Natural-language summarizer collaborator
//!
//! Fallible by contract: any failure is downgraded to the deterministic
//! fallback formatter by the response assembler.

use std::sync::Arc;

use crate::error::AgentError;
use crate::execution::ExecutionRecord;
use crate::llm::adapters::LlmAdapter;
use crate::llm::prompts;

/// Describes result records in conversational language
pub trait Summarizer: Send + Sync {
    fn summarize(&self, question: &str, records: &[ExecutionRecord]) -> Result<String, AgentError>;
}

impl<F> Summarizer for F
where
    F: Fn(&str, &[ExecutionRecord]) -> Result<String, AgentError> + Send + Sync,
{
    fn summarize(&self, question: &str, records: &[ExecutionRecord]) -> Result<String, AgentError> {
        self(question, records)
    }
}

/// Summarizer backed by any LLM adapter
pub struct LlmSummarizer {
    adapter: Arc<dyn LlmAdapter>,
}

impl LlmSummarizer {
    pub fn new(adapter: Arc<dyn LlmAdapter>) -> Self {
        Self { adapter }
    }
}

impl Summarizer for LlmSummarizer {
    fn summarize(&self, question: &str, records: &[ExecutionRecord]) -> Result<String, AgentError> {
        let records_json = serde_json::to_string_pretty(records)
            .map_err(|e| AgentError::Formatting(e.to_string()))?;
        let prompt = prompts::summary_prompt(question, &records_json, records.len());

        let text = self
            .adapter
            .generate(prompts::summary_system_prompt(), &prompt)
            .map_err(|e| AgentError::Formatting(e.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::Formatting("empty summary".to_string()));
        }
        Ok(text.to_string())
    }
}

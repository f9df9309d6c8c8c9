//! Stub adapter
//!
//! Scripted responses without network calls. Used by tests and when no
//! model endpoint is available.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::adapters::{AdapterError, LlmAdapter};
use crate::query::NO_QUERY_SENTINEL;

/// Stub adapter: replays scripted responses in order, then repeats the last
#[derive(Debug)]
pub struct StubAdapter {
    script: Mutex<VecDeque<Result<String, AdapterError>>>,
    last: Mutex<Result<String, AdapterError>>,
    prompts: Mutex<Vec<String>>,
}

impl StubAdapter {
    /// Stub that always answers with the "no valid query" sentinel
    pub fn new() -> Self {
        Self::with_response(NO_QUERY_SENTINEL.to_string())
    }

    pub fn with_response(response: String) -> Self {
        Self::scripted(vec![Ok(response)])
    }

    /// Responses in order; once exhausted the final one repeats
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn with_error(error: AdapterError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    fn scripted(script: Vec<Result<String, AdapterError>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(NO_QUERY_SENTINEL.to_string()));
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// User prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Default for StubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmAdapter for StubAdapter {
    fn generate(&self, _system: &str, prompt: &str) -> Result<String, AdapterError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(reply) => reply,
            None => self
                .last
                .lock()
                .map(|last| last.clone())
                .unwrap_or_else(|_| Err(AdapterError::InvalidResponse("stub poisoned".into()))),
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stub_returns_sentinel() {
        let adapter = StubAdapter::new();
        assert_eq!(adapter.generate("s", "p").unwrap(), NO_QUERY_SENTINEL);
        assert_eq!(adapter.provider_name(), "stub");
    }

    #[test]
    fn test_scripted_responses_then_repeat_last() {
        let adapter = StubAdapter::with_responses(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(adapter.generate("s", "a").unwrap(), "one");
        assert_eq!(adapter.generate("s", "b").unwrap(), "two");
        assert_eq!(adapter.generate("s", "c").unwrap(), "two");
        assert_eq!(adapter.prompts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_error_stub() {
        let adapter = StubAdapter::with_error(AdapterError::Network("offline".to_string()));
        assert!(matches!(adapter.generate("s", "p"), Err(AdapterError::Network(_))));
    }
}

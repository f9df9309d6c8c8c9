//! Ollama adapter
//!
//! Local HTTP API, non-streaming `POST {base_url}/api/chat`.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::{AdapterError, GenerationOptions, LlmAdapter};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Ollama adapter (local HTTP API)
#[derive(Debug)]
pub struct OllamaAdapter {
    /// e.g. http://127.0.0.1:11434
    base_url: String,
    model: String,
    options: GenerationOptions,
    transport: Transport,
}

impl OllamaAdapter {
    pub fn new(base_url: String, model: String) -> Self {
        Self::with_transport(base_url, model, Transport::Real(UreqTransport::new()))
    }

    pub fn with_transport(base_url: String, model: String, transport: Transport) -> Self {
        Self {
            base_url,
            model,
            options: GenerationOptions::default(),
            transport,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, system: &str, prompt: &str) -> String {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "stream": false,
            "options": {
                "temperature": self.options.temperature,
                "num_predict": self.options.max_tokens
            }
        })
        .to_string()
    }
}

/// Extract `message.content` from an Ollama chat response
pub fn parse_chat_response(response: &str) -> Result<String, AdapterError> {
    let json: JsonValue = serde_json::from_str(response)?;

    if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
        return Err(AdapterError::Provider {
            code: "ollama".to_string(),
            message: error.to_string(),
        });
    }

    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| AdapterError::InvalidResponse("Missing message.content".to_string()))
}

impl LlmAdapter for OllamaAdapter {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdapterError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let body = self.build_request(system, prompt);
        let headers = [("Content-Type", "application/json")];

        debug!(provider = "ollama", model = %self.model, "requesting completion");
        let response = self.transport.post_json(&url, &headers, &body)?;
        parse_chat_response(&response)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::adapters::FakeTransport;

    #[test]
    fn test_parse_chat_response() {
        let json = r#"{"model":"llama3","message":{"role":"assistant","content":"SELECT 1"},"done":true}"#;
        assert_eq!(parse_chat_response(json).unwrap(), "SELECT 1");
        assert!(parse_chat_response(r#"{"done":true}"#).is_err());
        assert!(matches!(
            parse_chat_response(r#"{"error":"model 'x' not found"}"#),
            Err(AdapterError::Provider { .. })
        ));
    }

    #[test]
    fn test_generate_posts_to_api_chat() {
        let fake = FakeTransport::new(r#"{"message":{"content":"ok"},"done":true}"#);
        let adapter = OllamaAdapter::with_transport(
            DEFAULT_OLLAMA_URL.to_string(),
            "sqlcoder".to_string(),
            Transport::Fake(fake.clone()),
        );

        assert_eq!(adapter.generate("sys", "question").unwrap(), "ok");
        let request = fake.last_request().unwrap();
        assert_eq!(request.url, "http://127.0.0.1:11434/api/chat");
        assert_eq!(request.json()["stream"], false);
        assert_eq!(request.json()["options"]["num_predict"], 1000);
    }
}

//! OpenAI-compatible adapter
//!
//! `POST {base_url}/chat/completions`. Also used for Groq and any other
//! endpoint that speaks the same protocol.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::{AdapterError, GenerationOptions, LlmAdapter};

/// OpenAI-compatible adapter
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// Base URL (e.g., https://api.openai.com/v1)
    base_url: String,
    model: String,
    /// Sent as a bearer token when present
    api_key: Option<String>,
    options: GenerationOptions,
    transport: Transport,
}

impl OpenAiAdapter {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self::with_transport(base_url, model, api_key, Transport::Real(UreqTransport::new()))
    }

    /// Create adapter with a specific transport (fake transport in tests)
    pub fn with_transport(
        base_url: String,
        model: String,
        api_key: Option<String>,
        transport: Transport,
    ) -> Self {
        Self {
            base_url,
            model,
            api_key,
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

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    fn build_request(&self, system: &str, prompt: &str) -> String {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.options.temperature,
            "max_tokens": self.options.max_tokens,
            "stream": false
        })
        .to_string()
    }
}

/// Extract `choices[0].message.content`, surfacing a body-level `error`
pub fn parse_chat_completion(response: &str) -> Result<String, AdapterError> {
    let json: JsonValue = serde_json::from_str(response)?;

    if let Some(error) = json.get("error") {
        return Err(AdapterError::Provider {
            code: error["code"]
                .as_str()
                .or_else(|| error["type"].as_str())
                .unwrap_or("unknown")
                .to_string(),
            message: error["message"].as_str().unwrap_or_default().to_string(),
        });
    }

    json["choices"]
        .get(0)
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AdapterError::InvalidResponse("Missing choices[0].message.content".to_string())
        })
}

impl LlmAdapter for OpenAiAdapter {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdapterError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = self.build_request(system, prompt);

        let auth_header = self.api_key.as_ref().map(|key| format!("Bearer {}", key));
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(auth) = &auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        debug!(provider = "openai", model = %self.model, "requesting completion");
        let response = self.transport.post_json(&url, &headers, &body)?;
        parse_chat_completion(&response)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

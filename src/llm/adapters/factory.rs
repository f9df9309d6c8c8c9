//! Adapter factory
//!
//! Builds the concrete adapter for an `[llm]` config table.

use crate::config::{LlmConfig, LlmProvider};
use crate::llm::adapters::ollama::{OllamaAdapter, DEFAULT_OLLAMA_URL};
use crate::llm::adapters::openai::OpenAiAdapter;
use crate::llm::adapters::stub::StubAdapter;
use crate::llm::adapters::transport::{Transport, UreqTransport};
use crate::llm::adapters::{Adapter, AdapterError, GenerationOptions};

/// Create an adapter from config
///
/// # Returns
/// * `Err(AdapterError::Configuration)` - provider disabled, or a required
///   field (base_url, model, api_key reference) is missing
pub fn create_adapter(config: &LlmConfig) -> Result<Adapter, AdapterError> {
    let options = GenerationOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    let transport = Transport::Real(UreqTransport::with_timeout(config.timeout_secs));

    match config.provider {
        LlmProvider::Disabled => Err(AdapterError::Configuration(
            "LLM provider is disabled".to_string(),
        )),
        LlmProvider::Stub => Ok(Adapter::Stub(StubAdapter::new())),
        LlmProvider::OpenAi => {
            let base_url = required(&config.base_url, "base_url")?;
            let model = required(&config.model, "model")?;
            let api_key = config
                .resolve_api_key()
                .map_err(|e| AdapterError::Configuration(e.to_string()))?;
            Ok(Adapter::OpenAi(
                OpenAiAdapter::with_transport(base_url, model, api_key, transport)
                    .with_options(options),
            ))
        }
        LlmProvider::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            let model = required(&config.model, "model")?;
            Ok(Adapter::Ollama(
                OllamaAdapter::with_transport(base_url, model, transport).with_options(options),
            ))
        }
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String, AdapterError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AdapterError::Configuration(format!("Missing '{}' in [llm] config", key)))
}

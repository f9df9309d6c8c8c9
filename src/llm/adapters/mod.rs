//! LLM adapters
//!
//! Provider-agnostic interface to chat-completion HTTP APIs.
//! Supports OpenAI-compatible endpoints (OpenAI, Groq, ...), Ollama, and a
//! scripted stub.

pub mod factory;
pub mod ollama;
pub mod openai;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_types;
pub mod transport_ureq;

pub use factory::create_adapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use stub::StubAdapter;
pub use transport::{
    AdapterError, FakeTransport, RecordedRequest, SyncTransport, Transport, UreqTransport,
};

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// LLM adapter trait
///
/// One blocking completion per call: a system message and a user message
/// in, the assistant's text out.
pub trait LlmAdapter: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdapterError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Adapter enum: concrete type for all providers, built by the factory
#[derive(Debug)]
pub enum Adapter {
    OpenAi(OpenAiAdapter),
    Ollama(OllamaAdapter),
    Stub(StubAdapter),
}

impl LlmAdapter for Adapter {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdapterError> {
        match self {
            Adapter::OpenAi(a) => a.generate(system, prompt),
            Adapter::Ollama(a) => a.generate(system, prompt),
            Adapter::Stub(a) => a.generate(system, prompt),
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Adapter::OpenAi(a) => a.provider_name(),
            Adapter::Ollama(a) => a.provider_name(),
            Adapter::Stub(a) => a.provider_name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Adapter::OpenAi(a) => a.model(),
            Adapter::Ollama(a) => a.model(),
            Adapter::Stub(a) => a.model(),
        }
    }
}

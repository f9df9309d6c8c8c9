//! Language-model collaborators
//!
//! - `adapters/`: provider adapters and HTTP transport
//! - `prompts.rs`: generation and summary prompt text
//! - `generator.rs`: SqlGenerator trait + LLM-backed implementation
//! - `summarizer.rs`: Summarizer trait + LLM-backed implementation

pub mod adapters;
pub mod generator;
pub mod prompts;
pub mod summarizer;

pub use adapters::{
    create_adapter, Adapter, AdapterError, FakeTransport, GenerationOptions, LlmAdapter,
    OllamaAdapter, OpenAiAdapter, StubAdapter, Transport,
};
pub use generator::{GenerationRequest, LlmSqlGenerator, SqlGenerator};
pub use summarizer::{LlmSummarizer, Summarizer};

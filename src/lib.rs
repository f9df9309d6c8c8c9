//! sqlagent: natural-language questions over a relational database
//!
//! A question becomes candidate SQL (from a pluggable generator), which is
//! normalized, statically validated against an introspected schema snapshot,
//! executed under a row limit, and turned into a uniform `AgentResponse`.
//! Nothing the generator returns reaches the database without passing the
//! validator.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod execution;
pub mod llm;
pub mod query;
pub mod response;
pub mod schema;

pub use agent::{QueryCheck, SqlAgent};
pub use config::{AgentConfig, AgentSettings, ConfigError, LlmProvider};
pub use db::{Database, DbError, Dialect, SqliteDatabase};
pub use error::{AgentError, ErrorKind};
pub use execution::ExecutionRecord;
pub use llm::{GenerationRequest, SqlGenerator, Summarizer};
pub use query::{ValidationResult, NO_QUERY_SENTINEL};
pub use response::{AgentResponse, ResponseStatus};
pub use schema::SchemaSnapshot;

//! Agent configuration
//!
//! TOML file with `[database]`, `[llm]` and `[agent]` tables, then
//! environment overrides, then `validate()`. A config that fails validation
//! never reaches a database connection.
//!
//! ```toml
//! [database]
//! path = "data/retail.db"
//! dialect = "sqlite"
//!
//! [llm]
//! provider = "openai"
//! base_url = "https://api.groq.com/openai/v1"
//! model = "llama3-70b-8192"
//! api_key = "env:GROQ_API_KEY"
//!
//! [agent]
//! row_limit = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::db::Dialect;
use crate::query::ValidationRules;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file (required)
    pub path: PathBuf,
    pub dialect: Dialect,
    pub read_only: bool,
}

/// Which model endpoint generates SQL and summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible `/chat/completions` (OpenAI, Groq, local servers)
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    Stub,
    #[default]
    Disabled,
}

impl LlmProvider {
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
            LlmProvider::Stub => "stub",
            LlmProvider::Disabled => "disabled",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "groq" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            "stub" => Ok(LlmProvider::Stub),
            "disabled" | "none" => Ok(LlmProvider::Disabled),
            other => Err(ConfigError::Invalid(format!("Unknown LLM provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Literal key or `env:VAR`
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Disabled,
            base_url: None,
            model: None,
            api_key: None,
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Resolve `api_key` against the process environment
    pub fn resolve_api_key(&self) -> Result<Option<String>, ConfigError> {
        self.resolve_api_key_with(|var| std::env::var(var).ok())
    }

    /// Resolve `api_key`, reading `env:VAR` references through `lookup`
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<Option<String>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw) = self.api_key.as_deref() else {
            return Ok(None);
        };
        match raw.strip_prefix("env:") {
            Some(var) => lookup(var)
                .filter(|value| !value.trim().is_empty())
                .map(Some)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("API key variable {} is not set", var))
                }),
            None if raw.trim().is_empty() => {
                Err(ConfigError::Invalid("api_key is empty".to_string()))
            }
            None => Ok(Some(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Default row limit for `query`
    pub row_limit: usize,
    pub min_query_length: usize,
    pub max_query_length: usize,
    /// Characters per value in the fallback formatter
    pub value_char_budget: usize,
    /// Tables included in the schema description sent to the generator
    pub schema_table_limit: Option<usize>,
    /// Use the LLM summarizer (fallback formatter otherwise)
    pub summarize: bool,
    /// Include raw engine error text in the natural-language message
    pub verbose_errors: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            row_limit: 10,
            min_query_length: 10,
            max_query_length: 1000,
            value_char_budget: 50,
            schema_table_limit: None,
            summarize: true,
            verbose_errors: false,
        }
    }
}

impl AgentSettings {
    pub fn validation_rules(&self, dialect: Dialect) -> ValidationRules {
        ValidationRules {
            min_length: self.min_query_length,
            max_length: self.max_query_length,
            dialect,
        }
    }
}

impl AgentConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// File (if given, defaults otherwise) plus environment overrides
    ///
    /// Not validated; call `validate()` before use.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` (environment in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SQLAGENT_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(dialect) = lookup("SQLAGENT_DIALECT") {
            self.database.dialect = dialect.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(limit) = lookup("SQL_ROW_LIMIT") {
            self.agent.row_limit = limit.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("SQL_ROW_LIMIT is not a number: {}", limit))
            })?;
        }
        if let Some(provider) = lookup("SQLAGENT_LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(model) = lookup("SQLAGENT_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(base_url) = lookup("SQLAGENT_LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(api_key) = lookup("SQLAGENT_LLM_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        debug!(
            db = %self.database.path.display(),
            dialect = self.database.dialect.name(),
            provider = self.llm.provider.name(),
            "configuration resolved"
        );
        Ok(())
    }

    /// Check everything that can be checked without I/O
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path is required".to_string()));
        }
        if self.agent.row_limit == 0 {
            return Err(ConfigError::Invalid("agent.row_limit must be positive".to_string()));
        }
        if self.agent.min_query_length > self.agent.max_query_length {
            return Err(ConfigError::Invalid(format!(
                "agent.min_query_length ({}) exceeds agent.max_query_length ({})",
                self.agent.min_query_length, self.agent.max_query_length
            )));
        }

        match self.llm.provider {
            LlmProvider::OpenAi => {
                require(&self.llm.base_url, "llm.base_url")?;
                require(&self.llm.model, "llm.model")?;
                self.llm.resolve_api_key()?;
            }
            LlmProvider::Ollama => {
                require(&self.llm.model, "llm.model")?;
            }
            LlmProvider::Stub | LlmProvider::Disabled => {}
        }
        Ok(())
    }
}

fn require(value: &Option<String>, name: &str) -> Result<(), ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "{} is required for this provider",
            name
        ))),
    }
}

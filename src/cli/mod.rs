//! CLI host for the agent
//!
//! Provides:
//! - Argument parsing (ask, exec, schema, check)
//! - Config resolution (file → env → flags)
//! - Mode dispatch with deterministic exit codes

pub mod args;
pub mod dispatch;

pub use args::{Args, Mode};
pub use dispatch::{exit_code_for, run_cli_mode, ExitCode};

use crate::config::ConfigError;
use crate::error::AgentError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_DB_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

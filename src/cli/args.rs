//! CLI argument parsing
//!
//! ```text
//! sqlagent [options] <mode> [mode-args]
//!
//! MODES:
//!   ask <question> [--limit N]   Generate, validate and run SQL for a question
//!   exec <sql>                   Run SQL directly (validated, bounded)
//!   schema [--tables N]          Print the schema description
//!   check <sql>                  Validate SQL without running it
//!
//! OPTIONS:
//!   --config <file>   TOML config
//!   --db <path>       Database file (overrides config and env)
//!   --json            Output JSON
//!   --verbose         Debug logging
//!   --log-json        Structured log lines on stderr
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parsed CLI arguments
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "sqlagent", version, about = "Answer questions about a SQL database")]
pub struct Args {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file, overrides config and SQLAGENT_DB_PATH
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print the full JSON response
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON log lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

/// CLI modes
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Mode {
    /// Answer a natural-language question
    Ask {
        question: String,

        /// Row limit for this question
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run SQL directly through validation and the bounded executor
    Exec { sql: String },

    /// Print the schema description
    Schema {
        /// Only describe the first N tables
        #[arg(long)]
        tables: Option<usize>,
    },

    /// Validate SQL against the schema without executing it
    Check { sql: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sqlagent").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_ask_with_limit() {
        let args = parse(&["ask", "Who are our customers?", "--limit", "5"]);
        assert_eq!(
            args.mode,
            Mode::Ask {
                question: "Who are our customers?".to_string(),
                limit: Some(5),
            }
        );
        assert!(!args.json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["exec", "SELECT 1 FROM t", "--db", "retail.db", "--json"]);
        assert_eq!(args.db, Some(PathBuf::from("retail.db")));
        assert!(args.json);
        assert_eq!(
            args.mode,
            Mode::Exec {
                sql: "SELECT 1 FROM t".to_string()
            }
        );
    }

    #[test]
    fn test_schema_defaults() {
        let args = parse(&["--config", "agent.toml", "schema"]);
        assert_eq!(args.config, Some(PathBuf::from("agent.toml")));
        assert_eq!(args.mode, Mode::Schema { tables: None });
    }

    #[test]
    fn test_missing_mode_is_error() {
        assert!(Args::try_parse_from(["sqlagent"]).is_err());
    }

    #[test]
    fn test_non_numeric_limit_is_error() {
        assert!(Args::try_parse_from(["sqlagent", "ask", "q", "--limit", "ten"]).is_err());
    }
}

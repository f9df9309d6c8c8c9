//! CLI mode dispatch
//!
//! Resolves the configuration, builds the agent once, runs one mode and maps
//! the outcome to an exit code:
//! - agent cannot be built: configuration/connection exit code
//! - ask / exec: response status and error kind
//! - schema: always success once the agent is built
//! - check: success only for a valid query

use std::io::Write;
use tracing::debug;

use crate::agent::SqlAgent;
use crate::cli::{Args, Error, Mode, Result, EXIT_DB_ERROR, EXIT_FAILURE, EXIT_SUCCESS};
use crate::config::AgentConfig;
use crate::error::ErrorKind;
use crate::response::AgentResponse;

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run CLI mode and return exit code
///
/// Called from main() after argument parsing and logging setup.
pub fn run_cli_mode(args: Args) -> ExitCode {
    let agent = match build_agent(&args) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            return match e {
                Error::Config(_) | Error::Agent(_) => EXIT_DB_ERROR,
                _ => EXIT_FAILURE,
            };
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run_mode(&agent, &args.mode, args.json, &mut out) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Config file, then environment, then `--db`
pub fn resolve_config(args: &Args) -> Result<AgentConfig> {
    let mut config = AgentConfig::load(args.config.as_deref())?;
    if let Some(db) = &args.db {
        config.database.path = db.clone();
    }
    debug!(db = %config.database.path.display(), "CLI configuration resolved");
    Ok(config)
}

fn build_agent(args: &Args) -> Result<SqlAgent> {
    let config = resolve_config(args)?;
    Ok(SqlAgent::from_config(&config)?)
}

/// Run one mode against a ready agent, writing to `out`
pub fn run_mode<W: Write>(agent: &SqlAgent, mode: &Mode, json: bool, out: &mut W) -> Result<ExitCode> {
    match mode {
        Mode::Ask { question, limit } => {
            let response = agent.query(question, *limit);
            write_response(&response, json, out)?;
            Ok(exit_code_for(&response))
        }
        Mode::Exec { sql } => {
            let response = agent.execute_raw(sql);
            write_response(&response, json, out)?;
            Ok(exit_code_for(&response))
        }
        Mode::Schema { tables } => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(agent.schema().as_ref())?)?;
            } else {
                writeln!(out, "{}", agent.table_info(*tables))?;
            }
            Ok(EXIT_SUCCESS)
        }
        Mode::Check { sql } => {
            let check = agent.check(sql);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&check)?)?;
            } else if check.result.valid {
                writeln!(out, "valid: {}", check.query)?;
                writeln!(out, "tables: {}", check.tables_used.join(", "))?;
            } else {
                writeln!(out, "invalid: {}", check.result.reason)?;
                if !check.result.suggestions.is_empty() {
                    writeln!(out, "did you mean: {}", check.result.suggestions.join(", "))?;
                }
            }
            Ok(if check.result.valid {
                EXIT_SUCCESS
            } else {
                EXIT_FAILURE
            })
        }
    }
}

/// Configuration and connection failures get their own exit code
pub fn exit_code_for(response: &AgentResponse) -> ExitCode {
    match response.error_kind {
        None => EXIT_SUCCESS,
        Some(ErrorKind::ConfigurationError | ErrorKind::ConnectionError) => EXIT_DB_ERROR,
        Some(_) => EXIT_FAILURE,
    }
}

fn write_response<W: Write>(response: &AgentResponse, json: bool, out: &mut W) -> Result<()> {
    if json {
        writeln!(out, "{}", response.to_json_pretty())?;
        return Ok(());
    }

    if !response.sql_query.is_empty() {
        writeln!(out, "SQL: {}", response.sql_query)?;
    }
    writeln!(out, "{}", response.natural_language_response)?;
    if response.truncated {
        writeln!(out, "(more rows matched than the row limit allowed)")?;
    }
    Ok(())
}

//! sqlagent CLI
//!
//! Parses arguments, installs the log subscriber (stderr, so stdout stays
//! clean for answers and JSON), then hands off to mode dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlagent::cli::{run_cli_mode, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_json)?;

    let exit_code = run_cli_mode(args);
    std::process::exit(exit_code);
}

/// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let default_level = if verbose { "sqlagent=debug" } else { "sqlagent=info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to install JSON log subscriber")
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to install log subscriber")
    }
}

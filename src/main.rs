//! @dose
//! purpose: This is the CLI entry point for prefab-manifest. It parses command-line arguments
//!     using clap, sets up logging, determines the project root directory, and dispatches to
//!     the appropriate command handler (generate, inspect, check, or watch).
//!
//! when-editing:
//!     - !All command handlers are imported from the prefab_manifest crate
//!     - !The root directory defaults to current working directory if not specified
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error
//!     - Logs go to stderr; command results go to stdout
//!
//! gotchas:
//!     - PREFAB_LOG overrides the level chosen by -q/-v

use anyhow::Context;
use clap::Parser;
use prefab_manifest::cli::{Cli, Commands};
use prefab_manifest::commands::{run_check, run_generate, run_inspect, run_watch};
use std::env;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let root = match cli.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Generate(args) => run_generate(&args, &root),
        Commands::Inspect(args) => run_inspect(&args, &root),
        Commands::Check(args) => run_check(&args, &root),
        Commands::Watch(args) => run_watch(&args, &root),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("PREFAB_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

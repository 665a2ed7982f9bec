//! wfresolve - Workflow transition resolver
//!
//! Loads a workflow catalog document and answers transition queries against it.

mod commands;
mod config;
mod document;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wfresolve_core::{AcceptTokens, TieBreak};

#[derive(Parser)]
#[command(name = "wfresolve")]
#[command(about = "Resolve automatic workflow transitions from a state/transition catalog")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, env = "WFRESOLVE_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog document (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Fail on malformed records instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Print JSON output
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the transition that should fire from a state
    Resolve {
        /// Workflow ID
        #[arg(short, long)]
        workflow: i64,

        /// Current state ID
        #[arg(short, long)]
        from: i64,

        /// Acceptable validity tokens, comma-separated (e.g. "y, i")
        #[arg(short, long)]
        accept: AcceptTokens,

        /// Do not fall back to default transitions
        #[arg(long)]
        no_default: bool,

        /// Tie-break policy (first_seen or lowest_state_id)
        #[arg(long)]
        tie_break: Option<TieBreak>,
    },

    /// Check whether a state satisfies the acceptance tokens
    Accepts {
        /// Workflow ID
        #[arg(short, long)]
        workflow: i64,

        /// State ID
        #[arg(short, long)]
        state: i64,

        /// Acceptable validity tokens, comma-separated
        #[arg(short, long)]
        accept: AcceptTokens,
    },

    /// Show how a resolution is reached
    Explain {
        /// Workflow ID
        #[arg(short, long)]
        workflow: i64,

        /// Current state ID
        #[arg(short, long)]
        from: i64,

        /// Acceptable validity tokens, comma-separated
        #[arg(short, long)]
        accept: AcceptTokens,
    },

    /// Validate the catalog and report skipped records and dangling transitions
    Check,

    /// List loaded workflows
    List,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output.text);
            if !output.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<commands::Output, Box<dyn std::error::Error>> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.catalog, cli.strict);

    let path = config.catalog.require_path()?;
    let loaded = document::load_file(path, &config.catalog.load_options())?;

    if !loaded.report.skipped.is_empty() {
        tracing::warn!(
            "{} record(s) skipped while loading {}",
            loaded.report.skipped.len(),
            path.display()
        );
    }

    let ctx = commands::Context {
        loaded: &loaded,
        options: config.resolver.options(),
        json: cli.json,
    };
    commands::execute(&ctx, cli.command)
}

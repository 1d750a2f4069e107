//! seqgen: feedback-directed random unit-test generation
//!
//! Grows random call sequences over the public operations of a set of
//! target types, keeps the ones that run cleanly and are new, and writes
//! them out as a JUnit 5 suite. Sequences that raise or break a contract
//! are kept as well, as failing-behavior tests.
//!
//! ## Example Usage
//!
//! ```bash
//! # Generate tests for the demo TestClass
//! seqgen generate TestClass --max-sequences 100 --seed 7
//!
//! # Several targets, settings from a config document, JSON summary
//! seqgen generate Counter Shape --config seqgen.json --json
//!
//! # Show the types and operations available
//! seqgen list
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod seqgen_cli;

use seqgen_cli::{generate::GenerateCmd, list::ListCmd};

#[derive(Parser)]
#[command(
    name = "seqgen",
    author,
    version,
    about = "Feedback-directed random unit-test generation",
    long_about = "Generates unit tests by growing random call sequences over the public \
                  operations of target types, using execution feedback to keep new, \
                  well-behaved sequences and to flag failing ones."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging, per-sequence listing)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a test suite for one or more target types
    Generate(GenerateCmd),

    /// List the types and operations of the catalog
    List(ListCmd),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();
    init_tracing(verbose);

    match command {
        Commands::Generate(cmd) => cmd.execute(json, verbose),
        Commands::List(cmd) => cmd.execute(json),
    }
}

//! batchreport — batch post-storage report worker.
//!
//! # Usage
//!
//! ```text
//! batchreport [--config <path>] [-v...] config check
//! batchreport [--config <path>] [-v...] run <request.json>... [--run-id <id>]
//! batchreport [--config <path>] [-v...] report show <batch-uuid> [--table]
//! ```

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, report::ReportCommand, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "batchreport",
    version,
    about = "Generate AtoM CSV reports for stored SIP batches",
    long_about = None,
)]
struct Cli {
    /// Configuration file (default: first of ./batchreport.yaml,
    /// ~/.config/batchreport.yaml, /etc/batchreport.yaml).
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect the merged configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Run the batch post-storage workflow for one or more requests.
    Run(RunArgs),

    /// Read back stored reports.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub verbose: u8,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        verbose: cli.verbose,
    };
    match cli.command {
        Commands::Config { command } => commands::config::run(&global, command),
        Commands::Run(args) => args.run(&global),
        Commands::Report { command } => commands::report::run(&global, command),
    }
}

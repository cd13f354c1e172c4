//! `batchreport config` — configuration diagnostics.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use batchreport_core::config;

use crate::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Load and validate configuration, listing every problem found.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the merged configuration as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(global: &GlobalArgs, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Check(args) => check(global, args),
    }
}

fn check(global: &GlobalArgs, args: CheckArgs) -> Result<()> {
    let loaded =
        config::load(global.config.as_deref()).context("configuration check failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&loaded.config)?);
        return Ok(());
    }

    let source = match &loaded.source {
        Some(path) => path.display().to_string(),
        None => "defaults and environment".to_string(),
    };
    println!("{} configuration OK ({source})", "✓".green().bold());
    Ok(())
}

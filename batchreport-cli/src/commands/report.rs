//! `batchreport report` — read back a stored batch report.

use std::io::Read;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;
use tabled::{settings::Style, Table, Tabled};
use uuid::Uuid;

use batchreport_core::ReportKey;
use batchreport_store::open_bucket;

use crate::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Print the report stored for a batch.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Batch UUID the report was generated for.
    pub batch: Uuid,

    /// Render the rows as a table instead of raw CSV.
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Deserialize, Tabled)]
struct ReportRow {
    #[tabled(rename = "title")]
    title: String,
    #[serde(rename = "alternativeIdentifiers")]
    #[tabled(rename = "AIP UUID")]
    aip: String,
    #[serde(rename = "publicationStatus")]
    #[tabled(rename = "status")]
    status: String,
}

pub fn run(global: &GlobalArgs, command: ReportCommand) -> Result<()> {
    match command {
        ReportCommand::Show(args) => show(global, args),
    }
}

fn show(global: &GlobalArgs, args: ShowArgs) -> Result<()> {
    let config = super::load_config(global)?;
    let bucket_config = config
        .reports_bucket
        .as_ref()
        .context("reports_bucket is not configured")?;
    let bucket = open_bucket(bucket_config).context("failed to open reports bucket")?;

    let key = ReportKey::for_batch_uuid(&args.batch);
    let mut body = String::new();
    bucket
        .new_reader(key.as_str())
        .with_context(|| format!("no report for batch {}", args.batch))?
        .read_to_string(&mut body)
        .with_context(|| format!("failed to read {}", bucket.full_key(key.as_str())))?;

    if !args.table {
        print!("{body}");
        return Ok(());
    }

    let rows = csv::Reader::from_reader(body.as_bytes())
        .deserialize()
        .collect::<Result<Vec<ReportRow>, _>>()
        .context("report is not valid CSV")?;
    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{count} row(s) in {}", bucket.full_key(key.as_str()));
    Ok(())
}

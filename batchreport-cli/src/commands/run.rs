//! `batchreport run` — execute the batch post-storage workflow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use batchreport_csv::CsvReportGenerator;
use batchreport_store::open_bucket;
use batchreport_workflow::{
    BatchPoststorage, BatchPoststorageRequest, CreateCsv, EngineError, LocalEngine, Outcome,
    RunOutcome, Worker,
};

use crate::GlobalArgs;

/// Arguments for `batchreport run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON request files: `{"batch": {"uuid": ...}, "sips": [...]}`.
    #[arg(required = true, value_name = "REQUEST")]
    pub requests: Vec<PathBuf>,

    /// Run id to start or resume (single request only; default: random UUID).
    #[arg(long)]
    pub run_id: Option<String>,
}

/// One line of output per run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunLine {
    run_id: String,
    outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    relative_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<RunOutcome> for RunLine {
    fn from(run: RunOutcome) -> Self {
        match run.result {
            Ok(result) => Self {
                run_id: run.run_id,
                outcome: result.outcome,
                relative_path: Some(result.relative_path),
                error: None,
            },
            Err(err) => Self {
                run_id: run.run_id,
                outcome: failure_outcome(&err),
                relative_path: None,
                error: Some(err.to_string()),
            },
        }
    }
}

fn failure_outcome(err: &EngineError) -> Outcome {
    match err {
        EngineError::Workflow(err) => err.outcome(),
        _ => Outcome::SystemError,
    }
}

impl RunArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        if self.run_id.is_some() && self.requests.len() > 1 {
            bail!("--run-id can only be used with a single request");
        }

        let config = super::load_config(global)?;

        let runs = self
            .requests
            .iter()
            .map(|path| -> Result<(String, BatchPoststorageRequest)> {
                let request = read_request(path)?;
                let run_id = self
                    .run_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                Ok((run_id, request))
            })
            .collect::<Result<Vec<_>>>()?;

        let bucket_config = config
            .reports_bucket
            .as_ref()
            .context("reports_bucket is not configured")?;
        let bucket = open_bucket(bucket_config).context("failed to open reports bucket")?;

        let mut engine = LocalEngine::new(&config.engine);
        engine.register(CreateCsv::new(CsvReportGenerator::new(bucket)));
        let worker = Worker::new(
            Arc::new(engine),
            BatchPoststorage::new(config.engine.workflow_name.clone()),
            config.worker.max_concurrent_sessions,
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let outcomes = runtime.block_on(worker.run_all(runs))?;

        let total = outcomes.len();
        let mut failed = 0;
        for outcome in outcomes {
            let line = RunLine::from(outcome);
            if line.error.is_some() {
                failed += 1;
            }
            println!("{}", serde_json::to_string(&line)?);
        }

        if failed > 0 {
            bail!("{failed} of {total} run(s) failed");
        }
        Ok(())
    }
}

fn read_request(path: &Path) -> Result<BatchPoststorageRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse request {}", path.display()))
}

//! The report-generation activity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use batchreport_core::{Batch, ReportKey, Sip};
use batchreport_csv::{CsvReportGenerator, ReportError};

use crate::activity::Activity;
use crate::error::ActivityError;

pub const CREATE_CSV_NAME: &str = "create-csv-activity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCsvParams {
    pub batch: Batch,
    pub sips: Vec<Sip>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCsvResult {
    /// Full object key, store prefix included.
    pub key: ReportKey,
}

/// Runs [`CsvReportGenerator::generate`] as an engine activity.
#[derive(Debug, Clone)]
pub struct CreateCsv {
    generator: CsvReportGenerator,
}

impl CreateCsv {
    pub fn new(generator: CsvReportGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Activity for CreateCsv {
    type Params = CreateCsvParams;
    type Output = CreateCsvResult;

    fn name(&self) -> &'static str {
        CREATE_CSV_NAME
    }

    async fn execute(&self, params: CreateCsvParams) -> Result<CreateCsvResult, ActivityError> {
        let generator = self.generator.clone();
        let report = tokio::task::spawn_blocking(move || {
            generator.generate(&params.batch, &params.sips)
        })
        .await
        .map_err(|err| ActivityError::retryable(format!("create CSV task join error: {err}")))?
        .map_err(activity_error)?;

        Ok(CreateCsvResult { key: report.key })
    }
}

fn activity_error(err: ReportError) -> ActivityError {
    ActivityError {
        non_retryable: !err.is_retryable(),
        message: err.to_string(),
    }
}

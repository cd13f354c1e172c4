//! Batch post-storage workflow: produce the batch report once every SIP in
//! the batch has been stored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use batchreport_core::{Batch, Sip};

use crate::activity::{ActivityOptions, RetryPolicy};
use crate::context::{execute_activity, WorkflowContext};
use crate::create_csv::{CreateCsvParams, CreateCsvResult, CREATE_CSV_NAME};
use crate::error::{FailureKind, WorkflowError};

/// Budget for the report activity, retries included.
pub const CREATE_CSV_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Business classification of a workflow result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    /// Infrastructure or transient failure.
    SystemError,
    /// The batch data itself is invalid.
    ContentError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPoststorageRequest {
    pub batch: Batch,
    pub sips: Vec<Sip>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPoststorageResult {
    pub outcome: Outcome,
    /// Object key of the report, store prefix included.
    pub relative_path: String,
}

#[derive(Debug, Clone)]
pub struct BatchPoststorage {
    name: String,
    create_csv_options: ActivityOptions,
}

impl BatchPoststorage {
    /// Workflow registered as `name`, with the default report policy:
    /// ten minutes and a single attempt.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            create_csv_options: ActivityOptions::new(
                CREATE_CSV_TIMEOUT,
                RetryPolicy::with_maximum_attempts(1),
            ),
        }
    }

    pub fn with_create_csv_options(mut self, options: ActivityOptions) -> Self {
        self.create_csv_options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_csv_options(&self) -> &ActivityOptions {
        &self.create_csv_options
    }

    /// Run the workflow body against `ctx`.
    ///
    /// Only `Outcome::Success` is ever returned here; a failed report call is
    /// returned as an error. See [`WorkflowError::outcome`].
    pub async fn execute<C>(
        &self,
        ctx: &C,
        request: &BatchPoststorageRequest,
    ) -> Result<BatchPoststorageResult, WorkflowError>
    where
        C: WorkflowContext + ?Sized,
    {
        tracing::debug!(
            run_id = ctx.run_id(),
            batch = %request.batch.uuid,
            sips = request.sips.len(),
            "Batch post-storage workflow running!"
        );

        let params = CreateCsvParams {
            batch: request.batch.clone(),
            sips: request.sips.clone(),
        };
        let csv: CreateCsvResult =
            execute_activity(ctx, CREATE_CSV_NAME, &self.create_csv_options, &params)
                .await
                .map_err(WorkflowError::CreateCsv)?;

        Ok(BatchPoststorageResult {
            outcome: Outcome::Success,
            relative_path: csv.key.0,
        })
    }
}

impl WorkflowError {
    /// Classify the failure for callers that want an [`Outcome`] rather than
    /// an error. Bad input is a content error; everything else is a system
    /// error.
    pub fn outcome(&self) -> Outcome {
        match self {
            WorkflowError::CreateCsv(failure) => match failure.kind {
                FailureKind::Application {
                    non_retryable: true,
                }
                | FailureKind::Codec => Outcome::ContentError,
                _ => Outcome::SystemError,
            },
        }
    }
}

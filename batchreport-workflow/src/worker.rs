use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::engine::LocalEngine;
use crate::error::EngineError;
use crate::poststorage::{BatchPoststorage, BatchPoststorageRequest, BatchPoststorageResult};

/// Result of one workflow run.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    pub result: Result<BatchPoststorageResult, EngineError>,
}

/// Executes batch post-storage runs, at most `max_concurrent_sessions` at a
/// time.
#[derive(Debug, Clone)]
pub struct Worker {
    engine: Arc<LocalEngine>,
    workflow: Arc<BatchPoststorage>,
    max_concurrent_sessions: usize,
}

impl Worker {
    pub fn new(
        engine: Arc<LocalEngine>,
        workflow: BatchPoststorage,
        max_concurrent_sessions: usize,
    ) -> Self {
        Self {
            engine,
            workflow: Arc::new(workflow),
            max_concurrent_sessions: max_concurrent_sessions.max(1),
        }
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.max_concurrent_sessions
    }

    /// Start or resume `run_id` and drive it to completion.
    pub async fn run_one(
        &self,
        run_id: &str,
        request: &BatchPoststorageRequest,
    ) -> Result<BatchPoststorageResult, EngineError> {
        run(&self.engine, &self.workflow, run_id, request).await
    }

    /// Run every `(run_id, request)` pair and return outcomes in input order.
    pub async fn run_all(
        &self,
        runs: Vec<(String, BatchPoststorageRequest)>,
    ) -> Result<Vec<RunOutcome>, EngineError> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_sessions));
        let mut set = JoinSet::new();

        for (index, (run_id, request)) in runs.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let workflow = Arc::clone(&self.workflow);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| EngineError::Join(format!("session semaphore closed: {e}")))?;
                let result = run(&engine, &workflow, &run_id, &request).await;
                Ok::<_, EngineError>((index, RunOutcome { run_id, result }))
            });
        }

        let mut outcomes = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(|e| EngineError::Join(e.to_string()))??;
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|(index, _)| *index);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

async fn run(
    engine: &LocalEngine,
    workflow: &BatchPoststorage,
    run_id: &str,
    request: &BatchPoststorageRequest,
) -> Result<BatchPoststorageResult, EngineError> {
    let ctx = engine.start_run(run_id, workflow.name())?;
    match workflow.execute(&ctx, request).await {
        Ok(result) => {
            tracing::info!(
                run_id,
                batch = %request.batch.uuid,
                relative_path = %result.relative_path,
                "workflow completed"
            );
            Ok(result)
        }
        Err(err) => {
            tracing::error!(
                run_id,
                batch = %request.batch.uuid,
                outcome = ?err.outcome(),
                error = %err,
                "workflow failed"
            );
            Err(err.into())
        }
    }
}

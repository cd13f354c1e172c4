//! Embedded durable execution engine.
//!
//! ## Model
//!
//! - Activities are registered by name and invoked with JSON params.
//! - Each run gets a [`RunContext`]. Every activity call inside the run takes
//!   the next sequence number.
//! - A call whose sequence number already has a journal entry returns the
//!   recorded result without executing anything. This is what makes a resumed
//!   run replay-safe: side effects that completed before a restart are not
//!   repeated.
//! - Otherwise the activity is attempted under its [`ActivityOptions`] and the
//!   final result, success or failure, is journaled before it is returned.
//!
//! Without a `state_dir` the journal lives only in memory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use batchreport_core::EngineConfig;

use crate::activity::{Activity, ActivityOptions, Erased, ErasedActivity};
use crate::context::WorkflowContext;
use crate::error::{ActivityError, ActivityFailure, EngineError, FailureKind};
use crate::journal::{self, JournalFile, RecordedResult};
use crate::paths::{journal_path, validate_run_id};

type Registry = HashMap<&'static str, Arc<dyn ErasedActivity>>;

pub struct LocalEngine {
    namespace: String,
    task_queue: String,
    state_dir: Option<PathBuf>,
    activities: Arc<Registry>,
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.activities.keys().collect();
        names.sort();
        f.debug_struct("LocalEngine")
            .field("namespace", &self.namespace)
            .field("task_queue", &self.task_queue)
            .field("state_dir", &self.state_dir)
            .field("activities", &names)
            .finish()
    }
}

impl LocalEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            task_queue: config.task_queue.clone(),
            state_dir: config.state_dir.clone(),
            activities: Arc::new(HashMap::new()),
        }
    }

    /// Engine with no durable state, for tests and one-shot runs.
    pub fn in_memory() -> Self {
        Self::new(&EngineConfig {
            state_dir: None,
            ..EngineConfig::default()
        })
    }

    /// Register `activity` under its name, replacing any earlier registration.
    ///
    /// Registration happens before the engine is shared; runs started earlier
    /// keep the registry they were started with.
    pub fn register<A: Activity>(&mut self, activity: A) -> &mut Self {
        let name = activity.name();
        Arc::make_mut(&mut self.activities).insert(name, Arc::new(Erased(activity)));
        tracing::debug!(activity = name, task_queue = %self.task_queue, "registered activity");
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn task_queue(&self) -> &str {
        &self.task_queue
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Start, or resume, run `run_id` of `workflow`.
    pub fn start_run(&self, run_id: &str, workflow: &str) -> Result<RunContext, EngineError> {
        validate_run_id(run_id)?;

        let path = self
            .state_dir
            .as_ref()
            .map(|dir| journal_path(dir, &self.namespace, run_id));

        let journal = match path.as_deref().map(journal::load).transpose()?.flatten() {
            Some(existing) => {
                if existing.workflow != workflow {
                    return Err(EngineError::WorkflowMismatch {
                        run_id: run_id.to_string(),
                        recorded: existing.workflow,
                        requested: workflow.to_string(),
                    });
                }
                tracing::info!(
                    run_id,
                    workflow,
                    recorded = existing.entries.len(),
                    "resuming run from journal"
                );
                existing
            }
            None => JournalFile::new(run_id, workflow),
        };

        Ok(RunContext {
            run_id: run_id.to_string(),
            activities: Arc::clone(&self.activities),
            journal_path: path,
            journal: Mutex::new(journal),
            seq: AtomicU64::new(0),
        })
    }
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// State of one workflow run.
pub struct RunContext {
    run_id: String,
    activities: Arc<Registry>,
    journal_path: Option<PathBuf>,
    journal: Mutex<JournalFile>,
    seq: AtomicU64,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("journal_path", &self.journal_path)
            .field("seq", &self.seq.load(Ordering::SeqCst))
            .finish()
    }
}

impl RunContext {
    /// Snapshot of what the run has recorded so far.
    pub fn journal(&self) -> JournalFile {
        self.journal.lock().clone()
    }

    fn record(
        &self,
        seq: u64,
        name: &str,
        result: &Result<Value, ActivityFailure>,
    ) -> Result<(), EngineError> {
        let mut journal = self.journal.lock();
        journal.record(seq, name, RecordedResult::from_result(result));
        match &self.journal_path {
            Some(path) => journal::save(path, &journal),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkflowContext for RunContext {
    fn run_id(&self) -> &str {
        &self.run_id
    }

    async fn execute_activity_json(
        &self,
        name: &str,
        options: &ActivityOptions,
        input: Value,
    ) -> Result<Value, ActivityFailure> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);

        let recorded = self.journal.lock().entry(seq).cloned();
        if let Some(entry) = recorded {
            if entry.activity != name {
                return Err(ActivityFailure::new(
                    name,
                    FailureKind::NonDeterministic,
                    format!(
                        "call {seq} was recorded as {}, replay requested {name}",
                        entry.activity
                    ),
                    0,
                ));
            }
            tracing::debug!(run_id = %self.run_id, seq, activity = name, "replaying recorded result");
            return entry.result.into_result();
        }

        let Some(activity) = self.activities.get(name).cloned() else {
            return Err(ActivityFailure::new(
                name,
                FailureKind::NotRegistered,
                "no activity registered under this name",
                0,
            ));
        };

        let result = attempt_until_done(name, activity, options, input).await;
        if let Err(err) = self.record(seq, name, &result) {
            tracing::error!(run_id = %self.run_id, seq, activity = name, error = %err, "failed to journal activity result");
            return Err(ActivityFailure::new(
                name,
                FailureKind::Engine,
                format!("journal: {err}"),
                0,
            ));
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Retry loop
// ---------------------------------------------------------------------------

async fn attempt_until_done(
    name: &str,
    activity: Arc<dyn ErasedActivity>,
    options: &ActivityOptions,
    input: Value,
) -> Result<Value, ActivityFailure> {
    let budget = options.schedule_to_close_timeout;
    let deadline = Instant::now() + budget;
    let policy = &options.retry_policy;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());

        let task = {
            let activity = Arc::clone(&activity);
            let input = input.clone();
            tokio::spawn(async move { activity.execute_json(input).await })
        };
        let abort = task.abort_handle();

        let err = match tokio::time::timeout(remaining, task).await {
            Ok(Ok(Ok(output))) => {
                tracing::debug!(activity = name, attempt, "activity completed");
                return Ok(output);
            }
            Ok(Ok(Err(err))) => err,
            Ok(Err(join)) => ActivityError::retryable(format!("activity task failed: {join}")),
            Err(_) => {
                abort.abort();
                tracing::warn!(activity = name, attempt, ?budget, "activity timed out");
                return Err(ActivityFailure::new(
                    name,
                    FailureKind::Timeout,
                    format!("schedule-to-close timeout of {budget:?} exceeded"),
                    attempt,
                ));
            }
        };

        if err.non_retryable || !policy.allows_attempt(attempt + 1) {
            tracing::warn!(
                activity = name,
                attempt,
                non_retryable = err.non_retryable,
                error = %err,
                "activity failed"
            );
            return Err(ActivityFailure::application(name, err, attempt));
        }

        let delay = policy.delay_after(attempt);
        if delay >= deadline.saturating_duration_since(Instant::now()) {
            tracing::warn!(activity = name, attempt, error = %err, "no budget left for another attempt");
            return Err(ActivityFailure::new(
                name,
                FailureKind::Timeout,
                err.message,
                attempt,
            ));
        }
        tracing::warn!(
            activity = name,
            attempt,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "activity attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

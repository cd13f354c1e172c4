use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by an activity implementation for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ActivityError {
    pub message: String,
    /// Retrying cannot help; the engine stops immediately.
    pub non_retryable: bool,
}

impl ActivityError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            non_retryable: false,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            non_retryable: true,
        }
    }
}

/// Why an activity call ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    /// The activity returned an error on its last attempt.
    Application { non_retryable: bool },
    /// The schedule-to-close budget ran out.
    Timeout,
    /// No activity is registered under the requested name.
    NotRegistered,
    /// Params or output could not be (de)serialized on the workflow side.
    Codec,
    /// A replayed run asked for a different activity than was recorded.
    NonDeterministic,
    /// The engine itself failed (journal I/O, task join).
    Engine,
}

/// Final, single logical outcome of an activity call after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFailure {
    pub activity: String,
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

impl ActivityFailure {
    pub fn new(activity: &str, kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            activity: activity.to_string(),
            kind,
            message: message.into(),
            attempts,
        }
    }

    pub(crate) fn application(activity: &str, err: ActivityError, attempts: u32) -> Self {
        Self::new(
            activity,
            FailureKind::Application {
                non_retryable: err.non_retryable,
            },
            err.message,
            attempts,
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}

impl fmt::Display for ActivityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Timeout => write!(
                f,
                "activity {} timed out after {} attempt(s): {}",
                self.activity, self.attempts, self.message
            ),
            FailureKind::NotRegistered => {
                write!(f, "activity {} is not registered", self.activity)
            }
            _ => write!(
                f,
                "activity {} failed after {} attempt(s): {}",
                self.activity, self.attempts, self.message
            ),
        }
    }
}

impl std::error::Error for ActivityFailure {}

/// Errors surfaced by the batch post-storage workflow.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("Create CSV: {0}")]
    CreateCsv(#[source] ActivityFailure),
}

/// Errors raised by the engine outside of an activity call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("journal JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid run id {0:?}")]
    InvalidRunId(String),

    #[error("run {run_id} belongs to workflow {recorded}, not {requested}")]
    WorkflowMismatch {
        run_id: String,
        recorded: String,
        requested: String,
    },

    #[error("workflow task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}

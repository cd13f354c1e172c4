//! Run journal: recorded activity results that make a run replay-safe.
//!
//! Persists a [`JournalFile`] JSON document at
//! `<state_dir>/<namespace>/runs/<run_id>.json`.
//! Writes use the atomic `.tmp` + rename pattern so a crash mid-save leaves
//! the previous journal intact.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, ActivityFailure, EngineError};

/// What an activity call resolved to, as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordedResult {
    Completed { output: Value },
    Failed { failure: ActivityFailure },
}

impl RecordedResult {
    pub fn from_result(result: &Result<Value, ActivityFailure>) -> Self {
        match result {
            Ok(output) => Self::Completed {
                output: output.clone(),
            },
            Err(failure) => Self::Failed {
                failure: failure.clone(),
            },
        }
    }

    pub fn into_result(self) -> Result<Value, ActivityFailure> {
        match self {
            Self::Completed { output } => Ok(output),
            Self::Failed { failure } => Err(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position of the call within the run, starting at 0.
    pub seq: u64,
    pub activity: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: RecordedResult,
}

/// On-disk journal payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalFile {
    pub run_id: String,
    pub workflow: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
}

impl JournalFile {
    pub fn new(run_id: &str, workflow: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            workflow: workflow.to_string(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, seq: u64) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.seq == seq)
    }

    pub fn record(&mut self, seq: u64, activity: &str, result: RecordedResult) {
        self.entries.retain(|e| e.seq != seq);
        self.entries.push(JournalEntry {
            seq,
            activity: activity.to_string(),
            recorded_at: Utc::now(),
            result,
        });
        self.entries.sort_by_key(|e| e.seq);
    }
}

/// Load the journal at `path`, or `None` if the run has never been started.
pub fn load(path: &Path) -> Result<Option<JournalFile>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let journal = serde_json::from_str(&contents).map_err(|e| EngineError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(journal))
}

/// Save the journal atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save(path: &Path, journal: &JournalFile) -> Result<(), EngineError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid journal path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(journal).map_err(|e| EngineError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

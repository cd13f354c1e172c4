use std::path::{Path, PathBuf};

use crate::error::EngineError;

pub const RUNS_DIR: &str = "runs";

/// `<state_dir>/<namespace>/runs/`
pub fn runs_dir(state_dir: &Path, namespace: &str) -> PathBuf {
    state_dir.join(namespace).join(RUNS_DIR)
}

/// `<state_dir>/<namespace>/runs/<run_id>.json`
pub fn journal_path(state_dir: &Path, namespace: &str, run_id: &str) -> PathBuf {
    runs_dir(state_dir, namespace).join(format!("{run_id}.json"))
}

/// Run ids become file names, so only `[A-Za-z0-9._-]` is accepted.
pub fn validate_run_id(run_id: &str) -> Result<(), EngineError> {
    let ok = !run_id.is_empty()
        && !run_id.starts_with('.')
        && run_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidRunId(run_id.to_string()))
    }
}

//! Error types for batchreport-csv.

use thiserror::Error;

use batchreport_store::StoreError;

/// All errors that can arise while generating a batch report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The input can never produce a report; retrying is pointless.
    #[error("create CSV: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Opening, writing or committing the report object failed.
    #[error("create CSV: {op}: {source}")]
    Storage {
        op: String,
        #[source]
        source: StoreError,
    },
}

/// Validation failures, reported with the offending record's 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("no SIPs provided")]
    NoSips,

    #[error("SIP {position}: missing name")]
    MissingName { position: usize },
}

impl ReportError {
    /// Storage failures may be transient; invalid input always recurs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReportError::Storage { .. })
    }
}

pub(crate) fn storage_err(op: impl Into<String>, source: StoreError) -> ReportError {
    ReportError::Storage {
        op: op.into(),
        source,
    }
}

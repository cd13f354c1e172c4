//! Error types for batchreport-store.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No committed object exists under the key.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The key would escape the bucket root or is otherwise unusable.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The bucket URL scheme is not supported.
    #[error("unsupported bucket URL {url:?}; expected file:///<dir> or mem://")]
    UnsupportedUrl { url: String },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

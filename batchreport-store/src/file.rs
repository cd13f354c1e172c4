//! Filesystem-backed bucket.
//!
//! ## Commit protocol
//!
//! 1. `new_writer` creates parent directories and opens a staging file next to
//!    the target, `.<name>.<random>.partial`. Every writer gets its own.
//! 2. Bytes stream into the staging file while size + SHA-256 are tallied.
//! 3. `commit` flushes, fsyncs and renames onto the final path (atomic on POSIX).
//!    With several writers on one key the last commit wins, whole.
//! 4. A writer dropped before step 3 removes its staging file.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::bucket::{validate_key, Bucket, ObjectWriter, Tally, WriteReceipt};
use crate::error::{io_err, StoreError};

const STAGING_SUFFIX: &str = ".partial";

/// Objects stored as files below `root`; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct FileBucket {
    root: PathBuf,
}

impl FileBucket {
    /// Open (creating if needed) a bucket rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final on-disk path for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }
}

fn open_staging(path: &Path) -> Result<NamedTempFile, StoreError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| io_err(parent, e))
}

impl Bucket for FileBucket {
    fn new_writer(&self, key: &str) -> Result<Box<dyn ObjectWriter>, StoreError> {
        let path = self.path_for(key)?;
        let staging = open_staging(&path)?;
        tracing::trace!(key, staging = %staging.path().display(), "opened staged object");
        Ok(Box::new(FileObjectWriter {
            key: key.to_string(),
            path,
            file: Some(BufWriter::new(staging)),
            tally: Tally::default(),
        }))
    }

    fn new_reader(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        let path = self.path_for(key)?;
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.is_file())
    }
}

struct FileObjectWriter {
    key: String,
    path: PathBuf,
    /// `None` once committed. Dropping it deletes the staging file.
    file: Option<BufWriter<NamedTempFile>>,
    tally: Tally,
}

impl Write for FileObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("object writer already committed"))?;
        let n = file.write(buf)?;
        self.tally.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl ObjectWriter for FileObjectWriter {
    fn key(&self) -> &str {
        &self.key
    }

    fn commit(mut self: Box<Self>) -> Result<WriteReceipt, StoreError> {
        let Some(buffered) = self.file.take() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("object writer already committed"),
            ));
        };
        let staging = buffered
            .into_inner()
            .map_err(|e| io_err(&self.path, e.into_error()))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|e| io_err(staging.path(), e))?;

        // On failure the returned PersistError owns the staging file and
        // deletes it when dropped.
        staging
            .persist(&self.path)
            .map_err(|e| io_err(&self.path, e.error))?;

        let tally = std::mem::take(&mut self.tally);
        let receipt = tally.finish(self.key.clone());
        tracing::debug!(
            key = %receipt.key,
            size = receipt.size,
            sha256 = %receipt.sha256,
            "committed object"
        );
        Ok(receipt)
    }
}

impl Drop for FileObjectWriter {
    fn drop(&mut self) {
        // Still holding the file means commit never ran.
        if let Some(file) = self.file.take() {
            let (staging, _unflushed) = file.into_parts();
            match staging.close() {
                Ok(()) => tracing::debug!(key = %self.key, "discarded uncommitted object"),
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "failed to discard staged object")
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

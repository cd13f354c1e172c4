//! Keyed blob store boundary.
//!
//! Writers stage their bytes and only make them visible on
//! [`ObjectWriter::commit`]. Dropping a writer that was never committed
//! discards everything written through it, so an aborted producer leaves no
//! object behind (and leaves any previously committed object untouched).

use std::fmt;
use std::io::{Read, Write};

use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Key as seen from the root of the store (prefixes applied).
    pub key: String,
    pub size: u64,
    /// SHA-256 hex digest of the committed bytes.
    pub sha256: String,
}

/// A streaming writer for one object.
pub trait ObjectWriter: Write + Send {
    /// Key the object will be committed under, as passed to `new_writer`.
    fn key(&self) -> &str;

    /// Flush staged bytes and make the object visible under its key,
    /// replacing any previous content.
    fn commit(self: Box<Self>) -> Result<WriteReceipt, StoreError>;
}

/// A keyed blob store with streaming read/write.
pub trait Bucket: Send + Sync + fmt::Debug {
    /// Open a staged writer for `key`.
    fn new_writer(&self, key: &str) -> Result<Box<dyn ObjectWriter>, StoreError>;

    /// Open a reader over the committed object at `key`.
    fn new_reader(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// The key as observed from the store root. Identity unless namespaced.
    fn full_key(&self, key: &str) -> String {
        key.to_string()
    }

    /// Read the whole object into memory.
    fn read_all(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut reader = self.new_reader(key)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| crate::error::io_err(key, e))?;
        Ok(buf)
    }
}

/// Reject keys that are empty, absolute, or contain `.`/`..`/empty segments.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = |reason| StoreError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.starts_with('/') {
        return Err(invalid("key must be relative"));
    }
    if key.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }
    if key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(invalid("empty, '.' or '..' segment"));
    }
    Ok(())
}

/// Running size + SHA-256 over bytes accepted by a writer.
#[derive(Default)]
pub(crate) struct Tally {
    hasher: Sha256,
    size: u64,
}

impl Tally {
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.size += bytes.len() as u64;
    }

    pub(crate) fn finish(self, key: String) -> WriteReceipt {
        WriteReceipt {
            key,
            size: self.size,
            sha256: hex::encode(self.hasher.finalize()),
        }
    }
}

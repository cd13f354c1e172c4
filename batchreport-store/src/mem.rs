//! In-process bucket, shared between clones.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bucket::{validate_key, Bucket, ObjectWriter, Tally, WriteReceipt};
use crate::error::StoreError;

type Objects = Arc<RwLock<BTreeMap<String, Arc<Vec<u8>>>>>;

#[derive(Debug, Clone, Default)]
pub struct MemBucket {
    objects: Objects,
}

impl MemBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }
}

impl Bucket for MemBucket {
    fn new_writer(&self, key: &str) -> Result<Box<dyn ObjectWriter>, StoreError> {
        validate_key(key)?;
        Ok(Box::new(MemObjectWriter {
            key: key.to_string(),
            objects: self.objects.clone(),
            buf: Vec::new(),
            tally: Tally::default(),
        }))
    }

    fn new_reader(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        validate_key(key)?;
        let bytes = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;
        Ok(Box::new(Cursor::new((*bytes).clone())))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.objects.read().contains_key(key))
    }
}

struct MemObjectWriter {
    key: String,
    objects: Objects,
    buf: Vec<u8>,
    tally: Tally,
}

impl Write for MemObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        self.tally.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ObjectWriter for MemObjectWriter {
    fn key(&self) -> &str {
        &self.key
    }

    fn commit(self: Box<Self>) -> Result<WriteReceipt, StoreError> {
        let MemObjectWriter {
            key,
            objects,
            buf,
            tally,
        } = *self;
        objects.write().insert(key.clone(), Arc::new(buf));
        Ok(tally.finish(key))
    }
}

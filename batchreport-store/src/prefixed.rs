//! Namespacing adapter: every key is stored under a fixed prefix.

use std::io::Read;
use std::sync::Arc;

use crate::bucket::{Bucket, ObjectWriter};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct PrefixedBucket {
    inner: Arc<dyn Bucket>,
    prefix: String,
}

impl PrefixedBucket {
    /// A trailing `/` is added to `prefix` when missing.
    pub fn new(inner: Arc<dyn Bucket>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { inner, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn join(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl Bucket for PrefixedBucket {
    fn new_writer(&self, key: &str) -> Result<Box<dyn ObjectWriter>, StoreError> {
        self.inner.new_writer(&self.join(key))
    }

    fn new_reader(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        self.inner.new_reader(&self.join(key))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(&self.join(key))
    }

    fn full_key(&self, key: &str) -> String {
        self.inner.full_key(&self.join(key))
    }
}

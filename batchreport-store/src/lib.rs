//! # batchreport-store
//!
//! Object store boundary for batch reports: a [`Bucket`] hands out staged
//! [`ObjectWriter`]s that publish content only on commit.
//!
//! Call [`open_bucket`] to build a bucket from its configured URL.

pub mod bucket;
pub mod error;
pub mod file;
pub mod mem;
pub mod prefixed;

use std::sync::Arc;

use batchreport_core::BucketConfig;

pub use bucket::{validate_key, Bucket, ObjectWriter, WriteReceipt};
pub use error::StoreError;
pub use file::FileBucket;
pub use mem::MemBucket;
pub use prefixed::PrefixedBucket;

/// Build a bucket from `file:///<dir>` or `mem://`, namespaced by `prefix`.
pub fn open_bucket(config: &BucketConfig) -> Result<Arc<dyn Bucket>, StoreError> {
    let url = config.url.trim();
    let base: Arc<dyn Bucket> = if let Some(path) = url.strip_prefix("file://") {
        if !path.starts_with('/') {
            return Err(StoreError::UnsupportedUrl {
                url: url.to_string(),
            });
        }
        Arc::new(FileBucket::new(path)?)
    } else if url == "mem://" || url == "mem:" {
        Arc::new(MemBucket::new())
    } else {
        return Err(StoreError::UnsupportedUrl {
            url: url.to_string(),
        });
    };
    tracing::debug!(url, prefix = %config.prefix, "opened bucket");

    if config.prefix.is_empty() {
        Ok(base)
    } else {
        Ok(Arc::new(PrefixedBucket::new(base, config.prefix.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cfg(url: &str, prefix: &str) -> BucketConfig {
        BucketConfig {
            url: url.to_string(),
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn opens_file_bucket() {
        let tmp = TempDir::new().unwrap();
        let url = format!("file://{}", tmp.path().display());
        let b = open_bucket(&cfg(&url, "")).unwrap();
        assert_eq!(b.full_key("x.csv"), "x.csv");
    }

    #[test]
    fn opens_prefixed_mem_bucket() {
        let b = open_bucket(&cfg("mem://", "reports/")).unwrap();
        assert_eq!(b.full_key("x.csv"), "reports/x.csv");
    }

    #[test]
    fn rejects_unknown_scheme() {
        for url in ["s3://bucket", "file://relative/dir", ""] {
            let err = open_bucket(&cfg(url, "")).unwrap_err();
            assert!(matches!(err, StoreError::UnsupportedUrl { .. }), "{url}");
        }
    }
}

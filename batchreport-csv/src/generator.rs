//! CSV report generation.
//!
//! ## Flow
//!
//! 1. Reject an empty SIP list before touching the store.
//! 2. Open a staged writer for `batch_<uuid>.csv`.
//! 3. Write the header, then one row per archived SIP in input order.
//!    A SIP without a name aborts the run; the staged writer is dropped and
//!    nothing becomes visible.
//! 4. Flush and commit.

use std::sync::Arc;

use batchreport_core::{Batch, ReportKey, Sip};
use batchreport_store::{Bucket, ObjectWriter, StoreError, WriteReceipt};

use crate::error::{storage_err, InvalidInput, ReportError};
use crate::row::{AtomRow, HEADER};

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReport {
    /// Key as observed from the store root, namespace included.
    pub key: ReportKey,
    /// Data rows written (header excluded).
    pub rows: usize,
    /// SIPs left out because they have no AIP identifier yet.
    pub skipped: usize,
    pub receipt: WriteReceipt,
}

/// Renders batch reports into a bucket.
#[derive(Debug, Clone)]
pub struct CsvReportGenerator {
    bucket: Arc<dyn Bucket>,
}

impl CsvReportGenerator {
    pub fn new(bucket: Arc<dyn Bucket>) -> Self {
        Self { bucket }
    }

    pub fn bucket(&self) -> &Arc<dyn Bucket> {
        &self.bucket
    }

    /// Write the report for `batch` and return where it landed.
    ///
    /// Re-running for the same batch overwrites the previous report.
    pub fn generate(&self, batch: &Batch, sips: &[Sip]) -> Result<GeneratedReport, ReportError> {
        if sips.is_empty() {
            return Err(InvalidInput::NoSips.into());
        }

        let key = ReportKey::for_batch(batch);
        let object = self
            .bucket
            .new_writer(key.as_str())
            .map_err(|e| storage_err("new writer", e))?;

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(object);

        csv.write_record(HEADER)
            .map_err(|e| csv_err("write header", key.as_str(), e))?;

        let mut rows = 0;
        for (i, sip) in sips.iter().enumerate() {
            let position = i + 1;
            if sip.name.is_empty() {
                return Err(InvalidInput::MissingName { position }.into());
            }
            let Some(row) = AtomRow::from_sip(sip) else {
                tracing::debug!(position, sip = %sip.name, "skipping SIP without AIP identifier");
                continue;
            };
            csv.write_record(row.record())
                .map_err(|e| csv_err(format!("write row {position}"), key.as_str(), e))?;
            rows += 1;
        }

        let object: Box<dyn ObjectWriter> = csv.into_inner().map_err(|e| {
            let source = std::io::Error::new(e.error().kind(), e.error().to_string());
            storage_err("flush writer", io_store_err(key.as_str(), source))
        })?;
        let receipt = object
            .commit()
            .map_err(|e| storage_err("commit", e))?;

        let report = GeneratedReport {
            key: ReportKey(self.bucket.full_key(key.as_str())),
            rows,
            skipped: sips.len() - rows,
            receipt,
        };
        tracing::info!(
            batch = %batch.uuid,
            key = %report.key,
            rows = report.rows,
            skipped = report.skipped,
            sha256 = %report.receipt.sha256,
            "created batch report"
        );
        Ok(report)
    }
}

fn io_store_err(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: key.into(),
        source,
    }
}

fn csv_err(op: impl Into<String>, key: &str, e: csv::Error) -> ReportError {
    storage_err(op, io_store_err(key, e.into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use batchreport_store::{MemBucket, PrefixedBucket};
    use std::io::{self, Read};
    use uuid::Uuid;

    use crate::row::ACCESS_RESTRICTION;

    fn batch() -> Batch {
        Batch::new(
            Uuid::parse_str("33333333-3333-3333-3333-333333333333").unwrap(),
            2,
        )
    }

    fn aip(s: &str) -> Option<Uuid> {
        Some(Uuid::parse_str(s).unwrap())
    }

    fn read(bucket: &MemBucket, key: &str) -> String {
        String::from_utf8(bucket.read_all(key).unwrap()).unwrap()
    }

    const KEY: &str = "batch_33333333-3333-3333-3333-333333333333.csv";

    #[test]
    fn writes_header_and_rows_in_input_order() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let sips = vec![
            Sip::named("Test SIP 1", aip("11111111-2222-3333-4444-555555555555")),
            Sip::named("Test SIP 2", aip("22222222-3333-4444-5555-666666666666")),
        ];

        let report = generator.generate(&batch(), &sips).expect("generate");
        assert_eq!(report.key.as_str(), KEY);
        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped, 0);

        let expected = format!(
            "title,alternativeIdentifiers,alternativeIdentifierLabels,radGeneralMaterialDesignation,culture,levelOfDescription,publicationStatus,accessRestriction\n\
             Test SIP 1,11111111-2222-3333-4444-555555555555,AIP UUID,Multiple media,File,en,draft,{ACCESS_RESTRICTION}\n\
             Test SIP 2,22222222-3333-4444-5555-666666666666,AIP UUID,Multiple media,File,en,draft,{ACCESS_RESTRICTION}\n"
        );
        assert_eq!(read(&bucket, KEY), expected);
        assert_eq!(report.receipt.size, expected.len() as u64);
    }

    #[test]
    fn empty_list_is_rejected_without_creating_object() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let err = generator.generate(&batch(), &[]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(InvalidInput::NoSips)));
        assert_eq!(err.to_string(), "create CSV: no SIPs provided");
        assert!(!err.is_retryable());
        assert!(bucket.keys().is_empty());
    }

    #[test]
    fn first_nameless_sip_is_reported_and_nothing_is_written() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let sips = vec![
            Sip::named("ok", aip("11111111-2222-3333-4444-555555555555")),
            Sip::named("", aip("22222222-3333-4444-5555-666666666666")),
            Sip::named("", None),
        ];
        let err = generator.generate(&batch(), &sips).unwrap_err();
        assert_eq!(err.to_string(), "create CSV: SIP 2: missing name");
        assert!(!bucket.exists(KEY).unwrap(), "no partial report may be visible");
    }

    #[test]
    fn unarchived_sips_are_skipped_but_header_is_written() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let report = generator
            .generate(&batch(), &[Sip::named("Test SIP 1", None)])
            .expect("generate");
        assert_eq!(report.rows, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(read(&bucket, KEY), format!("{}\n", HEADER.join(",")));
    }

    #[test]
    fn fields_needing_quotes_are_quoted() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let sips = vec![Sip::named(
            "Smith, \"Jr\"\nletters",
            aip("11111111-2222-3333-4444-555555555555"),
        )];
        generator.generate(&batch(), &sips).expect("generate");
        let body = read(&bucket, KEY);
        assert!(
            body.contains("\n\"Smith, \"\"Jr\"\"\nletters\",11111111-"),
            "got: {body}"
        );
    }

    #[test]
    fn prefixed_bucket_reports_full_key() {
        let root = MemBucket::new();
        let reports = PrefixedBucket::new(Arc::new(root.clone()), "reports/");
        let generator = CsvReportGenerator::new(Arc::new(reports));
        let report = generator
            .generate(&batch(), &[Sip::named("a", aip("11111111-2222-3333-4444-555555555555"))])
            .expect("generate");
        assert_eq!(report.key.as_str(), format!("reports/{KEY}"));
        assert!(root.exists(report.key.as_str()).unwrap());
    }

    #[test]
    fn rerun_overwrites_previous_report() {
        let bucket = MemBucket::new();
        let generator = CsvReportGenerator::new(Arc::new(bucket.clone()));
        let first = generator
            .generate(&batch(), &[Sip::named("first", aip("11111111-2222-3333-4444-555555555555"))])
            .expect("first");
        let second = generator
            .generate(&batch(), &[Sip::named("second", aip("11111111-2222-3333-4444-555555555555"))])
            .expect("second");
        assert_eq!(first.key, second.key);
        let body = read(&bucket, KEY);
        assert!(body.contains("second,"));
        assert!(!body.contains("first,"));
    }

    /// A bucket whose writers fail on every write.
    #[derive(Debug)]
    struct BrokenBucket;

    struct BrokenWriter;

    impl io::Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    impl ObjectWriter for BrokenWriter {
        fn key(&self) -> &str {
            "broken"
        }
        fn commit(self: Box<Self>) -> Result<WriteReceipt, StoreError> {
            unreachable!("commit must not be reached after a failed flush")
        }
    }

    impl Bucket for BrokenBucket {
        fn new_writer(&self, _key: &str) -> Result<Box<dyn ObjectWriter>, StoreError> {
            Ok(Box::new(BrokenWriter))
        }
        fn new_reader(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        }
        fn exists(&self, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[test]
    fn write_failures_are_retryable_storage_errors() {
        let generator = CsvReportGenerator::new(Arc::new(BrokenBucket));
        let err = generator
            .generate(&batch(), &[Sip::named("a", aip("11111111-2222-3333-4444-555555555555"))])
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage { .. }), "got: {err}");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("disk full"), "got: {err}");
    }
}

//! # batchreport-csv
//!
//! Renders an AtoM-compatible CSV manifest for a batch of SIPs and stores it
//! under `batch_<uuid>.csv`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use batchreport_core::{Batch, Sip};
//! use batchreport_csv::CsvReportGenerator;
//! use batchreport_store::MemBucket;
//!
//! fn report(batch: &Batch, sips: &[Sip]) {
//!     let generator = CsvReportGenerator::new(Arc::new(MemBucket::new()));
//!     match generator.generate(batch, sips) {
//!         Ok(report) => println!("{} ({} rows)", report.key, report.rows),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! ```

pub mod error;
pub mod generator;
pub mod row;

pub use error::{InvalidInput, ReportError};
pub use generator::{CsvReportGenerator, GeneratedReport};
pub use row::{AtomRow, ACCESS_RESTRICTION, HEADER};

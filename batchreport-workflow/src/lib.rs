//! # batchreport-workflow
//!
//! Durable orchestration of batch report generation.
//!
//! - [`LocalEngine`] is an embedded engine: named activities, per-call
//!   timeout and retry policy, and a journal that makes resumed runs replay
//!   recorded results instead of re-executing them.
//! - [`BatchPoststorage`] is the workflow: one `create-csv-activity` call with
//!   a ten minute budget and a single attempt.
//! - [`Worker`] drives several runs under a concurrency limit.

pub mod activity;
pub mod context;
pub mod create_csv;
pub mod engine;
mod error;
pub mod journal;
pub mod paths;
pub mod poststorage;
pub mod worker;

pub use activity::{Activity, ActivityOptions, RetryPolicy};
pub use context::{execute_activity, WorkflowContext};
pub use create_csv::{CreateCsv, CreateCsvParams, CreateCsvResult, CREATE_CSV_NAME};
pub use engine::{LocalEngine, RunContext};
pub use error::{ActivityError, ActivityFailure, EngineError, FailureKind, WorkflowError};
pub use poststorage::{
    BatchPoststorage, BatchPoststorageRequest, BatchPoststorageResult, Outcome,
    CREATE_CSV_TIMEOUT,
};
pub use worker::{RunOutcome, Worker};

//! Batch report core library — domain types, configuration, errors.
//!
//! - [`types`] — batch/SIP records and the report key newtype
//! - [`config`] — file + environment configuration with aggregated validation
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{BucketConfig, Config, EngineConfig, LoadedConfig, WorkerConfig};
pub use error::{ConfigError, Violations};
pub use types::{Batch, ReportKey, Sip};

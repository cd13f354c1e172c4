pub mod config;
pub mod report;
pub mod run;

use anyhow::{Context, Result};
use batchreport_core::Config;

use crate::GlobalArgs;

/// Load and validate configuration, then start logging.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let loaded = batchreport_core::config::load(global.config.as_deref())
        .context("failed to load configuration")?;
    crate::logging::init(&loaded.config, global.verbose);
    match &loaded.source {
        Some(path) => tracing::debug!(source = %path.display(), "loaded configuration"),
        None => tracing::debug!("no configuration file found; using defaults and environment"),
    }
    Ok(loaded.config)
}

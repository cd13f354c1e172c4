//! Worker configuration.
//!
//! # Sources (later wins)
//!
//! ```text
//! 1. built-in defaults
//! 2. batchreport.yaml  — explicit --config path, or first found of:
//!                          ./batchreport.yaml
//!                          $HOME/.config/batchreport.yaml
//!                          /etc/batchreport.yaml
//! 3. BATCHREPORT_* environment variables (e.g. BATCHREPORT_ENGINE_TASK_QUEUE)
//! ```
//!
//! # API pattern
//!
//! - `load_at(explicit, candidates, env)` — everything injected; used in tests
//! - `load(explicit)` — derives candidates from cwd/home and reads the process env
//!
//! Validation runs after all sources are merged and reports every violation
//! at once.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Violations};

pub const CONFIG_FILE_NAME: &str = "batchreport.yaml";
pub const ENV_PREFIX: &str = "BATCHREPORT_";

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Human readable logs instead of JSON.
    pub debug: bool,

    /// 0 logs warnings and errors only; each step up adds a level.
    pub verbosity: u8,

    /// Where batch reports are written.
    pub reports_bucket: Option<BucketConfig>,

    pub engine: EngineConfig,

    pub worker: WorkerConfig,
}

/// Object store location descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketConfig {
    /// `file:///abs/dir` or `mem://`.
    pub url: String,

    /// Namespace prepended to every key, e.g. `reports/`.
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the durable run journals. Unset keeps journals in memory.
    pub state_dir: Option<PathBuf>,
    pub namespace: String,
    pub task_queue: String,
    pub workflow_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            namespace: "default".to_string(),
            task_queue: String::new(),
            workflow_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Upper bound on workflow runs executing at the same time.
    pub max_concurrent_sessions: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 1,
        }
    }
}

/// A merged configuration plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// 2. Validation
// ---------------------------------------------------------------------------

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut v = Violations::default();
        self.check(&mut v);
        v.into_result()
    }

    /// Append every violation of this config to `v`, in field order.
    pub fn check(&self, v: &mut Violations) {
        match &self.reports_bucket {
            None => v.required("reports_bucket"),
            Some(bucket) if bucket.url.trim().is_empty() => v.required("reports_bucket.url"),
            Some(_) => {}
        }
        if self.engine.namespace.is_empty() {
            v.required("engine.namespace");
        }
        if self.engine.task_queue.is_empty() {
            v.required("engine.task_queue");
        }
        if self.engine.workflow_name.is_empty() {
            v.required("engine.workflow_name");
        }
        if self.worker.max_concurrent_sessions < 1 {
            v.push(format!(
                "worker.max_concurrent_sessions: {} is less than the minimum value (1)",
                self.worker.max_concurrent_sessions
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Candidate config file locations, in lookup order.
pub fn search_paths_at(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(home) = home {
        paths.push(home.join(".config").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from("/etc").join(CONFIG_FILE_NAME));
    paths
}

/// Read, merge and validate configuration.
///
/// An `explicit` path must exist. Without one, the first existing candidate
/// is used; finding none is not an error (env may supply everything).
pub fn load_at<I, K, V>(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
    env: I,
) -> Result<LoadedConfig, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let source = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path.to_path_buf())
        }
        None => candidates.iter().find(|p| p.is_file()).cloned(),
    };

    let mut config = match &source {
        Some(path) => read_file(path)?,
        None => Config::default(),
    };
    let mut v = Violations::default();
    apply_env_into(&mut config, env, &mut v);
    config.check(&mut v);
    v.into_result()?;

    Ok(LoadedConfig { config, source })
}

/// `load_at` convenience wrapper over the process environment.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = search_paths_at(&cwd, dirs::home_dir().as_deref());
    load_at(explicit, &candidates, std::env::vars())
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// 4. Environment overrides
// ---------------------------------------------------------------------------

/// Apply `BATCHREPORT_*` overrides. Unknown variables under the prefix are ignored.
///
/// Values that do not parse are all reported together in `ConfigError::Invalid`.
pub fn apply_env<I, K, V>(config: &mut Config, env: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut v = Violations::default();
    apply_env_into(config, env, &mut v);
    v.into_result()
}

/// Like [`apply_env`], appending unparsable values to `v`. The field keeps its
/// previous value.
pub fn apply_env_into<I, K, V>(config: &mut Config, env: I, v: &mut Violations)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in env {
        let key = key.as_ref();
        let value = value.as_ref();
        let Some(field) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        match field {
            "DEBUG" => {
                if let Some(b) = parse_bool(key, value, v) {
                    config.debug = b;
                }
            }
            "VERBOSITY" => {
                if let Some(n) = parse_num(key, value, v) {
                    config.verbosity = n;
                }
            }
            "REPORTS_BUCKET_URL" => {
                config.reports_bucket.get_or_insert_with(Default::default).url = value.to_string();
            }
            "REPORTS_BUCKET_PREFIX" => {
                config.reports_bucket.get_or_insert_with(Default::default).prefix =
                    value.to_string();
            }
            "ENGINE_STATE_DIR" => config.engine.state_dir = Some(PathBuf::from(value)),
            "ENGINE_NAMESPACE" => config.engine.namespace = value.to_string(),
            "ENGINE_TASK_QUEUE" => config.engine.task_queue = value.to_string(),
            "ENGINE_WORKFLOW_NAME" => config.engine.workflow_name = value.to_string(),
            "WORKER_MAX_CONCURRENT_SESSIONS" => {
                if let Some(n) = parse_num(key, value, v) {
                    config.worker.max_concurrent_sessions = n;
                }
            }
            _ => {}
        }
    }
}

fn parse_bool(var: &str, value: &str, v: &mut Violations) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => {
            v.invalid_env(var, value, "expected a boolean");
            None
        }
    }
}

fn parse_num<T>(var: &str, value: &str, v: &mut Violations) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(e) => {
            v.invalid_env(var, value, &e.to_string());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

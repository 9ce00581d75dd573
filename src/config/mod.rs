//! Job manager restart configuration
//!
//! Loaded from a JSON file; every field is optional:
//!
//! ```json
//! {
//!   "namespace_root": "job",
//!   "checkpoint_key": "checkpoint.job-manager",
//!   "store_dir": "/var/lib/jobmgr/kvs"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::CHECKPOINT_KEY;
use crate::kvs::{validate_key, SEPARATOR};

/// Default root of the job namespace
pub const NAMESPACE_ROOT: &str = "job";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Restart configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Root of the sharded job namespace
    #[serde(default = "default_namespace_root")]
    pub namespace_root: String,

    /// Key of the checkpoint record
    #[serde(default = "default_checkpoint_key")]
    pub checkpoint_key: String,

    /// Directory of a filesystem-backed store (operator tooling)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

fn default_namespace_root() -> String {
    NAMESPACE_ROOT.to_string()
}

fn default_checkpoint_key() -> String {
    CHECKPOINT_KEY.to_string()
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            namespace_root: default_namespace_root(),
            checkpoint_key: default_checkpoint_key(),
            store_dir: None,
        }
    }
}

impl RestartConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: RestartConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate keys
    pub fn validate(&self) -> ConfigResult<()> {
        validate_key(&self.namespace_root).map_err(|_| {
            ConfigError::Invalid(format!(
                "namespace_root '{}' is not a valid key",
                self.namespace_root
            ))
        })?;
        validate_key(&self.checkpoint_key).map_err(|_| {
            ConfigError::Invalid(format!(
                "checkpoint_key '{}' is not a valid key",
                self.checkpoint_key
            ))
        })?;

        let under_root = format!("{}{}", self.namespace_root, SEPARATOR);
        if self.checkpoint_key == self.namespace_root
            || self.checkpoint_key.starts_with(&under_root)
        {
            return Err(ConfigError::Invalid(format!(
                "checkpoint_key '{}' must not live under namespace_root '{}'",
                self.checkpoint_key, self.namespace_root
            )));
        }
        Ok(())
    }
}

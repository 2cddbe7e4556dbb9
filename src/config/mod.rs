//! Configuration
//!
//! Layered configuration for a store: built-in defaults, an optional TOML file
//! and `ARBOR_` environment variables, merged with the `config` crate.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::FsError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArborConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub trail: TrailConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_cache_capacity() -> u64 {
    64 * 1024 * 1024
}

fn default_flush_every_ms() -> Option<u64> {
    Some(500)
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; `None` means `$XDG_DATA_HOME/arbor/store`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Background flush interval; `None` disables periodic flushing
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,

    /// Throw the database away when the last handle closes
    #[serde(default)]
    pub temporary: bool,
}

impl StorageConfig {
    /// Storage rooted at an explicit directory.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// In-memory style storage removed on close.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    /// Resolve the database directory.
    pub fn resolve_path(&self) -> Result<PathBuf, FsError> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let data_home = paths::xdg_root::data_home().ok_or_else(|| {
            FsError::ConfigError(
                "Could not determine XDG data home directory (HOME not set)".to_string(),
            )
        })?;
        Ok(data_home.join("arbor").join("store"))
    }

    pub(crate) fn sled_config(&self) -> Result<sled::Config, FsError> {
        let config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(self.flush_every_ms);
        if self.temporary {
            let config = config.temporary(true);
            return Ok(match &self.path {
                Some(path) => config.path(path),
                None => config,
            });
        }
        Ok(config.path(self.resolve_path()?))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            cache_capacity: default_cache_capacity(),
            flush_every_ms: default_flush_every_ms(),
            temporary: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    16
}

fn default_backoff_ms() -> u64 {
    2
}

/// Retry policy for atomic units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Attempts before a conflicting unit gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step between attempts (milliseconds)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

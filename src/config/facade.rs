//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::ArborConfig;
use crate::error::FsError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the user-level config file (`$XDG_CONFIG_HOME/arbor/config.toml`).
    pub fn global_config_path() -> Result<PathBuf, FsError> {
        Ok(super::paths::xdg_root::config_home()?
            .join("arbor")
            .join("config.toml"))
    }

    /// Load configuration from the global file and environment.
    pub fn load() -> Result<ArborConfig, FsError> {
        Ok(MergeService::load()?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<ArborConfig, FsError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Write `config` as TOML to `path`, creating parent directories.
    pub fn write(config: &ArborConfig, path: &Path) -> Result<(), FsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FsError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| FsError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            FsError::ConfigError(format!(
                "Failed to write config to {}: {}",
                path.display(),
                e
            ))
        })
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::advisor::DEFAULT_MAX_SUGGESTIONS;
use crate::registries::maven::DEFAULT_BASE_URL;

/// Default log level when neither the config file nor `RUST_LOG` sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolConfig {
    pub repository: RepositoryConfig,
    pub advisor: AdvisorConfig,
    pub distributions: DistributionsConfig,
    pub log: LogConfig,
}

impl ToolConfig {
    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Remote Maven repository
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    pub url: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Version suggestion settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvisorConfig {
    pub max_suggestions: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Where distribution documents are looked up
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DistributionsConfig {
    /// Directory of `<artifactId>-<version>.properties` files
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Returns the path to the data directory for distro-state.
/// Uses $XDG_DATA_HOME/distro-state if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/distro-state,
/// or ./distro-state if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the directory holding the daily log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("distro-state")
}

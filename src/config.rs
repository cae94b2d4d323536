use crate::error::{Result, SnippetError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = "snipvault";
pub const DEFAULT_STORAGE_KEY: &str = "codeSnippets";
pub const DATA_DIR_ENV: &str = "SNIPVAULT_DATA_DIR";

/// Settings read from `<config_dir>/snipvault/config.toml`.
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
    pub copy_feedback_ms: u64,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            copy_feedback_ms: 2000,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads the user's config file if there is one, then applies the
    /// environment override
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_data_dir_override(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SnippetError::Config(e.to_string()))
    }

    pub fn apply_data_dir_override(&mut self, data_dir: Option<PathBuf>) {
        if let Some(dir) = data_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.data_dir = Some(dir);
        }
    }

    /// Configured data directory, or the platform data dir
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| SnippetError::Config("Failed to get data directory".to_string())),
        }
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

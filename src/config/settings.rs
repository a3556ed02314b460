//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::diff::{Granularity, SimilarDiff};
use crate::error::{ConfigError, Error, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GitHub REST API
    pub api_base_url: String,

    /// User-Agent sent with every API request (GitHub rejects requests without one)
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Branch used when a command does not name one
    pub default_branch: String,

    /// Root of the local workspace (defaults to the current directory)
    pub workspace_root: Option<PathBuf>,

    /// Directories under the root that are listed and pushed (empty = whole root)
    pub workspace_dirs: Vec<PathBuf>,

    /// Token granularity of the diff
    pub diff_granularity: Granularity,

    /// Use the patience algorithm for diffs
    pub diff_patience: bool,

    /// Diff computation deadline in milliseconds (0 = unbounded)
    pub diff_timeout_ms: u64,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: format!("{}/{}", crate::APP_NAME, crate::VERSION),
            request_timeout_secs: 30,
            default_branch: "main".to_string(),
            workspace_root: None,
            workspace_dirs: Vec::new(),
            diff_granularity: Granularity::Words,
            diff_patience: false,
            diff_timeout_ms: 0,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration using a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(config_path))
            // Layer environment variables (WSYNC_API_BASE_URL, etc.)
            .merge(Env::prefixed("WSYNC_"))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the saved credentials file path
    pub fn credentials_file_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("credentials.json"))
    }

    /// Get the workspace root
    pub fn workspace_root(&self) -> Result<PathBuf> {
        match self.workspace_root {
            Some(ref root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Edit script source configured from the diff settings
    pub fn edit_script_source(&self) -> SimilarDiff {
        let timeout =
            (self.diff_timeout_ms > 0).then(|| Duration::from_millis(self.diff_timeout_ms));
        SimilarDiff::new()
            .granularity(self.diff_granularity)
            .patience(self.diff_patience)
            .timeout(timeout)
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        let dirs = Self::project_dirs()?;

        std::fs::create_dir_all(dirs.config_dir()).map_err(|_e| {
            Error::Config(ConfigError::DirectoryCreationFailed(
                dirs.config_dir().to_path_buf(),
            ))
        })?;

        std::fs::create_dir_all(dirs.data_dir()).map_err(|_e| {
            Error::Config(ConfigError::DirectoryCreationFailed(
                dirs.data_dir().to_path_buf(),
            ))
        })?;

        Ok(())
    }

    /// Save current configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "workspace-sync", "workspace-sync").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}

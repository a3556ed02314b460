//! Saved credential storage
//!
//! The GitHub token lives in a JSON file in the data directory and is only
//! read or written through an explicit [`CredentialStore`].

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::Config;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Credentials {
    #[serde(default)]
    github_token: Option<String>,
}

/// Load/store lifecycle for the saved GitHub token
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by a specific file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default data directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::at(Config::credentials_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved token. A missing file is not an error.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::LoadFailed(format!("Failed to read credentials file: {}", e))
        })?;

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            ConfigError::LoadFailed(format!("Failed to parse credentials file: {}", e))
        })?;

        Ok(credentials.github_token.filter(|t| !t.is_empty()))
    }

    /// Save a token, replacing any previous one
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create credentials directory: {}", e))
            })?;
        }

        let credentials = Credentials {
            github_token: Some(token.to_string()),
        };
        let content = serde_json::to_string_pretty(&credentials)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize credentials: {}", e)))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_failed)?;

        // A file left by an older save keeps its mode; tighten it before writing
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(write_failed)?;
        }

        file.write_all(content.as_bytes()).map_err(write_failed)?;

        debug!("Saved credentials to {:?}", self.path);
        Ok(())
    }

    /// Remove the saved token. Returns whether one was present.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to remove credentials: {}", e)))?;
        Ok(true)
    }
}

fn write_failed(e: std::io::Error) -> ConfigError {
    ConfigError::SaveFailed(format!("Failed to write credentials file: {}", e))
}

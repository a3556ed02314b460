//! Error types for workspace-sync
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.
//! The diff renderer is total and has no error type of its own.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for workspace-sync
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub error: {0}")]
    Github(#[from] GithubError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// GitHub API errors
///
/// Every unexpected response collapses into [`GithubError::RequestFailed`];
/// there is no transient/permanent distinction and nothing is retried.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("{context}: {message}")]
    RequestFailed { context: String, message: String },

    #[error("Request to GitHub failed: {0}")]
    Transport(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("No GitHub token available (pass --token, set GITHUB_TOKEN or save one)")]
    MissingToken,

    #[error("Repository {0} not found")]
    RepoNotFound(String),

    #[error("File {0} not found in the repository")]
    FileNotFound(String),

    #[error("Source branch '{0}' not found")]
    BranchNotFound(String),

    #[error("Invalid branch name '{0}'. Please use only letters, numbers, hyphens and underscores.")]
    InvalidBranchName(String),

    #[error("Failed to decode content of {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl GithubError {
    /// Build the generic "request failed" error with a context prefix
    pub fn request_failed(context: impl Into<String>, message: impl Into<String>) -> Self {
        GithubError::RequestFailed {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(e: reqwest::Error) -> Self {
        GithubError::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Github(GithubError::Transport(e.to_string()))
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Local workspace errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path {0} is outside the workspace root")]
    OutsideRoot(PathBuf),

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("No files to push")]
    NothingToPush,
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

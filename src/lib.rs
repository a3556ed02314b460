//! Workspace Sync - keep an editor workspace in step with a GitHub repository
//!
//! This crate is the backend facade behind a browser-based workspace editor:
//! it authenticates against GitHub with a personal access token, lists
//! repositories and branches, fetches a branch's files, pushes local files as
//! a commit, and renders line-level diffs between local and remote files.
//!
//! # Modules
//!
//! - [`diff`] - Line diff renderer and its formatters
//! - [`github`] - GitHub REST API facade
//! - [`workspace`] - Local workspace files
//! - [`config`] - Configuration and the saved credential
//! - [`error`] - Error types

pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod workspace;

pub use config::{Config, CredentialStore};
pub use diff::{Classification, DiffRequest, DiffResponse, LineRecord, RenderResult, render};
pub use error::{Error, Result};
pub use github::{GithubClient, RepositoryHost};
pub use workspace::Workspace;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

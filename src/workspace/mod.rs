//! Local workspace access
//!
//! The workspace is a root directory plus an optional list of sub-directories
//! that make up the editor's files. Paths handed to the rest of the crate are
//! root-relative and use `/` separators, matching repository paths.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, WorkspaceError};

/// A file found in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Root-relative path
    pub path: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

/// Content of a workspace file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub path: String,
    pub content: String,
    pub last_modified: DateTime<Utc>,
}

/// Local workspace rooted at a directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    dirs: Vec<PathBuf>,
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn modified(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH))
}

impl Workspace {
    /// Workspace over `root`, limited to `dirs` (relative to root) when non-empty
    pub fn new(root: impl Into<PathBuf>, dirs: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dirs,
        }
    }

    /// Workspace described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.workspace_root()?,
            config.workspace_dirs.clone(),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-supplied path against the root, refusing anything outside it
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let candidate = Path::new(path);
        let relative = if candidate.is_absolute() {
            candidate
                .strip_prefix(&self.root)
                .map_err(|_| WorkspaceError::OutsideRoot(candidate.to_path_buf()))?
        } else {
            candidate
        };

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(WorkspaceError::OutsideRoot(candidate.to_path_buf()).into());
        }

        Ok(self.root.join(relative))
    }

    /// Root-relative, `/`-separated form of a path
    pub fn relative_path(&self, path: &str) -> Result<String> {
        let resolved = self.resolve(path)?;
        let relative = resolved
            .strip_prefix(&self.root)
            .map_err(|_| WorkspaceError::OutsideRoot(resolved.clone()))?;
        Ok(relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// All non-hidden files, sorted by path. Missing directories are skipped.
    pub fn list_files(&self) -> Result<Vec<FileInfo>> {
        let dirs = if self.dirs.is_empty() {
            vec![self.root.clone()]
        } else {
            self.dirs.iter().map(|d| self.root.join(d)).collect()
        };

        let mut files = Vec::new();
        for dir in dirs {
            if !dir.exists() {
                warn!("Workspace directory {:?} does not exist", dir);
                continue;
            }

            let walker = WalkDir::new(&dir)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Error accessing workspace entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                    continue;
                };
                files.push(FileInfo {
                    path: relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/"),
                    name: entry.file_name().to_string_lossy().into_owned(),
                    last_modified: modified(&metadata),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        debug!("Listed {} workspace file(s)", files.len());
        Ok(files)
    }

    /// Read a workspace file as UTF-8 text
    pub fn read_file(&self, path: &str) -> Result<WorkspaceFile> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(WorkspaceError::FileNotFound(resolved).into());
        }

        let read_failed = |e: std::io::Error| WorkspaceError::ReadFailed {
            path: resolved.clone(),
            reason: e.to_string(),
        };
        let content = std::fs::read_to_string(&resolved).map_err(read_failed)?;
        let metadata = std::fs::metadata(&resolved).map_err(read_failed)?;

        Ok(WorkspaceFile {
            path: self.relative_path(path)?,
            content,
            last_modified: modified(&metadata),
        })
    }
}

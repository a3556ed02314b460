//! Line-level diffs between workspace files and their repository counterparts
//!
//! - `edit_script` - Token-level edit scripts and semantic cleanup
//! - `render` - Classified, numbered line records
//! - `format` - HTML and plain-text formatters

mod edit_script;
mod format;
mod render;

pub use edit_script::*;
pub use format::*;
pub use render::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, GithubError, Result, WorkspaceError};
use crate::github::RepositoryHost;
use crate::workspace::Workspace;

/// A request to diff a workspace file against the repository version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffRequest {
    #[serde(default)]
    pub workspace_content: Option<String>,
    #[serde(default)]
    pub repo_content: Option<String>,
    /// Display name only; not used for the diff itself
    #[serde(default)]
    pub filename: String,
}

/// Markup ready to embed in the editor UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResponse {
    pub diff_html: String,
    pub styles: String,
}

/// Diff the repository content (left) against the workspace content (right).
/// Missing content on either side counts as an empty file.
pub fn diff_files(request: &DiffRequest) -> DiffResponse {
    diff_files_with(&SimilarDiff::default(), request)
}

/// Same as [`diff_files`] with an explicit edit script source
#[instrument(skip_all, fields(filename = %request.filename))]
pub fn diff_files_with(source: &impl EditScriptSource, request: &DiffRequest) -> DiffResponse {
    let left = request.repo_content.as_deref().unwrap_or_default();
    let right = request.workspace_content.as_deref().unwrap_or_default();

    let result = render_with(source, left, right);
    debug!("Rendered {} line(s): {}", result.lines.len(), result.summary());

    DiffResponse {
        diff_html: HtmlFormatter.format(&result),
        styles: result.styles,
    }
}

/// Render a workspace file against its version on `branch`.
///
/// A file missing on either side is diffed as empty text: a locally deleted
/// file shows as all deletions and a file not yet pushed as all insertions.
#[instrument(skip(host, workspace, source))]
pub async fn diff_with_remote(
    host: &dyn RepositoryHost,
    workspace: &Workspace,
    source: &(impl EditScriptSource + Sync),
    repo_name: &str,
    branch: &str,
    path: &str,
) -> Result<RenderResult> {
    let remote_path = workspace.relative_path(path)?;
    let repo_content = match host.fetch_file(repo_name, branch, &remote_path).await {
        Ok(content) => content,
        Err(Error::Github(GithubError::FileNotFound(_))) => String::new(),
        Err(e) => return Err(e),
    };
    let workspace_content = match workspace.read_file(path) {
        Ok(file) => file.content,
        Err(Error::Workspace(WorkspaceError::FileNotFound(_))) => String::new(),
        Err(e) => return Err(e),
    };
    Ok(render_with(source, &repo_content, &workspace_content))
}

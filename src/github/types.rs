//! GitHub facade and wire types
//!
//! Public types are what the editor consumes; the `pub(crate)` ones mirror
//! the subset of GitHub's JSON that the facade reads or writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_branch() -> String {
    "main".to_string()
}

/// A repository the token can access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Full `owner/name`
    pub name: String,
    pub description: Option<String>,
}

/// A branch of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub protected: bool,
    pub default: bool,
}

/// Protection rules of a branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtection {
    pub protected: bool,
    pub required_reviews: u32,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_status_checks: Vec<String>,
}

/// A file fetched from a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    pub path: String,
    pub content: String,
    pub sha: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Files to push as one commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub repo_name: String,
    /// Workspace-relative paths
    pub files: Vec<String>,
    pub commit_message: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSummary {
    pub commit_sha: String,
    pub branch: String,
    /// The branch ref did not exist before the push
    pub created_branch: bool,
    pub files_pushed: usize,
}

impl PushSummary {
    pub fn message(&self) -> String {
        format!(
            "Successfully pushed {} file(s) to {} ({})",
            self.files_pushed,
            self.branch,
            short_sha(&self.commit_sha)
        )
    }
}

/// A new branch to create from an existing one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranchRequest {
    pub repo_name: String,
    pub branch_name: String,
    #[serde(default = "default_branch")]
    pub from_branch: String,
}

/// Result of a successful branch creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBranchOutcome {
    /// Sanitized name the branch was created under
    pub branch: String,
    pub sha: String,
}

impl CreateBranchOutcome {
    pub fn message(&self) -> String {
        format!("Branch '{}' created successfully", self.branch)
    }
}

pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoResponse {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl From<RepoResponse> for Repository {
    fn from(repo: RepoResponse) -> Self {
        Self {
            name: repo.full_name,
            description: repo.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchResponse {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefResponse {
    pub object: RefObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShaResponse {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentItem {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitSignature {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitDetail {
    #[serde(default)]
    pub committer: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitListItem {
    pub commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewRules {
    #[serde(default)]
    pub required_approving_review_count: u32,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusCheck {
    pub context: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusChecks {
    #[serde(default)]
    pub checks: Vec<StatusCheck>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProtectionResponse {
    #[serde(default)]
    pub required_pull_request_reviews: Option<ReviewRules>,
    #[serde(default)]
    pub required_status_checks: Option<StatusChecks>,
}

impl From<ProtectionResponse> for BranchProtection {
    fn from(data: ProtectionResponse) -> Self {
        let reviews = data.required_pull_request_reviews.unwrap_or_default();
        let checks = data.required_status_checks.unwrap_or_default();
        Self {
            protected: true,
            required_reviews: reviews.required_approving_review_count,
            dismiss_stale_reviews: reviews.dismiss_stale_reviews,
            require_code_owner_reviews: reviews.require_code_owner_reviews,
            required_status_checks: checks.checks.into_iter().map(|c| c.context).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Entry of a tree created through `POST /git/trees`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: String,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644",
            kind: "blob",
            sha: sha.into(),
        }
    }
}

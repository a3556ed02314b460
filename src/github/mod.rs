//! GitHub REST API facade
//!
//! Provides the remote side of workspace synchronization:
//! - `GithubClient` - Authenticated HTTP transport
//! - Repository, branch and file queries
//! - Multi-step push (blob → tree → commit → ref)
//!
//! Calls are plain request/response with no retries or caching; the first
//! failure is returned to the caller as is.

mod branches;
mod client;
mod push;
mod repos;
mod types;

pub use branches::sanitize_branch_name;
pub use client::GithubClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;
use crate::workspace::Workspace;

/// Remote repository host as seen by the editor
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Login of the authenticated user
    async fn authenticate(&self) -> Result<String>;

    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    async fn list_branches(&self, repo_name: &str) -> Result<Vec<Branch>>;

    async fn create_branch(&self, request: &CreateBranchRequest) -> Result<CreateBranchOutcome>;

    async fn branch_protection(&self, repo_name: &str, branch: &str) -> Result<BranchProtection>;

    async fn list_repo_files(&self, repo_name: &str, branch: &str) -> Result<Vec<RepoFile>>;

    async fn fetch_file(&self, repo_name: &str, branch: &str, path: &str) -> Result<String>;

    async fn push(&self, request: &PushRequest, workspace: &Workspace) -> Result<PushSummary>;
}

#[async_trait]
impl RepositoryHost for GithubClient {
    async fn authenticate(&self) -> Result<String> {
        GithubClient::authenticate(self).await
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        GithubClient::list_repositories(self).await
    }

    async fn list_branches(&self, repo_name: &str) -> Result<Vec<Branch>> {
        GithubClient::list_branches(self, repo_name).await
    }

    async fn create_branch(&self, request: &CreateBranchRequest) -> Result<CreateBranchOutcome> {
        GithubClient::create_branch(self, request).await
    }

    async fn branch_protection(&self, repo_name: &str, branch: &str) -> Result<BranchProtection> {
        GithubClient::branch_protection(self, repo_name, branch).await
    }

    async fn list_repo_files(&self, repo_name: &str, branch: &str) -> Result<Vec<RepoFile>> {
        GithubClient::list_repo_files(self, repo_name, branch).await
    }

    async fn fetch_file(&self, repo_name: &str, branch: &str, path: &str) -> Result<String> {
        GithubClient::fetch_file(self, repo_name, branch, path).await
    }

    async fn push(&self, request: &PushRequest, workspace: &Workspace) -> Result<PushSummary> {
        GithubClient::push(self, request, workspace).await
    }
}

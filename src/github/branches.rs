//! Branch listing, creation and protection queries

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::{GithubError, Result};

use super::client::{GithubClient, encode_path};
use super::types::{
    Branch, BranchProtection, BranchResponse, CreateBranchOutcome, CreateBranchRequest,
    ProtectionResponse, RefResponse,
};

static INVALID_BRANCH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid branch name pattern"));

/// Make a branch name git compatible: spaces become hyphens, anything other
/// than letters, digits, `-` and `_` is dropped.
pub fn sanitize_branch_name(name: &str) -> String {
    let hyphenated = name.trim().replace(' ', "-");
    INVALID_BRANCH_CHARS.replace_all(&hyphenated, "").into_owned()
}

impl GithubClient {
    /// Branches of a repository with their protection and default flags
    #[instrument(skip(self))]
    pub async fn list_branches(&self, repo_name: &str) -> Result<Vec<Branch>> {
        let repo = self.repository(repo_name).await?;
        let default_branch = repo.default_branch.unwrap_or_default();

        let branches: Vec<BranchResponse> = self
            .send_json(
                self.get(&format!("repos/{}/branches", repo_name))
                    .query(&[("per_page", "100")]),
                "Failed to fetch branches",
            )
            .await?;
        debug!("Found {} branches", branches.len());

        let mut out = Vec::with_capacity(branches.len());
        for branch in branches {
            let protected = self.is_protected(repo_name, &branch.name).await?;
            out.push(Branch {
                default: branch.name == default_branch,
                protected,
                name: branch.name,
            });
        }
        Ok(out)
    }

    async fn is_protected(&self, repo_name: &str, branch: &str) -> Result<bool> {
        let response = self
            .send(self.get(&protection_path(repo_name, branch)))
            .await?;
        Ok(response.status().is_success())
    }

    /// Head commit SHA of `branch`, or `None` when the branch does not exist
    pub async fn branch_sha(&self, repo_name: &str, branch: &str) -> Result<Option<String>> {
        let response = self
            .send(
                self.get(&format!("repos/{}/branches", repo_name))
                    .query(&[("per_page", "100")]),
            )
            .await?;
        if !response.status().is_success() {
            debug!("Branch listing failed: {}", response.status());
            return Ok(None);
        }

        let branches: Vec<BranchResponse> = response.json().await.map_err(GithubError::from)?;
        if !branches.iter().any(|b| b.name == branch) {
            debug!("Branch {} does not exist", branch);
            return Ok(None);
        }

        self.ref_sha(repo_name, branch).await
    }

    async fn ref_sha(&self, repo_name: &str, branch: &str) -> Result<Option<String>> {
        let response = self
            .send(self.get(&format!(
                "repos/{}/git/refs/heads/{}",
                repo_name,
                encode_path(branch)
            )))
            .await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let reference: RefResponse = response.json().await.map_err(GithubError::from)?;
        debug!("Got branch SHA: {}", reference.object.sha);
        Ok(Some(reference.object.sha))
    }

    /// Create a branch pointing at the head of `from_branch`
    #[instrument(skip(self), fields(repo = %request.repo_name, branch = %request.branch_name))]
    pub async fn create_branch(&self, request: &CreateBranchRequest) -> Result<CreateBranchOutcome> {
        let sha = self
            .ref_sha(&request.repo_name, &request.from_branch)
            .await?
            .ok_or_else(|| GithubError::BranchNotFound(request.from_branch.clone()))?;

        let branch = sanitize_branch_name(&request.branch_name);
        if branch.is_empty() {
            return Err(GithubError::InvalidBranchName(request.branch_name.clone()).into());
        }

        let body = json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });
        let _: serde_json::Value = self
            .send_json(
                self.post(&format!("repos/{}/git/refs", request.repo_name))
                    .json(&body),
                "Failed to create branch",
            )
            .await?;

        info!("Created branch {} from {}", branch, request.from_branch);
        Ok(CreateBranchOutcome { branch, sha })
    }

    /// Protection rules of a branch; unprotected when GitHub reports none
    #[instrument(skip(self))]
    pub async fn branch_protection(
        &self,
        repo_name: &str,
        branch: &str,
    ) -> Result<BranchProtection> {
        let response = self
            .send(self.get(&protection_path(repo_name, branch)))
            .await?;
        if !response.status().is_success() {
            return Ok(BranchProtection::default());
        }
        let data: ProtectionResponse = response.json().await.map_err(GithubError::from)?;
        Ok(data.into())
    }
}

fn protection_path(repo_name: &str, branch: &str) -> String {
    format!("repos/{}/branches/{}/protection", repo_name, encode_path(branch))
}

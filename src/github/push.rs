//! Pushing workspace files as a single commit
//!
//! blob per file → tree → commit → branch ref (created or force-updated).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::error::{Result, WorkspaceError};
use crate::workspace::Workspace;

use super::client::{GithubClient, encode_path};
use super::types::{PushRequest, PushSummary, ShaResponse, TreeEntry};

const INITIAL_README: &str =
    "# Workspace Files\n\nThis repository contains workspace files managed by workspace-sync.\n";

impl GithubClient {
    /// Push the requested workspace files to `request.branch` as one commit
    #[instrument(skip(self, request, workspace), fields(repo = %request.repo_name, branch = %request.branch))]
    pub async fn push(&self, request: &PushRequest, workspace: &Workspace) -> Result<PushSummary> {
        if request.files.is_empty() {
            return Err(WorkspaceError::NothingToPush.into());
        }

        // Read everything up front so a missing file fails before any remote write
        let mut files = Vec::with_capacity(request.files.len());
        for path in &request.files {
            let relative = workspace.relative_path(path)?;
            let file = workspace.read_file(path)?;
            files.push((relative, file.content));
        }

        let repo = self.repository(&request.repo_name).await?;
        let is_empty_repo = repo.size == 0;
        if is_empty_repo {
            self.create_initial_readme(request).await?;
        }

        let branch_sha = self.branch_sha(&request.repo_name, &request.branch).await?;
        // A fresh repository only holds the seeded README, which is replaced wholesale
        let parent = if is_empty_repo { None } else { branch_sha.clone() };
        debug!("Base commit: {:?}", parent);

        let mut tree = Vec::with_capacity(files.len());
        for (path, content) in &files {
            let sha = self.create_blob(&request.repo_name, content).await?;
            debug!("Created blob {} for {}", sha, path);
            tree.push(TreeEntry::blob(path.clone(), sha));
        }

        let tree_sha = self
            .create_tree(&request.repo_name, &tree, parent.as_deref())
            .await?;

        let commit: ShaResponse = self
            .send_json(
                self.post(&format!("repos/{}/git/commits", request.repo_name))
                    .json(&json!({
                        "message": request.commit_message,
                        "tree": tree_sha,
                        "parents": parent.iter().collect::<Vec<_>>(),
                    })),
                "Failed to create commit",
            )
            .await?;

        let created_branch = branch_sha.is_none();
        if created_branch {
            info!("Creating new branch: {}", request.branch);
            let _: Value = self
                .send_json(
                    self.post(&format!("repos/{}/git/refs", request.repo_name))
                        .json(&json!({
                            "ref": format!("refs/heads/{}", request.branch),
                            "sha": commit.sha,
                        })),
                    "Failed to create branch",
                )
                .await?;
        } else {
            info!("Updating existing branch: {}", request.branch);
            let _: Value = self
                .send_json(
                    self.patch(&format!(
                        "repos/{}/git/refs/heads/{}",
                        request.repo_name,
                        encode_path(&request.branch)
                    ))
                    .json(&json!({ "sha": commit.sha, "force": true })),
                    "Failed to update branch",
                )
                .await?;
        }

        Ok(PushSummary {
            commit_sha: commit.sha,
            branch: request.branch.clone(),
            created_branch,
            files_pushed: files.len(),
        })
    }

    async fn create_initial_readme(&self, request: &PushRequest) -> Result<()> {
        info!("Creating initial README.md for empty repository");
        let _: Value = self
            .send_json(
                self.put(&format!("repos/{}/contents/README.md", request.repo_name))
                    .json(&json!({
                        "message": "Initial commit with README",
                        "content": STANDARD.encode(INITIAL_README),
                        "branch": request.branch,
                    })),
                "Failed to create README",
            )
            .await?;
        Ok(())
    }

    async fn create_blob(&self, repo_name: &str, content: &str) -> Result<String> {
        let blob: ShaResponse = self
            .send_json(
                self.post(&format!("repos/{}/git/blobs", repo_name))
                    .json(&json!({
                        "content": STANDARD.encode(content),
                        "encoding": "base64",
                    })),
                "Failed to create blob",
            )
            .await?;
        Ok(blob.sha)
    }

    async fn create_tree(
        &self,
        repo_name: &str,
        tree: &[TreeEntry],
        base_tree: Option<&str>,
    ) -> Result<String> {
        let mut body = json!({ "tree": tree });
        if let Some(base) = base_tree {
            body["base_tree"] = json!(base);
        }
        let created: ShaResponse = self
            .send_json(
                self.post(&format!("repos/{}/git/trees", repo_name)).json(&body),
                "Failed to create tree",
            )
            .await?;
        Ok(created.sha)
    }
}

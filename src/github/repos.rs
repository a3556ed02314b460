//! Authentication, repository listing and file retrieval

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use crate::error::{GithubError, Result};

use super::client::{GithubClient, encode_path, failure};
use super::types::{
    CommitListItem, ContentItem, RepoFile, RepoResponse, Repository, UserResponse,
};

/// Decode a base64 `content` field as returned by the contents API (wrapped at 60 columns)
pub(crate) fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| GithubError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl GithubClient {
    /// Check the token and return the login it belongs to
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<String> {
        let response = self.send(self.get("user")).await?;
        if !response.status().is_success() {
            return Err(GithubError::InvalidToken.into());
        }
        let user: UserResponse = response.json().await.map_err(GithubError::from)?;
        info!("Authenticated as {}", user.login);
        Ok(user.login)
    }

    /// Repositories visible to the token
    #[instrument(skip(self))]
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let repos: Vec<RepoResponse> = self
            .send_json(
                self.get("user/repos").query(&[("per_page", "100")]),
                "Failed to fetch repositories",
            )
            .await?;
        debug!("Found {} repositories", repos.len());
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    /// Ensure the repository exists and is accessible
    pub async fn validate_repo_access(&self, repo_name: &str) -> Result<()> {
        self.repository(repo_name).await.map(|_| ())
    }

    pub(crate) async fn repository(&self, repo_name: &str) -> Result<RepoResponse> {
        let response = self.send(self.get(&format!("repos/{}", repo_name))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(GithubError::RepoNotFound(repo_name.to_string()).into()),
            status if !status.is_success() => {
                Err(failure(response, "Failed to access repository").await.into())
            }
            _ => Ok(response.json().await.map_err(GithubError::from)?),
        }
    }

    /// Every file of `branch` with its decoded content.
    ///
    /// Empty repositories and missing branches yield no files.
    #[instrument(skip(self))]
    pub async fn list_repo_files(&self, repo_name: &str, branch: &str) -> Result<Vec<RepoFile>> {
        let repo = self.repository(repo_name).await?;
        if repo.size == 0 {
            info!("Repository {} is empty", repo_name);
            return Ok(Vec::new());
        }

        if self.branch_sha(repo_name, branch).await?.is_none() {
            info!("Branch {} not found or empty", branch);
            return Ok(Vec::new());
        }

        let entries = self.walk_contents(repo_name, branch).await?;
        info!("Total files found: {}", entries.len());

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let content = self.fetch_file(repo_name, branch, &entry.path).await?;
            let last_modified = self.last_modified(repo_name, branch, &entry.path).await;
            files.push(RepoFile {
                path: entry.path,
                content,
                sha: entry.sha,
                last_modified,
            });
        }
        Ok(files)
    }

    /// Depth-first walk of the contents API collecting file entries.
    /// Directories that cannot be listed are skipped.
    async fn walk_contents(&self, repo_name: &str, branch: &str) -> Result<Vec<ContentItem>> {
        let mut files = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(dir) = pending.pop() {
            let path = if dir.is_empty() {
                format!("repos/{}/contents", repo_name)
            } else {
                format!("repos/{}/contents/{}", repo_name, encode_path(&dir))
            };
            let response = self
                .send(self.get(&path).query(&[("ref", branch)]))
                .await?;
            if !response.status().is_success() {
                warn!("Failed to get contents for path '{}': {}", dir, response.status());
                continue;
            }

            let Ok(items) = response.json::<Vec<ContentItem>>().await else {
                warn!("Unexpected response format for path '{}'", dir);
                continue;
            };

            for item in items {
                match item.kind.as_str() {
                    "file" => {
                        debug!("Found file: {}", item.path);
                        files.push(item);
                    }
                    "dir" => {
                        debug!("Found directory: {}", item.path);
                        pending.push(item.path);
                    }
                    other => debug!("Skipping {} entry {}", other, item.path),
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Content of a single file on `branch`
    pub async fn fetch_file(&self, repo_name: &str, branch: &str, path: &str) -> Result<String> {
        let response = self
            .send(
                self.get(&format!("repos/{}/contents/{}", repo_name, encode_path(path)))
                    .query(&[("ref", branch)]),
            )
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(GithubError::FileNotFound(path.to_string()).into());
            }
            status if !status.is_success() => {
                return Err(failure(response, &format!("Failed to fetch {}", path))
                    .await
                    .into());
            }
            _ => {}
        }
        let item: ContentItem = response.json().await.map_err(GithubError::from)?;
        match item.content {
            Some(encoded) => decode_content(path, &encoded),
            None => Ok(String::new()),
        }
    }

    /// Commit date of the latest commit touching `path`, if any
    async fn last_modified(
        &self,
        repo_name: &str,
        branch: &str,
        path: &str,
    ) -> Option<DateTime<Utc>> {
        let request = self
            .get(&format!("repos/{}/commits", repo_name))
            .query(&[("path", path), ("sha", branch), ("per_page", "1")]);
        let commits: Vec<CommitListItem> = self
            .send_json(request, "Failed to fetch commits")
            .await
            .ok()?;
        commits
            .into_iter()
            .next()
            .and_then(|c| c.commit.committer)
            .map(|committer| committer.date)
    }
}

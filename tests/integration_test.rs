//! Integration tests for workspace-sync
//!
//! GitHub is replaced by a local wiremock server and the workspace lives in a
//! temporary directory, so nothing here touches the network or user data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workspace_sync::config::Config;
use workspace_sync::diff::{self, Classification, SimilarDiff};
use workspace_sync::error::{Error, GithubError};
use workspace_sync::github::{BranchProtection, CreateBranchRequest, GithubClient, PushRequest};
use workspace_sync::workspace::Workspace;

const REPO: &str = "octo/notes";

fn client_for(server: &MockServer) -> GithubClient {
    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    GithubClient::new(&config, "ghp_test_token").unwrap()
}

async fn mount_json(server: &MockServer, verb: &str, route: &str, body: serde_json::Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Repository metadata plus a `main` branch pointing at `base123`
async fn mount_repo_with_main(server: &MockServer, size: u64) {
    mount_json(
        server,
        "GET",
        "/repos/octo/notes",
        json!({ "full_name": REPO, "description": null, "size": size, "default_branch": "main" }),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/repos/octo/notes/branches",
        json!([{ "name": "main" }]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/repos/octo/notes/git/refs/heads/main",
        json!({ "ref": "refs/heads/main", "object": { "sha": "base123" } }),
    )
    .await;
}

fn content_item(path: &str, content: &str) -> serde_json::Value {
    json!({
        "path": path,
        "sha": format!("sha-{}", path),
        "type": "file",
        "content": STANDARD.encode(content),
    })
}

fn workspace_with(files: &[(&str, &str)]) -> (TempDir, Workspace) {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp_dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    let workspace = Workspace::new(temp_dir.path(), Vec::new());
    (temp_dir, workspace)
}

#[tokio::test]
async fn test_authenticate_returns_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ghp_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })))
        .expect(1)
        .mount(&server)
        .await;

    let login = client_for(&server).authenticate().await.unwrap();
    assert_eq!(login, "octocat");
}

#[tokio::test]
async fn test_authenticate_rejects_bad_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, Error::Github(GithubError::InvalidToken)));
}

#[tokio::test]
async fn test_list_repositories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "full_name": "octo/notes", "description": "Team notes" },
            { "full_name": "octo/site", "description": null },
        ])))
        .mount(&server)
        .await;

    let repos = client_for(&server).list_repositories().await.unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].name, "octo/notes");
    assert_eq!(repos[0].description.as_deref(), Some("Team notes"));
    assert_eq!(repos[1].description, None);
}

#[tokio::test]
async fn test_request_failure_carries_github_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).list_repositories().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "GitHub error: Failed to fetch repositories: API rate limit exceeded"
    );
}

#[tokio::test]
async fn test_missing_repository() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .list_branches("octo/missing")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Github(GithubError::RepoNotFound(_))));
}

#[tokio::test]
async fn test_list_branches_flags_default_and_protected() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes",
        json!({ "full_name": REPO, "size": 12, "default_branch": "main" }),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/branches",
        json!([{ "name": "main" }, { "name": "draft" }]),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/branches/main/protection",
        json!({}),
    )
    .await;

    let branches = client_for(&server).list_branches(REPO).await.unwrap();
    assert_eq!(branches.len(), 2);
    assert!(branches[0].default && branches[0].protected);
    assert_eq!(branches[1].name, "draft");
    assert!(!branches[1].default && !branches[1].protected);
}

#[tokio::test]
async fn test_branch_protection_rules() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/branches/main/protection",
        json!({
            "required_pull_request_reviews": {
                "required_approving_review_count": 2,
                "dismiss_stale_reviews": true,
                "require_code_owner_reviews": false
            },
            "required_status_checks": { "checks": [{ "context": "ci/build" }] }
        }),
    )
    .await;

    let client = client_for(&server);
    let protection = client.branch_protection(REPO, "main").await.unwrap();
    assert!(protection.protected);
    assert_eq!(protection.required_reviews, 2);
    assert!(protection.dismiss_stale_reviews);
    assert!(!protection.require_code_owner_reviews);
    assert_eq!(protection.required_status_checks, vec!["ci/build"]);

    // Unprotected branches answer 404
    let open = client.branch_protection(REPO, "draft").await.unwrap();
    assert_eq!(open, BranchProtection::default());
}

#[tokio::test]
async fn test_create_branch_sanitizes_name() {
    let server = MockServer::start().await;
    mount_repo_with_main(&server, 12).await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/refs"))
        .and(body_partial_json(json!({
            "ref": "refs/heads/my-feature-1",
            "sha": "base123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ref": "refs/heads/my-feature-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .create_branch(&CreateBranchRequest {
            repo_name: REPO.to_string(),
            branch_name: "my feature #1".to_string(),
            from_branch: "main".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome.branch, "my-feature-1");
    assert_eq!(outcome.sha, "base123");
    assert_eq!(outcome.message(), "Branch 'my-feature-1' created successfully");
}

#[tokio::test]
async fn test_create_branch_from_missing_source() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .create_branch(&CreateBranchRequest {
            repo_name: REPO.to_string(),
            branch_name: "feature".to_string(),
            from_branch: "nope".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Github(GithubError::BranchNotFound(b)) if b == "nope"));
}

#[tokio::test]
async fn test_list_repo_files_walks_directories() {
    let server = MockServer::start().await;
    mount_repo_with_main(&server, 12).await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/contents"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "path": "src", "sha": "tree-src", "type": "dir" },
            { "path": "README.md", "sha": "sha-README.md", "type": "file" },
        ])))
        .mount(&server)
        .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/src",
        json!([{ "path": "src/lib.rs", "sha": "sha-src/lib.rs", "type": "file" }]),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/README.md",
        content_item("README.md", "# Notes\n"),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/src/lib.rs",
        content_item("src/lib.rs", "pub fn x() {}\n"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/commits"))
        .and(query_param("path", "README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "commit": { "committer": { "date": "2024-01-02T03:04:05Z" } } }
        ])))
        .mount(&server)
        .await;

    let files = client_for(&server).list_repo_files(REPO, "main").await.unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "src/lib.rs"]);
    assert_eq!(files[0].content, "# Notes\n");
    assert_eq!(files[1].content, "pub fn x() {}\n");
    assert_eq!(
        files[0].last_modified.map(|d| d.to_rfc3339()),
        Some("2024-01-02T03:04:05+00:00".to_string())
    );
    assert_eq!(files[1].last_modified, None);
}

#[tokio::test]
async fn test_list_repo_files_of_empty_repository() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes",
        json!({ "full_name": REPO, "size": 0 }),
    )
    .await;

    let files = client_for(&server).list_repo_files(REPO, "main").await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_push_updates_existing_branch() {
    let server = MockServer::start().await;
    mount_repo_with_main(&server, 12).await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/blobs"))
        .and(body_partial_json(json!({
            "content": STANDARD.encode("- write tests\n"),
            "encoding": "base64"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "blob1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/trees"))
        .and(body_partial_json(json!({
            "base_tree": "base123",
            "tree": [{ "path": "notes/todo.md", "mode": "100644", "type": "blob", "sha": "blob1" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/commits"))
        .and(body_partial_json(json!({
            "message": "Update todo",
            "tree": "tree1",
            "parents": ["base123"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "abcdef1234567" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/notes/git/refs/heads/main"))
        .and(body_partial_json(json!({ "sha": "abcdef1234567", "force": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ref": "refs/heads/main" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, workspace) = workspace_with(&[("notes/todo.md", "- write tests\n")]);
    let summary = client_for(&server)
        .push(
            &PushRequest {
                repo_name: REPO.to_string(),
                files: vec!["notes/todo.md".to_string()],
                commit_message: "Update todo".to_string(),
                branch: "main".to_string(),
            },
            &workspace,
        )
        .await
        .unwrap();

    assert_eq!(summary.commit_sha, "abcdef1234567");
    assert!(!summary.created_branch);
    assert_eq!(summary.files_pushed, 1);
    assert_eq!(
        summary.message(),
        "Successfully pushed 1 file(s) to main (abcdef1)"
    );
}

#[tokio::test]
async fn test_push_creates_missing_branch() {
    let server = MockServer::start().await;
    mount_repo_with_main(&server, 12).await;
    mount_json(&server, "POST", "/repos/octo/notes/git/blobs", json!({ "sha": "blob1" })).await;
    mount_json(&server, "POST", "/repos/octo/notes/git/trees", json!({ "sha": "tree1" })).await;
    mount_json(
        &server,
        "POST",
        "/repos/octo/notes/git/commits",
        json!({ "sha": "fedcba9876543" }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/refs"))
        .and(body_partial_json(json!({
            "ref": "refs/heads/drafts",
            "sha": "fedcba9876543"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ref": "refs/heads/drafts" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, workspace) = workspace_with(&[("a.txt", "a\n")]);
    let summary = client_for(&server)
        .push(
            &PushRequest {
                repo_name: REPO.to_string(),
                files: vec!["a.txt".to_string()],
                commit_message: "Start drafts".to_string(),
                branch: "drafts".to_string(),
            },
            &workspace,
        )
        .await
        .unwrap();

    assert!(summary.created_branch);
    assert_eq!(summary.branch, "drafts");
}

#[tokio::test]
async fn test_push_seeds_empty_repository() {
    let server = MockServer::start().await;
    mount_repo_with_main(&server, 0).await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/notes/contents/README.md"))
        .and(body_partial_json(json!({ "branch": "main" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": {} })))
        .expect(1)
        .mount(&server)
        .await;
    mount_json(&server, "POST", "/repos/octo/notes/git/blobs", json!({ "sha": "blob1" })).await;
    mount_json(&server, "POST", "/repos/octo/notes/git/trees", json!({ "sha": "tree1" })).await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/notes/git/commits"))
        .and(body_partial_json(json!({ "parents": [] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "1111111aaaa" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_json(
        &server,
        "PATCH",
        "/repos/octo/notes/git/refs/heads/main",
        json!({ "ref": "refs/heads/main" }),
    )
    .await;

    let (_temp_dir, workspace) = workspace_with(&[("a.txt", "a\n")]);
    let summary = client_for(&server)
        .push(
            &PushRequest {
                repo_name: REPO.to_string(),
                files: vec!["a.txt".to_string()],
                commit_message: "First".to_string(),
                branch: "main".to_string(),
            },
            &workspace,
        )
        .await
        .unwrap();
    assert_eq!(summary.commit_sha, "1111111aaaa");
}

#[tokio::test]
async fn test_push_without_files_is_rejected() {
    let server = MockServer::start().await;
    let (_temp_dir, workspace) = workspace_with(&[]);
    let err = client_for(&server)
        .push(
            &PushRequest {
                repo_name: REPO.to_string(),
                files: Vec::new(),
                commit_message: "Nothing".to_string(),
                branch: "main".to_string(),
            },
            &workspace,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No files"));
}

#[tokio::test]
async fn test_diff_with_remote() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/notes/todo.md",
        content_item("notes/todo.md", "one\ntwo\nthree\n"),
    )
    .await;

    let (_temp_dir, workspace) = workspace_with(&[("notes/todo.md", "one\n2\nthree\n")]);
    let client = client_for(&server);
    let result = diff::diff_with_remote(
        &client,
        &workspace,
        &SimilarDiff::default(),
        REPO,
        "main",
        "notes/todo.md",
    )
    .await
    .unwrap();

    let rows: Vec<_> = result
        .lines
        .iter()
        .map(|l| (l.left_number, l.right_number, l.classification, l.content.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (Some(1), Some(1), Classification::Equal, "one"),
            (Some(2), None, Classification::Deletion, "two"),
            (None, Some(2), Classification::Insertion, "2"),
            (Some(3), Some(3), Classification::Equal, "three"),
        ]
    );
    assert_eq!(result.summary(), "+1 -1 lines");
}

#[tokio::test]
async fn test_diff_with_remote_for_locally_deleted_file() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/gone.txt",
        content_item("gone.txt", "bye\n"),
    )
    .await;

    let (_temp_dir, workspace) = workspace_with(&[]);
    let result = diff::diff_with_remote(
        &client_for(&server),
        &workspace,
        &SimilarDiff::default(),
        REPO,
        "main",
        "gone.txt",
    )
    .await
    .unwrap();

    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].classification, Classification::Deletion);
    assert_eq!(result.deletions(), 1);
    assert_eq!(result.insertions(), 0);
}

#[tokio::test]
async fn test_diff_with_remote_for_unpushed_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/contents/new.md"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let (_temp_dir, workspace) = workspace_with(&[("new.md", "hello\n")]);
    let result = diff::diff_with_remote(
        &client_for(&server),
        &workspace,
        &SimilarDiff::default(),
        REPO,
        "main",
        "new.md",
    )
    .await
    .unwrap();

    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].classification, Classification::Insertion);
    assert_eq!(result.lines[0].right_number, Some(1));
    assert_eq!(result.lines[0].content, "hello");
}

#[tokio::test]
async fn test_fetch_missing_file_is_not_found() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .fetch_file(REPO, "main", "missing.md")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Github(GithubError::FileNotFound(p)) if p == "missing.md"));
}

#[tokio::test]
async fn test_fetch_file_encodes_reserved_characters() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/a",
        content_item("a", "WRONG FILE\n"),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes/contents/notes/a%23b%3F.md",
        content_item("notes/a#b?.md", "right file\n"),
    )
    .await;

    let content = client_for(&server)
        .fetch_file(REPO, "main", "notes/a#b?.md")
        .await
        .unwrap();
    assert_eq!(content, "right file\n");
}

#[tokio::test]
async fn test_validate_repo_access() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/repos/octo/notes",
        json!({ "full_name": REPO, "size": 3 }),
    )
    .await;

    let client = client_for(&server);
    client.validate_repo_access(REPO).await.unwrap();

    let err = client.validate_repo_access("octo/private").await.unwrap_err();
    assert!(matches!(err, Error::Github(GithubError::RepoNotFound(r)) if r == "octo/private"));
}

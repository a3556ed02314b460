//! Workspace Sync - GitHub synchronization and diffs for editor workspaces
//!
//! Run with `workspace-sync --help` for usage.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use workspace_sync::{
    APP_NAME, VERSION,
    config::{Config, CredentialStore},
    diff::{self, DiffFormatter, HtmlFormatter, PlainFormatter, RenderResult},
    error::GithubError,
    github::{CreateBranchRequest, GithubClient, PushRequest, RepositoryHost},
    workspace::Workspace,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Synchronize editor workspace files with GitHub and render line diffs")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitHub personal access token (falls back to GITHUB_TOKEN, then the saved token)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the token and show the user it belongs to
    Auth,

    /// Manage the saved token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// List repositories visible to the token
    Repos {
        #[arg(long)]
        json: bool,
    },

    /// List branches of a repository
    Branches {
        /// Repository as owner/name
        repo: String,
        #[arg(long)]
        json: bool,
    },

    /// Create a branch from an existing one
    CreateBranch {
        repo: String,
        /// New branch name (sanitized before creation)
        name: String,
        /// Source branch (default: configured default branch)
        #[arg(long)]
        from: Option<String>,
    },

    /// Show protection rules of a branch
    Protection {
        repo: String,
        branch: String,
        #[arg(long)]
        json: bool,
    },

    /// List the files of a branch with their content
    Files {
        repo: String,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Push workspace files as one commit
    Push {
        repo: String,
        /// Workspace-relative paths (default: every workspace file)
        files: Vec<String>,
        #[arg(short, long)]
        message: String,
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Diff two local files (left = base, right = revised)
    Diff {
        left: PathBuf,
        right: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },

    /// Diff a workspace file against its version in the repository
    RemoteDiff {
        repo: String,
        path: String,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },

    /// Inspect the local workspace
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Validate a token and save it
    Save { token: String },
    /// Show the saved token (masked)
    Show,
    /// Forget the saved token
    Clear,
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// List workspace files
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print a workspace file
    Read { path: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Plain,
    Html,
    Json,
}

fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        // Use info level for our crate, warn for dependencies
        EnvFilter::new("info")
            .add_directive("reqwest=warn".parse()?)
            .add_directive("hyper=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        // Keep stdout clean for command output
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Token from the flag, then the environment, then the credential store
fn resolve_token(flag: Option<String>) -> Result<String> {
    if let Some(token) = flag.filter(|t| !t.trim().is_empty()) {
        return Ok(token);
    }
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.trim().is_empty() {
            return Ok(token);
        }
    }
    let token = CredentialStore::default_location()?
        .load()?
        .ok_or(GithubError::MissingToken)?;
    Ok(token)
}

fn connect(config: &Config, token: Option<String>) -> Result<GithubClient> {
    let token = resolve_token(token)?;
    Ok(GithubClient::new(config, &token)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_render(result: &RenderResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            print!("{}", PlainFormatter.format(result));
            println!("{}", result.summary());
        }
        OutputFormat::Html => println!("{}", HtmlFormatter.format(result)),
        OutputFormat::Json => print_json(result)?,
    }
    Ok(())
}

fn read_or_empty(path: &Path) -> Result<String> {
    if !path.exists() {
        warn!("{:?} does not exist, diffing as empty", path);
        return Ok(String::new());
    }
    Ok(std::fs::read_to_string(path)?)
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}{}", visible, "*".repeat(token.chars().count().saturating_sub(4)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(cli.debug || config.debug, config.log_file.as_deref())?;
    info!("{} v{}", APP_NAME, VERSION);

    let branch_or_default = |branch: Option<String>| {
        branch.unwrap_or_else(|| config.default_branch.clone())
    };

    match cli.command {
        Commands::Auth => {
            let client = connect(&config, cli.token)?;
            let login = client.authenticate().await?;
            println!("Authenticated as {}", login);
        }

        Commands::Token { action } => {
            let store = CredentialStore::default_location()?;
            match action {
                TokenAction::Save { token } => {
                    // Only persist tokens GitHub accepts
                    let client = GithubClient::new(&config, &token)?;
                    let login = client.authenticate().await?;
                    if let Err(e) = config.ensure_directories() {
                        eprintln!("Warning: Failed to create directories: {}", e);
                    }
                    store.save(token.trim())?;
                    println!("Token for {} saved to {:?}", login, store.path());
                }
                TokenAction::Show => match store.load()? {
                    Some(token) => println!("{}", mask(&token)),
                    None => println!("No saved token"),
                },
                TokenAction::Clear => {
                    if store.clear()? {
                        println!("Saved token removed");
                    } else {
                        println!("No saved token");
                    }
                }
            }
        }

        Commands::Repos { json } => {
            let client = connect(&config, cli.token)?;
            let repos = client.list_repositories().await?;
            if json {
                print_json(&repos)?;
            } else {
                for repo in repos {
                    match repo.description {
                        Some(description) => println!("{}  {}", repo.name, description),
                        None => println!("{}", repo.name),
                    }
                }
            }
        }

        Commands::Branches { repo, json } => {
            let client = connect(&config, cli.token)?;
            let branches = client.list_branches(&repo).await?;
            if json {
                print_json(&branches)?;
            } else {
                for branch in branches {
                    let default = if branch.default { "*" } else { " " };
                    let protected = if branch.protected { " (protected)" } else { "" };
                    println!("{} {}{}", default, branch.name, protected);
                }
            }
        }

        Commands::CreateBranch { repo, name, from } => {
            let client = connect(&config, cli.token)?;
            let request = CreateBranchRequest {
                repo_name: repo,
                branch_name: name,
                from_branch: branch_or_default(from),
            };
            let outcome = client.create_branch(&request).await?;
            println!("{}", outcome.message());
        }

        Commands::Protection { repo, branch, json } => {
            let client = connect(&config, cli.token)?;
            let protection = client.branch_protection(&repo, &branch).await?;
            if json {
                print_json(&protection)?;
            } else if !protection.protected {
                println!("{} is not protected", branch);
            } else {
                println!("{} is protected", branch);
                println!("  Required reviews: {}", protection.required_reviews);
                println!("  Dismiss stale reviews: {}", protection.dismiss_stale_reviews);
                println!(
                    "  Require code owner reviews: {}",
                    protection.require_code_owner_reviews
                );
                if !protection.required_status_checks.is_empty() {
                    println!(
                        "  Required status checks: {}",
                        protection.required_status_checks.join(", ")
                    );
                }
            }
        }

        Commands::Files { repo, branch, json } => {
            let client = connect(&config, cli.token)?;
            let files = client.list_repo_files(&repo, &branch_or_default(branch)).await?;
            if json {
                print_json(&files)?;
            } else {
                for file in &files {
                    let modified = file
                        .last_modified
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_default();
                    println!("{:<60} {:>8} {}", file.path, file.content.len(), modified);
                }
                println!("{} file(s)", files.len());
            }
        }

        Commands::Push {
            repo,
            files,
            message,
            branch,
        } => {
            let client = connect(&config, cli.token)?;
            let workspace = Workspace::from_config(&config)?;
            let files = if files.is_empty() {
                workspace
                    .list_files()?
                    .into_iter()
                    .map(|f| f.path)
                    .collect()
            } else {
                files
            };
            let request = PushRequest {
                repo_name: repo,
                files,
                commit_message: message,
                branch: branch_or_default(branch),
            };
            let summary = client.push(&request, &workspace).await?;
            println!("{}", summary.message());
        }

        Commands::Diff {
            left,
            right,
            format,
        } => {
            let left_text = read_or_empty(&left)?;
            let right_text = read_or_empty(&right)?;
            let result =
                diff::render_with(&config.edit_script_source(), &left_text, &right_text);
            print_render(&result, format)?;
        }

        Commands::RemoteDiff {
            repo,
            path,
            branch,
            format,
        } => {
            let client = connect(&config, cli.token)?;
            let workspace = Workspace::from_config(&config)?;
            let host: &dyn RepositoryHost = &client;
            let result = diff::diff_with_remote(
                host,
                &workspace,
                &config.edit_script_source(),
                &repo,
                &branch_or_default(branch),
                &path,
            )
            .await?;
            print_render(&result, format)?;
        }

        Commands::Workspace { action } => {
            let workspace = Workspace::from_config(&config)?;
            match action {
                WorkspaceAction::List { json } => {
                    let files = workspace.list_files()?;
                    if json {
                        print_json(&files)?;
                    } else {
                        for file in files {
                            println!("{}  {}", file.last_modified.to_rfc3339(), file.path);
                        }
                    }
                }
                WorkspaceAction::Read { path } => {
                    let file = workspace.read_file(&path)?;
                    print!("{}", file.content);
                }
            }
        }

        Commands::Config { init } => {
            let config_path = match cli.config {
                Some(path) => path,
                None => Config::config_file_path()?,
            };
            if init {
                config.save_to(&config_path)?;
                println!("Configuration initialized at {:?}", config_path);
            } else {
                println!("Configuration:");
                println!("{}", toml::to_string_pretty(&config)?);
                println!("\nConfig file: {:?}", config_path);
                println!("Data dir: {:?}", Config::data_dir()?);
                println!("Credentials file: {:?}", Config::credentials_file_path()?);
            }
        }
    }

    Ok(())
}

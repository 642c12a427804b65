//! review-flow - drive a feature branch through code review
//!
//! CLI binary for filing, updating, merging and closing reviews.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use review_flow::config::Config;
use review_flow::workflow::{InitiateRequest, MergeRequest, UpdateRequest};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;

#[derive(Parser)]
#[command(name = "review-flow")]
#[command(about = "Drive a git feature branch through code review")]
#[command(version)]
struct Cli {
    /// Path inside the git checkout (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Never open a browser; read the tracker token from the credential store
    #[arg(long, global = true)]
    no_browser: bool,

    /// Tracker base URL
    #[arg(long, global = true, env = "REVIEW_FLOW_TRACKER_URL")]
    tracker_url: Option<String>,

    /// Show every step and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReviewerArgs {
    /// Primary reviewer email
    #[arg(long)]
    reviewer: Option<String>,

    /// Reviewers on cc (comma separated)
    #[arg(long, value_delimiter = ',')]
    cc: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum Commands {
    /// File a review for the active branch
    Create {
        /// Issue subject (default: first line of the last commit message)
        #[arg(long)]
        subject: Option<String>,

        /// Issue description (default: the last commit message)
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        reviewers: ReviewerArgs,

        /// Do not open a pull request on the hosting platform
        #[arg(long)]
        no_pull_request: bool,
    },

    /// Rebase the active branch onto upstream and refresh its review
    Update {
        /// New issue subject
        #[arg(long)]
        subject: Option<String>,

        #[command(flatten)]
        reviewers: ReviewerArgs,
    },

    /// Land an approved review on the default branch
    Merge {
        /// Branch to merge (default: active branch)
        branch: Option<String>,

        /// Fork to pull the branch from (default: the contributor's fork, else origin URL)
        #[arg(long, conflicts_with = "fork_owner")]
        fork_url: Option<String>,

        /// Hosting login of the contributor whose fork holds the branch
        #[arg(long)]
        fork_owner: Option<String>,
    },

    /// Abandon a review
    Close {
        /// Branch to close (default: active branch)
        branch: Option<String>,

        /// Discard uncommitted changes (asks for confirmation)
        #[arg(long)]
        discard: bool,
    },

    /// Show the state of a review
    Status {
        /// Branch to inspect (default: active branch)
        branch: Option<String>,
    },

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Test authentication
    Test,
    /// Show authentication setup instructions
    Setup,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Config::load_with_overrides(cli.no_browser, cli.tracker_url.clone())?;
    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Test => cli::run_auth_test(&config).await?,
            AuthAction::Setup => cli::run_auth_setup(),
        },
        Commands::Create {
            subject,
            description,
            reviewers,
            no_pull_request,
        } => {
            let open_pull_request = config.hosting.pull_requests && !no_pull_request;
            let ctx = cli::ReviewContext::open(&path, config, open_pull_request).await?;
            let request = InitiateRequest {
                subject,
                description,
                reviewer: reviewers.reviewer,
                cc: reviewers.cc,
                open_pull_request,
            };
            cli::run_create(&ctx, request, cli.verbose).await?;
        }
        Commands::Update { subject, reviewers } => {
            let ctx = cli::ReviewContext::open(&path, config, false).await?;
            let request = UpdateRequest {
                subject,
                description: None,
                reviewer: reviewers.reviewer,
                cc: reviewers.cc,
            };
            cli::run_update(&ctx, request, cli.verbose).await?;
        }
        Commands::Merge {
            branch,
            fork_url,
            fork_owner,
        } => {
            let ctx = cli::ReviewContext::open(&path, config, fork_url.is_none()).await?;
            let request = MergeRequest {
                branch,
                fork_url,
                fork_owner,
            };
            cli::run_merge(&ctx, request, cli.verbose).await?;
        }
        Commands::Close { branch, discard } => {
            let ctx = cli::ReviewContext::open(&path, config, false).await?;
            cli::run_close(&ctx, branch, discard, cli.verbose).await?;
        }
        Commands::Status { branch } => {
            let ctx = cli::ReviewContext::open(&path, config, false).await?;
            cli::run_status(&ctx, branch, cli.verbose).await?;
        }
    }

    Ok(())
}

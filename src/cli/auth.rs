//! Auth command - test and explain credential setup

use anstream::println;
use crate::cli::style::{check, Stylize};
use review_flow::auth::{NetrcFile, get_github_auth, test_github_auth};
use review_flow::config::Config;
use review_flow::error::Result;
use review_flow::tracker::{StoredTokenSource, TOKEN_ENV_VAR, TokenSource};

/// Run the auth test command
pub async fn run_auth_test(config: &Config) -> Result<()> {
    println!("Testing GitHub authentication...");
    let auth = get_github_auth(&NetrcFile::load()).await?;
    let username = test_github_auth(&auth).await?;
    println!("{} Authenticated as: {}", check(), username.accent());
    println!("  Token source: {:?}", auth.source);

    match config.tracker.url.as_deref() {
        Some(url) => println!("Tracker: {}", url.accent()),
        None => println!("Tracker: {}", "not configured".warn().for_stdout()),
    }

    if config.tracker.no_browser {
        let source = StoredTokenSource::new(config.tracker.token_file.clone());
        match source.acquire() {
            Ok(_) => println!("{} Stored tracker token found", check()),
            Err(e) => println!("{}", e.to_string().warn().for_stdout()),
        }
    }
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("GitHub Authentication Setup");
    println!("===========================");
    println!();
    println!("Option 1: ~/.netrc");
    println!("  machine github.com login <username> password <token>");
    println!();
    println!("Option 2: GitHub CLI");
    println!("  Install: https://cli.github.com/");
    println!("  Run: gh auth login");
    println!();
    println!("Option 3: Environment variable");
    println!("  Set GITHUB_TOKEN or GH_TOKEN");
    println!();
    println!("Review Tracker");
    println!("==============");
    println!();
    println!("Set tracker.url in {}", config_path_hint());
    println!("or REVIEW_FLOW_TRACKER_URL.");
    println!();
    println!("Interactive mode opens the tracker's token page in a browser.");
    println!("With --no-browser, the token is read from {TOKEN_ENV_VAR}");
    println!("or from {}.", token_path_hint());
}

fn config_path_hint() -> String {
    Config::default_config_path()
        .map_or_else(|| "the config file".to_string(), |p| p.display().to_string())
}

fn token_path_hint() -> String {
    StoredTokenSource::default_token_path()
        .map_or_else(|| "the token file".to_string(), |p| p.display().to_string())
}

//! GitHub authentication

use crate::auth::AuthSource;
use crate::auth::netrc::NetrcFile;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// GitHub username, when the source knows it
    pub username: Option<String>,
    /// Where the token was obtained from
    pub source: AuthSource,
}

/// Get GitHub authentication
///
/// Priority:
/// 1. `~/.netrc` entry for `github.com`
/// 2. gh CLI (`gh auth token`)
/// 3. `GITHUB_TOKEN` environment variable
/// 4. `GH_TOKEN` environment variable
pub async fn get_github_auth(netrc: &NetrcFile) -> Result<GitHubAuthConfig> {
    let username = netrc.github_username().map(str::to_string);

    if let Some(token) = netrc.github_access_token() {
        debug!("Using GitHub token from netrc");
        return Ok(GitHubAuthConfig {
            token: token.to_string(),
            username,
            source: AuthSource::Netrc,
        });
    }

    if let Some(token) = get_gh_cli_token().await {
        return Ok(GitHubAuthConfig {
            token,
            username,
            source: AuthSource::Cli,
        });
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = env::var(var) {
            if !token.trim().is_empty() {
                return Ok(GitHubAuthConfig {
                    token: token.trim().to_string(),
                    username,
                    source: AuthSource::EnvVar,
                });
            }
        }
    }

    Err(Error::Auth(
        "No GitHub authentication found. Add github.com to ~/.netrc, run `gh auth login` or set GITHUB_TOKEN"
            .to_string(),
    ))
}

async fn get_gh_cli_token() -> Option<String> {
    let status = Command::new("gh")
        .args(["auth", "status"])
        .output()
        .await
        .ok()?;

    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() { None } else { Some(token) }
}

/// Test GitHub authentication, returning the authenticated login
pub async fn test_github_auth(config: &GitHubAuthConfig) -> Result<String> {
    let octocrab = octocrab::Octocrab::builder()
        .personal_token(config.token.clone())
        .build()
        .map_err(|e| Error::Auth(e.to_string()))?;

    let user = octocrab
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("Invalid token: {e}")))?;

    Ok(user.login)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_netrc_token_wins() {
        let netrc = NetrcFile::parse("machine github.com login octodev password ghp_abc\n");
        let auth = get_github_auth(&netrc).await.unwrap();
        assert_eq!(auth.token, "ghp_abc");
        assert_eq!(auth.username.as_deref(), Some("octodev"));
        assert_eq!(auth.source, AuthSource::Netrc);
    }
}

//! Remote URL parsing and project identity matching

use crate::error::{Error, Result};
use crate::types::RepoLocation;
use regex::Regex;
use std::sync::OnceLock;

fn ssh_scp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // git@host:owner/repo.git
    RE.get_or_init(|| {
        Regex::new(r"^[^@/]+@([^:/]+):/?(.+?)(?:\.git)?/?$").expect("hardcoded regex is valid")
    })
}

/// Parse repository location (host/owner/repo) from a remote URL
///
/// Accepted forms:
/// - `https://host/owner/repo(.git)`
/// - `ssh://git@host(:port)/owner/repo(.git)`
/// - `git@host:owner/repo(.git)`
pub fn parse_remote_url(url: &str) -> Result<RepoLocation> {
    let url = url.trim();

    let (host, path) = if let Some(c) = ssh_scp_re().captures(url) {
        (c[1].to_string(), c[2].to_string())
    } else {
        let parsed =
            url::Url::parse(url).map_err(|e| Error::Parse(format!("cannot parse remote URL {url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Parse(format!("remote URL has no host: {url}")))?
            .to_string();
        let path = parsed.path().trim_matches('/').to_string();
        let path = path.strip_suffix(".git").unwrap_or(&path).to_string();
        (host, path)
    };

    // GitLab-style nested groups end up in owner
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let Some((repo, owner_parts)) = parts.split_last() else {
        return Err(Error::Parse(format!("invalid repo path in {url}")));
    };
    if owner_parts.is_empty() {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    }

    Ok(RepoLocation {
        host,
        owner: owner_parts.join("/"),
        repo: (*repo).to_string(),
    })
}

/// Whether `url` points at `repo`, optionally owned by `owner`
///
/// Comparison is case-insensitive and ignores the URL scheme, so an ssh and
/// an https remote for the same project both match.
pub fn url_matches_project(url: &str, owner: Option<&str>, repo: &str) -> bool {
    let Ok(location) = parse_remote_url(url) else {
        return false;
    };

    location.repo.eq_ignore_ascii_case(repo)
        && owner.is_none_or(|o| location.owner.eq_ignore_ascii_case(o))
}

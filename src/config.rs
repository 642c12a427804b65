//! Configuration management
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`REVIEW_FLOW_*`)
//! 3. Config file (`~/.config/review-flow/config.toml`)
//! 4. Default values

use crate::error::{Error, Result};
use crate::state::DEFAULT_STATE_DIR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Review tracker settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the tracker, e.g. `https://codereview.example.org`
    pub url: Option<String>,
    /// Never open a browser; read the token from the credential store
    pub no_browser: bool,
    /// File holding a pre-provisioned tracker token
    pub token_file: Option<PathBuf>,
}

/// Repository layout settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Primary integration branch
    pub default_branch: String,
    /// Remote name of the fork
    pub origin: String,
    /// Remote name of the canonical project
    pub upstream: String,
    /// State directory, relative to the repository root
    pub state_dir: String,
    /// Project name; derived from the checkout directory when unset
    pub project: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: "master".to_string(),
            origin: "origin".to_string(),
            upstream: "upstream".to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            project: None,
        }
    }
}

/// Hosting platform settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostingConfig {
    /// Hostname of the hosting platform
    pub host: String,
    /// Owner of the canonical project; derived from the upstream URL when unset
    pub upstream_owner: Option<String>,
    /// Open a pull request when a review is created
    pub pull_requests: bool,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            upstream_owner: None,
            pull_requests: true,
        }
    }
}

/// Reviewers for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectReviewers {
    /// Preferred reviewers, in order of preference
    pub reviewers: Vec<String>,
    /// Development mailing list, always put on cc
    pub mailing_list: Option<String>,
}

/// Reviewer selection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewersConfig {
    /// Fallback reviewers for projects without their own list
    pub default: Vec<String>,
    /// Mailing list put on cc for every project
    pub mailing_list: Option<String>,
    /// Per-project overrides
    pub projects: BTreeMap<String, ProjectReviewers>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Tracker configuration
    pub tracker: TrackerConfig,
    /// Repository configuration
    pub repository: RepositoryConfig,
    /// Hosting configuration
    pub hosting: HostingConfig,
    /// Reviewer configuration
    pub reviewers: ReviewersConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/review-flow/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("review-flow").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - `REVIEW_FLOW_TRACKER_URL`: tracker base URL
    /// - `REVIEW_FLOW_NO_BROWSER`: `1`/`true` for non-interactive auth
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("REVIEW_FLOW_TRACKER_URL") {
            self.tracker.url = Some(url);
        }

        if let Ok(value) = std::env::var("REVIEW_FLOW_NO_BROWSER") {
            self.tracker.no_browser = matches!(value.trim(), "1" | "true" | "yes");
        }

        self
    }

    /// Apply CLI flag overrides
    #[must_use]
    pub fn with_cli_overrides(mut self, no_browser: bool, tracker_url: Option<String>) -> Self {
        if no_browser {
            self.tracker.no_browser = true;
        }

        if let Some(url) = tracker_url {
            self.tracker.url = Some(url);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(no_browser: bool, tracker_url: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(no_browser, tracker_url))
    }

    /// Tracker URL, or a configuration error naming how to set it
    pub fn tracker_url(&self) -> Result<&str> {
        self.tracker.url.as_deref().ok_or_else(|| {
            Error::Config(
                "no tracker URL configured; set tracker.url or REVIEW_FLOW_TRACKER_URL"
                    .to_string(),
            )
        })
    }
}

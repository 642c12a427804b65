//! Tracker access-token acquisition
//!
//! Two strategies sit behind [`TokenSource`]: read a pre-provisioned token
//! ([`StoredTokenSource`]), or send the user to the tracker's token page and
//! have them paste the result ([`BrowserTokenSource`]). Which one is used is
//! configuration, see [`token_source_for`].

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Environment variable holding a tracker token
pub const TOKEN_ENV_VAR: &str = "REVIEW_FLOW_TRACKER_TOKEN";

/// Where the tracker token came from
pub trait TokenSource: Send + Sync {
    /// Obtain a token; may block on user interaction
    fn acquire(&self) -> Result<String>;

    /// Short description for messages
    fn describe(&self) -> String;
}

/// A token known up front
#[derive(Debug, Clone)]
pub struct StaticTokenSource(pub String);

impl TokenSource for StaticTokenSource {
    fn acquire(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static token".to_string()
    }
}

/// Reads the token from [`TOKEN_ENV_VAR`], then from a token file
#[derive(Debug, Clone)]
pub struct StoredTokenSource {
    file: Option<PathBuf>,
}

impl StoredTokenSource {
    /// Read from `file`, or from the default token file when `None`
    pub fn new(file: Option<PathBuf>) -> Self {
        Self {
            file: file.or_else(Self::default_token_path),
        }
    }

    /// `~/.config/review-flow/tracker-token` on Unix
    pub fn default_token_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("review-flow").join("tracker-token"))
    }
}

impl TokenSource for StoredTokenSource {
    fn acquire(&self) -> Result<String> {
        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using tracker token from {TOKEN_ENV_VAR}");
                return Ok(token);
            }
        }

        if let Some(path) = &self.file {
            match std::fs::read_to_string(path) {
                Ok(contents) if !contents.trim().is_empty() => {
                    debug!("Using tracker token from {}", path.display());
                    return Ok(contents.trim().to_string());
                }
                Ok(_) => debug!("Token file {} is empty", path.display()),
                Err(e) => debug!("Cannot read token file {}: {e}", path.display()),
            }
        }

        Err(Error::Auth(format!(
            "no stored tracker token; set {TOKEN_ENV_VAR} or write one to {}",
            self.file
                .as_ref()
                .map_or_else(|| "the token file".to_string(), |p| p.display().to_string())
        )))
    }

    fn describe(&self) -> String {
        "stored credential".to_string()
    }
}

/// Opens the tracker's token page in a browser and prompts for the token
#[derive(Debug, Clone)]
pub struct BrowserTokenSource {
    token_page: String,
}

impl BrowserTokenSource {
    /// Token page under the tracker at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            token_page: format!(
                "{}/get-access-token?redirect_uri={}",
                base_url.trim_end_matches('/'),
                urlencoding::encode("urn:ietf:wg:oauth:2.0:oob")
            ),
        }
    }

    /// URL the browser is sent to
    pub fn token_page(&self) -> &str {
        &self.token_page
    }
}

impl TokenSource for BrowserTokenSource {
    fn acquire(&self) -> Result<String> {
        eprintln!("Opening {} to obtain an access token", self.token_page);
        if let Err(e) = open::that(&self.token_page) {
            warn!("Could not open a browser: {e}");
            eprintln!("Open the URL above manually.");
        }

        let token: String = dialoguer::Password::new()
            .with_prompt("Access token")
            .interact()
            .map_err(|e| Error::Auth(format!("no token entered: {e}")))?;

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(Error::Auth("empty access token".to_string()));
        }
        Ok(token)
    }

    fn describe(&self) -> String {
        "browser".to_string()
    }
}

/// Pick the token strategy the configuration asks for
pub fn token_source_for(config: &TrackerConfig, base_url: &str) -> Box<dyn TokenSource> {
    if config.no_browser {
        Box::new(StoredTokenSource::new(config.token_file.clone()))
    } else {
        Box::new(BrowserTokenSource::new(base_url))
    }
}

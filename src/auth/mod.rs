//! Authentication for the hosting platform
//!
//! Tokens come from `~/.netrc`, the gh CLI or environment variables.

mod github;
pub mod netrc;

pub use github::{GitHubAuthConfig, get_github_auth, test_github_auth};
pub use netrc::NetrcFile;

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from `~/.netrc`
    Netrc,
    /// Token from the gh CLI
    Cli,
    /// Token from environment variable
    EnvVar,
}

//! Hosting platform service
//!
//! The platform hosting the canonical project and the contributor forks.
//! Used for user lookups, fork URLs and the optional pull request opened
//! alongside a review.

mod github;

pub use github::GitHubHosting;

use crate::error::Result;
use crate::types::{PullRequest, UserProfile};
use async_trait::async_trait;

/// Hosting platform operations
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Look up a user; `None` when no such user exists
    async fn query_user(&self, username: &str) -> Result<Option<UserProfile>>;

    /// Open a pull request from `head_owner:branch` into `base` of the
    /// canonical project
    async fn create_pull_request(
        &self,
        head_owner: &str,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// Clone URL of `username`'s fork of the canonical project
    fn fork_url(&self, username: &str) -> String;
}

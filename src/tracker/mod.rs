//! Review tracker abstraction
//!
//! The tracker holds review issues: one per change under review, carrying
//! the subject, the reviewers, an approval flag and the open/closed status.

pub mod http;
pub mod reviewers;
pub mod token;

pub use http::HttpReviewTracker;
pub use reviewers::ReviewerPolicy;
pub use token::{
    BrowserTokenSource, StaticTokenSource, StoredTokenSource, TOKEN_ENV_VAR, TokenSource,
    token_source_for,
};

use crate::error::Result;
use crate::types::{IssueUpdate, NewIssue, ReviewIssue};
use async_trait::async_trait;

/// Operations against the review tracker
#[async_trait]
pub trait ReviewTracker: Send + Sync {
    /// Create an issue and return its positive id
    async fn create_issue(&self, issue: &NewIssue) -> Result<u64>;

    /// Fetch an issue; `None` when it does not exist
    async fn query_issue(&self, issue_id: u64) -> Result<Option<ReviewIssue>>;

    /// Apply the fields set in `update`
    async fn update_issue(&self, issue_id: u64, update: &IssueUpdate) -> Result<()>;

    /// Close an issue; closing a closed issue succeeds
    async fn close_issue(&self, issue_id: u64, message: &str) -> Result<()>;

    /// Record the merge commit on the issue
    async fn add_merge_message(&self, issue_id: u64, commit: &str) -> Result<()>;

    /// Browser URL of an issue
    fn issue_url(&self, issue_id: u64) -> String;
}

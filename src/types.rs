//! Core types for review-flow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A local git branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Whether this branch is checked out
    pub is_active: bool,
}

/// A git remote as listed by `git remote -v`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
    /// Whether this is the fetch or push entry
    pub direction: RemoteDirection,
}

/// Direction of a `git remote -v` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteDirection {
    /// `(fetch)`
    Fetch,
    /// `(push)`
    Push,
}

/// Which of the two workflow remotes is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// The contributor's fork, push target for review branches
    Origin,
    /// The canonical project, eventual merge destination
    Upstream,
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Upstream => write!(f, "upstream"),
        }
    }
}

/// Owner/repository pair parsed out of a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    /// Hostname (e.g. "github.com")
    pub host: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name without `.git`
    pub repo: String,
}

/// Open/closed state of a review issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Under review
    Open,
    /// Closed, either merged or abandoned
    Closed,
}

/// Projection of a review issue held by the external tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewIssue {
    /// Tracker-assigned identifier, immutable once set
    pub id: u64,
    /// One-line subject
    pub subject: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Email of the change author
    #[serde(default)]
    pub owner_email: String,
    /// Hosting login of the change author, when the tracker knows it
    #[serde(default)]
    pub owner_login: Option<String>,
    /// Primary reviewer
    #[serde(default)]
    pub reviewer: Option<String>,
    /// Reviewers on cc; never contains the author or the primary reviewer
    #[serde(default)]
    pub cc: Vec<String>,
    /// Open or closed
    pub status: IssueStatus,
    /// Whether a reviewer has approved the change
    #[serde(default)]
    pub approved: bool,
    /// Last modification time
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl ReviewIssue {
    /// Whether the issue is closed
    pub fn is_closed(&self) -> bool {
        self.status == IssueStatus::Closed
    }
}

/// Fields for a new review issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// One-line subject
    pub subject: String,
    /// Longer description
    pub description: String,
    /// Primary reviewer
    pub reviewer: String,
    /// Reviewers on cc
    pub cc: Vec<String>,
    /// Commit the issue was filed against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// Partial update of a review issue; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    /// New subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New primary reviewer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    /// New cc list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<String>>,
    /// New patch reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl IssueUpdate {
    /// Whether no field would change
    pub const fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.description.is_none()
            && self.reviewer.is_none()
            && self.cc.is_none()
            && self.commit.is_none()
    }
}

/// A hosting-platform pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// A hosting-platform user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Login name
    pub login: String,
    /// Display name
    pub name: Option<String>,
    /// Public email
    pub email: Option<String>,
}

/// Where a branch/review pair stands, reconstructed on every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Review filed; no upstream to compare against
    Created,
    /// Review open but the branch is behind upstream or differs from origin
    PendingSync,
    /// Review open, branch matches origin and contains upstream
    Synced,
    /// Review closed and the branch is contained in the default branch
    Merged,
    /// Review closed without the branch landing
    Closed,
    /// Local record points at an issue the tracker does not know
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::PendingSync => "pending sync",
            Self::Synced => "synced",
            Self::Merged => "merged",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

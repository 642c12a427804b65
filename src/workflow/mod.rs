//! Review workflow engine
//!
//! Drives a feature branch through its review lifecycle:
//! 1. Initiate - push the branch, file the review issue, record the link
//! 2. Update - rebase onto upstream, force-push, refresh the issue
//! 3. Merge - land the approved change on the default branch and clean up
//! 4. Close - abandon the review and clean up
//!
//! Each phase is a sequence of [`Step`]s. The first failing step halts the
//! phase and is named in the returned error; completed steps are not
//! rolled back.

mod orchestrator;
mod progress;

pub use orchestrator::{
    CloseOutcome, CloseRequest, InitiateOutcome, InitiateRequest, MergeOutcome, MergeRequest,
    StatusReport, UpdateOutcome, UpdateRequest, WorkflowOrchestrator,
};
pub use progress::{NoopProgress, ProgressCallback, StepStatus};

use std::fmt;

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// File a new review
    Initiate,
    /// Refresh an open review
    Update,
    /// Land an approved review
    Merge,
    /// Abandon a review
    Close,
    /// Inspect a review
    Status,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initiate => "create",
            Self::Update => "update",
            Self::Merge => "merge",
            Self::Close => "close",
            Self::Status => "status",
        };
        write!(f, "{s}")
    }
}

/// A single externally visible step of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Push the feature branch to origin
    Push,
    /// Create the tracker issue
    CreateIssue,
    /// Write the branch-to-issue record
    PersistRecord,
    /// Open a hosting pull request
    CreatePullRequest,
    /// Look up the tracker issue
    QueryIssue,
    /// Fetch upstream and rebase onto it
    SyncUpstream,
    /// Force-push the rebased branch
    ForcePush,
    /// Update the tracker issue
    UpdateIssue,
    /// Reset the working tree
    DropChanges,
    /// Check out the default branch
    SwitchToDefault,
    /// Merge the feature branch from the fork
    PullFromFork,
    /// Commit in the name of the change author
    Commit,
    /// Push the default branch to origin
    PushMerge,
    /// Note the merge commit on the issue
    AddMergeMessage,
    /// Close the tracker issue
    CloseIssue,
    /// Delete the local feature branch
    RemoveBranch,
    /// Delete the branch-to-issue record
    RemoveRecord,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Push => "push to origin",
            Self::CreateIssue => "create issue",
            Self::PersistRecord => "persist review record",
            Self::CreatePullRequest => "create pull request",
            Self::QueryIssue => "query issue",
            Self::SyncUpstream => "synchronize with upstream",
            Self::ForcePush => "force-push to origin",
            Self::UpdateIssue => "update issue",
            Self::DropChanges => "drop uncommitted changes",
            Self::SwitchToDefault => "switch to default branch",
            Self::PullFromFork => "pull from fork",
            Self::Commit => "commit",
            Self::PushMerge => "push merge to origin",
            Self::AddMergeMessage => "add merge message",
            Self::CloseIssue => "close issue",
            Self::RemoveBranch => "remove feature branch",
            Self::RemoveRecord => "remove review record",
        };
        write!(f, "{s}")
    }
}

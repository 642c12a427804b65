//! Phase sequencing over git, the tracker and the local record store

use crate::config::ReviewersConfig;
use crate::error::{Error, Result};
use crate::hosting::HostingService;
use crate::state::ReviewStateStore;
use crate::tracker::{ReviewTracker, ReviewerPolicy};
use crate::types::{IssueUpdate, NewIssue, PullRequest, RemoteKind, ReviewIssue, WorkflowState};
use crate::vcs::GitCoordinator;
use crate::workflow::{NoopProgress, Phase, ProgressCallback, Step, StepStatus};
use tracing::{debug, info};

/// Options for [`WorkflowOrchestrator::initiate`]
#[derive(Debug, Clone, Default)]
pub struct InitiateRequest {
    /// Issue subject; first line of the last commit message when unset
    pub subject: Option<String>,
    /// Issue description; the last commit message when unset
    pub description: Option<String>,
    /// Primary reviewer; chosen from configuration when unset
    pub reviewer: Option<String>,
    /// Reviewers on cc; computed from configuration when unset
    pub cc: Option<Vec<String>>,
    /// Open a hosting pull request once the review is filed
    pub open_pull_request: bool,
}

/// Result of a successful initiate
#[derive(Debug, Clone)]
pub struct InitiateOutcome {
    /// Reviewed branch
    pub branch: String,
    /// New tracker issue
    pub issue_id: u64,
    /// Browser URL of the issue
    pub issue_url: String,
    /// Primary reviewer
    pub reviewer: String,
    /// Reviewers on cc
    pub cc: Vec<String>,
    /// Pull request, if one was opened
    pub pull_request: Option<PullRequest>,
    /// Non-fatal failures
    pub warnings: Vec<String>,
}

/// Options for [`WorkflowOrchestrator::update`]
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// New issue subject
    pub subject: Option<String>,
    /// New issue description
    pub description: Option<String>,
    /// New primary reviewer
    pub reviewer: Option<String>,
    /// New cc list
    pub cc: Option<Vec<String>>,
}

/// Result of a successful update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Reviewed branch
    pub branch: String,
    /// Tracker issue
    pub issue_id: u64,
    /// Commit now under review
    pub commit: String,
}

/// Options for [`WorkflowOrchestrator::merge`]
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    /// Branch to land; the active branch when unset
    pub branch: Option<String>,
    /// Fork to pull the branch from
    ///
    /// When unset, the fork of `fork_owner` (or of the issue owner) on the
    /// hosting platform, then the origin URL.
    pub fork_url: Option<String>,
    /// Hosting login of the contributor whose fork holds the branch
    pub fork_owner: Option<String>,
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Landed branch, now deleted
    pub branch: String,
    /// Closed tracker issue
    pub issue_id: u64,
    /// Merge commit on the default branch
    pub commit: String,
}

/// Options for [`WorkflowOrchestrator::close`]
#[derive(Debug, Clone, Default)]
pub struct CloseRequest {
    /// Branch to abandon; the active branch when unset
    pub branch: Option<String>,
    /// Discard uncommitted changes first; the caller has confirmed this
    pub discard_changes: bool,
}

/// Result of a successful close
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    /// Abandoned branch, now deleted
    pub branch: String,
    /// Closed tracker issue
    pub issue_id: u64,
}

/// Reconstructed state of one branch/review pair
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Inspected branch
    pub branch: String,
    /// Issue from the local record
    pub issue_id: Option<u64>,
    /// Issue as the tracker reports it
    pub issue: Option<ReviewIssue>,
    /// Browser URL of the issue
    pub issue_url: Option<String>,
    /// `None` when the branch has no review
    pub state: Option<WorkflowState>,
}

/// Drives one branch through the review phases
///
/// Holds no state of its own between calls; everything is re-read from git,
/// the tracker and the record store on each phase. Callers must not run two
/// phases against the same checkout concurrently.
pub struct WorkflowOrchestrator<'a> {
    git: &'a GitCoordinator,
    tracker: &'a dyn ReviewTracker,
    store: &'a ReviewStateStore,
    reviewers: &'a ReviewersConfig,
    hosting: Option<&'a dyn HostingService>,
    progress: &'a dyn ProgressCallback,
}

impl<'a> WorkflowOrchestrator<'a> {
    /// Create an orchestrator without hosting access or progress output
    pub fn new(
        git: &'a GitCoordinator,
        tracker: &'a dyn ReviewTracker,
        store: &'a ReviewStateStore,
        reviewers: &'a ReviewersConfig,
    ) -> Self {
        Self {
            git,
            tracker,
            store,
            reviewers,
            hosting: None,
            progress: &NoopProgress,
        }
    }

    /// Use `hosting` for user checks and pull requests
    #[must_use]
    pub fn with_hosting(mut self, hosting: &'a dyn HostingService) -> Self {
        self.hosting = Some(hosting);
        self
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    fn project(&self) -> &str {
        &self.git.layout().project
    }

    async fn start(&self, step: Step) {
        self.progress.on_step(step, StepStatus::Started).await;
    }

    /// Report the outcome of `step` and tag a failure with it
    async fn finish<T>(&self, step: Step, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.progress.on_step(step, StepStatus::Success).await;
                Ok(value)
            }
            Err(e) => {
                self.progress
                    .on_step(step, StepStatus::Failed(e.to_string()))
                    .await;
                Err(e.at_step(step))
            }
        }
    }

    fn branch_or_active(&self, branch: Option<String>) -> Result<String> {
        branch.map_or_else(|| self.git.active_branch(), Ok)
    }

    fn require_record(&self, branch: &str) -> Result<u64> {
        self.store.issue_id(branch)?.ok_or_else(|| {
            Error::Precondition(format!("no review recorded for branch {branch}"))
        })
    }

    /// Query the issue a record points at; a missing issue is inconsistent
    async fn require_issue(&self, issue_id: u64) -> Result<ReviewIssue> {
        self.start(Step::QueryIssue).await;
        let issue = self
            .finish(Step::QueryIssue, self.tracker.query_issue(issue_id).await)
            .await?;

        issue.ok_or_else(|| {
            Error::StateConsistency(format!(
                "local record points at issue {issue_id}, which the tracker does not know"
            ))
        })
    }

    // ------------------------------------------------------------------
    // Initiate
    // ------------------------------------------------------------------

    /// File a review for the active branch
    ///
    /// Preconditions: no record for the branch, the branch is not the
    /// default branch, no uncommitted changes, origin is configured.
    /// Steps: push → create issue → persist record → optional pull request.
    pub async fn initiate(&self, request: InitiateRequest) -> Result<InitiateOutcome> {
        self.progress.on_phase(Phase::Initiate).await;

        let branch = self.git.active_branch()?;

        if let Some(existing) = self.store.issue_id(&branch)? {
            return Err(Error::StateConsistency(format!(
                "branch {branch} already has review issue {existing}"
            )));
        }
        if branch == self.git.default_branch() {
            return Err(Error::Precondition(format!(
                "cannot file a review from the default branch {branch}"
            )));
        }
        if self.git.has_uncommitted_changes()? {
            return Err(Error::Precondition(
                "uncommitted changes; commit them first".to_string(),
            ));
        }
        if !self.git.has_remote(RemoteKind::Origin) {
            return Err(Error::Precondition(format!(
                "no origin remote for {} configured",
                self.project()
            )));
        }
        self.check_fork_owner().await?;

        let author = self.git.email_address()?;
        let policy = ReviewerPolicy::new(self.reviewers.clone(), author);
        let reviewer = match request.reviewer {
            Some(r) => {
                policy.check_reviewer(&r)?;
                r
            }
            None => policy.get_reviewer(self.project())?,
        };
        let cc = match request.cc {
            Some(cc) => policy.sanitize_cc(cc, Some(&reviewer)),
            None => policy.get_reviewers_on_cc(self.project(), &reviewer),
        };

        let message = self.git.last_commit_message()?;
        let subject = request
            .subject
            .unwrap_or_else(|| message.lines().next().unwrap_or_default().to_string());
        if subject.trim().is_empty() {
            return Err(Error::Precondition("empty review subject".to_string()));
        }
        let description = request.description.unwrap_or(message);

        self.start(Step::Push).await;
        self.finish(Step::Push, self.git.push_to_origin(&branch, false))
            .await?;

        let new_issue = NewIssue {
            subject: subject.clone(),
            description: description.clone(),
            reviewer: reviewer.clone(),
            cc: cc.clone(),
            commit: self.git.head_commit().ok(),
        };
        self.start(Step::CreateIssue).await;
        let issue_id = self
            .finish(Step::CreateIssue, self.tracker.create_issue(&new_issue).await)
            .await?;
        let issue_url = self.tracker.issue_url(issue_id);

        self.start(Step::PersistRecord).await;
        self.finish(Step::PersistRecord, self.store.create(&branch, issue_id))
            .await?;
        info!("Filed review {issue_id} for {branch}");

        let mut warnings = Vec::new();
        let pull_request = if request.open_pull_request {
            self.open_pull_request(&branch, &subject, &description, &issue_url, &mut warnings)
                .await
        } else {
            None
        };

        Ok(InitiateOutcome {
            branch,
            issue_id,
            issue_url,
            reviewer,
            cc,
            pull_request,
            warnings,
        })
    }

    /// The fork owner, when known, must be a real hosting user
    async fn check_fork_owner(&self) -> Result<()> {
        let (Some(hosting), Some(owner)) = (self.hosting, &self.git.layout().fork_owner) else {
            return Ok(());
        };

        if hosting.query_user(owner).await?.is_none() {
            return Err(Error::Precondition(format!(
                "hosting user {owner} does not exist"
            )));
        }
        Ok(())
    }

    /// URL to pull a reviewed branch from
    async fn merge_source(
        &self,
        fork_url: Option<String>,
        fork_owner: Option<String>,
    ) -> Result<String> {
        if let Some(url) = fork_url {
            return Ok(url);
        }
        if let (Some(hosting), Some(owner)) = (self.hosting, fork_owner.as_deref()) {
            if hosting.query_user(owner).await?.is_none() {
                return Err(Error::Precondition(format!(
                    "hosting user {owner} does not exist"
                )));
            }
            let url = hosting.fork_url(owner);
            debug!("Pulling from {owner}'s fork {url}");
            return Ok(url);
        }
        self.git
            .remote_origin()
            .ok_or_else(|| Error::Precondition("no fork URL and no origin remote".to_string()))
    }

    async fn open_pull_request(
        &self,
        branch: &str,
        subject: &str,
        description: &str,
        issue_url: &str,
        warnings: &mut Vec<String>,
    ) -> Option<PullRequest> {
        let (Some(hosting), Some(owner)) = (self.hosting, &self.git.layout().fork_owner) else {
            self.progress
                .on_step(Step::CreatePullRequest, StepStatus::Skipped)
                .await;
            return None;
        };

        let body = format!("{description}\n\nCode review: {issue_url}");
        self.start(Step::CreatePullRequest).await;
        let created = hosting
            .create_pull_request(owner, branch, self.git.default_branch(), subject, &body)
            .await;

        match self.finish(Step::CreatePullRequest, created).await {
            Ok(pr) => Some(pr),
            Err(e) => {
                self.progress.on_warning(&e).await;
                warnings.push(e.to_string());
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Rebase the active branch onto upstream and refresh its review
    ///
    /// Steps: synchronize with upstream → force-push → update issue. A
    /// failed rebase stops before anything is pushed.
    pub async fn update(&self, request: UpdateRequest) -> Result<UpdateOutcome> {
        self.progress.on_phase(Phase::Update).await;

        let branch = self.git.active_branch()?;
        if branch == self.git.default_branch() {
            return Err(Error::Precondition(format!(
                "{branch} is the default branch, not a review branch"
            )));
        }
        let issue_id = self.require_record(&branch)?;
        let issue = self.require_issue(issue_id).await?;
        if issue.is_closed() {
            return Err(Error::StateConsistency(format!(
                "review issue {issue_id} is already closed"
            )));
        }
        if self.git.has_uncommitted_changes()? {
            return Err(Error::Precondition(
                "uncommitted changes; commit them first".to_string(),
            ));
        }

        let author = if issue.owner_email.is_empty() {
            self.git.email_address()?
        } else {
            issue.owner_email.clone()
        };
        let policy = ReviewerPolicy::new(self.reviewers.clone(), author);
        if let Some(reviewer) = &request.reviewer {
            policy.check_reviewer(reviewer)?;
        }
        let primary = request.reviewer.as_deref().or(issue.reviewer.as_deref());
        let cc = request.cc.map(|cc| policy.sanitize_cc(cc, primary));

        self.start(Step::SyncUpstream).await;
        self.finish(Step::SyncUpstream, self.git.synchronize_with_upstream())
            .await?;

        self.start(Step::ForcePush).await;
        self.finish(Step::ForcePush, self.git.push_to_origin(&branch, true))
            .await?;

        let commit = self.git.head_commit()?;
        let update = IssueUpdate {
            subject: request.subject,
            description: request.description,
            reviewer: request.reviewer,
            cc,
            commit: Some(commit.clone()),
        };
        self.start(Step::UpdateIssue).await;
        self.finish(
            Step::UpdateIssue,
            self.tracker.update_issue(issue_id, &update).await,
        )
        .await?;

        info!("Updated review {issue_id} to {commit}");
        Ok(UpdateOutcome {
            branch,
            issue_id,
            commit,
        })
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Land an approved review on the default branch
    ///
    /// Steps: switch to default → synchronize with upstream → pull from
    /// fork → commit in the author's name → push → add merge message →
    /// close issue → remove branch → remove record.
    pub async fn merge(&self, request: MergeRequest) -> Result<MergeOutcome> {
        self.progress.on_phase(Phase::Merge).await;

        let branch = self.branch_or_active(request.branch)?;
        let default_branch = self.git.default_branch().to_string();
        if branch == default_branch {
            return Err(Error::Precondition(format!(
                "{branch} is the default branch, not a review branch"
            )));
        }
        let issue_id = self.require_record(&branch)?;
        let issue = self.require_issue(issue_id).await?;
        if issue.is_closed() {
            return Err(Error::StateConsistency(format!(
                "review issue {issue_id} is already closed"
            )));
        }
        if !issue.approved {
            return Err(Error::Precondition(format!(
                "review issue {issue_id} has not been approved"
            )));
        }
        let fork_owner = request.fork_owner.or_else(|| issue.owner_login.clone());
        let fork_url = self.merge_source(request.fork_url, fork_owner).await?;
        let author = if issue.owner_email.is_empty() {
            self.git.email_address()?
        } else {
            issue.owner_email.clone()
        };
        let issue_url = self.tracker.issue_url(issue_id);

        self.start(Step::SwitchToDefault).await;
        self.finish(Step::SwitchToDefault, self.git.switch_to_master())
            .await?;

        self.start(Step::SyncUpstream).await;
        self.finish(Step::SyncUpstream, self.git.synchronize_with_upstream())
            .await?;

        self.start(Step::PullFromFork).await;
        self.finish(Step::PullFromFork, self.git.pull_from_fork(&fork_url, &branch))
            .await?;

        let message = format!("{}\n\nCode review: {issue_url}", issue.subject);
        self.start(Step::Commit).await;
        self.finish(Step::Commit, self.git.commit_in_name_of(&author, &message))
            .await?;
        let commit = self.git.head_commit()?;

        self.start(Step::PushMerge).await;
        self.finish(
            Step::PushMerge,
            self.git.push_to_origin(&default_branch, false),
        )
        .await?;

        self.start(Step::AddMergeMessage).await;
        self.finish(
            Step::AddMergeMessage,
            self.tracker.add_merge_message(issue_id, &commit).await,
        )
        .await?;

        self.start(Step::CloseIssue).await;
        self.finish(
            Step::CloseIssue,
            self.tracker
                .close_issue(issue_id, &format!("Code merged in commit {commit}"))
                .await,
        )
        .await?;

        self.start(Step::RemoveBranch).await;
        self.finish(Step::RemoveBranch, self.git.remove_feature_branch(&branch))
            .await?;

        self.start(Step::RemoveRecord).await;
        self.finish(Step::RemoveRecord, self.store.remove(&branch))
            .await?;

        info!("Merged {branch} as {commit}");
        Ok(MergeOutcome {
            branch,
            issue_id,
            commit,
        })
    }

    // ------------------------------------------------------------------
    // Close
    // ------------------------------------------------------------------

    /// Abandon a review without merging
    ///
    /// Steps: drop changes (when requested) → close issue → switch to
    /// default (when on the branch) → remove branch → remove record.
    pub async fn close(&self, request: CloseRequest) -> Result<CloseOutcome> {
        self.progress.on_phase(Phase::Close).await;

        let branch = self.branch_or_active(request.branch)?;
        if branch == self.git.default_branch() {
            return Err(Error::Precondition(format!(
                "{branch} is the default branch, not a review branch"
            )));
        }
        let issue_id = self.require_record(&branch)?;
        self.require_issue(issue_id).await?;
        let on_branch = self.git.active_branch().is_ok_and(|active| active == branch);
        if on_branch && !request.discard_changes && self.git.has_uncommitted_changes()? {
            return Err(Error::Precondition(
                "uncommitted changes on the review branch; commit them or discard them"
                    .to_string(),
            ));
        }

        if request.discard_changes {
            self.start(Step::DropChanges).await;
            self.finish(Step::DropChanges, self.git.drop_uncommitted_changes())
                .await?;
        }

        self.start(Step::CloseIssue).await;
        self.finish(
            Step::CloseIssue,
            self.tracker.close_issue(issue_id, "Review abandoned").await,
        )
        .await?;

        if on_branch {
            self.start(Step::SwitchToDefault).await;
            self.finish(Step::SwitchToDefault, self.git.switch_to_master())
                .await?;
        } else {
            self.progress
                .on_step(Step::SwitchToDefault, StepStatus::Skipped)
                .await;
        }

        if self.git.has_branch(&branch) {
            self.start(Step::RemoveBranch).await;
            self.finish(Step::RemoveBranch, self.git.remove_feature_branch(&branch))
                .await?;
        } else {
            self.progress
                .on_step(Step::RemoveBranch, StepStatus::Skipped)
                .await;
        }

        self.start(Step::RemoveRecord).await;
        self.finish(Step::RemoveRecord, self.store.remove(&branch))
            .await?;

        info!("Closed review {issue_id} for {branch}");
        Ok(CloseOutcome { branch, issue_id })
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Reconstruct where `branch` (default: the active branch) stands
    pub async fn status(&self, branch: Option<String>) -> Result<StatusReport> {
        self.progress.on_phase(Phase::Status).await;

        let branch = self.branch_or_active(branch)?;
        let Some(issue_id) = self.store.issue_id(&branch)? else {
            return Ok(StatusReport {
                branch,
                issue_id: None,
                issue: None,
                issue_url: None,
                state: None,
            });
        };

        let issue = self.tracker.query_issue(issue_id).await?;
        let state = match &issue {
            None => WorkflowState::Failed,
            Some(issue) if issue.is_closed() => self.closed_state(&branch),
            Some(_) => self.open_state(&branch),
        };
        debug!("{branch}: issue {issue_id} is {state}");

        Ok(StatusReport {
            branch,
            issue_id: Some(issue_id),
            issue,
            issue_url: Some(self.tracker.issue_url(issue_id)),
            state: Some(state),
        })
    }

    fn closed_state(&self, branch: &str) -> WorkflowState {
        let landed = !self.git.has_branch(branch)
            || self.git.is_ancestor(branch, self.git.default_branch());
        if landed {
            WorkflowState::Merged
        } else {
            WorkflowState::Closed
        }
    }

    fn open_state(&self, branch: &str) -> WorkflowState {
        let layout = self.git.layout();
        let upstream_ref = format!("{}/{}", layout.upstream_remote, layout.default_branch);
        let Some(upstream) = self.git.resolve(&upstream_ref) else {
            return WorkflowState::Created;
        };

        let pushed = self.git.resolve(&format!("{}/{branch}", layout.origin_remote));
        let local = self.git.resolve(branch);
        let in_sync = pushed.is_some() && pushed == local;

        if in_sync && self.git.is_ancestor(&upstream, branch) {
            WorkflowState::Synced
        } else {
            WorkflowState::PendingSync
        }
    }
}

//! Mock review tracker and hosting service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use review_flow::error::{Error, Result};
use review_flow::hosting::HostingService;
use review_flow::tracker::ReviewTracker;
use review_flow::types::{IssueStatus, IssueUpdate, NewIssue, PullRequest, ReviewIssue, UserProfile};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Author recorded on issues the mock creates
pub const OWNER_EMAIL: &str = "author@example.com";

/// Error to return from an injected failure
#[derive(Debug, Clone)]
pub enum Injected {
    /// Transport failure
    Unavailable(String),
    /// Structured refusal
    Rejected(String),
}

impl Injected {
    fn to_error(&self) -> Error {
        match self {
            Self::Unavailable(msg) => Error::TrackerUnavailable(msg.clone()),
            Self::Rejected(msg) => Error::TrackerRejected(msg.clone()),
        }
    }
}

/// In-memory tracker
///
/// Features:
/// - Auto-incrementing issue ids
/// - Call tracking for verification
/// - Error injection per operation
pub struct MockReviewTracker {
    next_id: AtomicU64,
    issues: Mutex<HashMap<u64, ReviewIssue>>,
    // Call tracking
    create_calls: Mutex<Vec<NewIssue>>,
    query_calls: Mutex<Vec<u64>>,
    update_calls: Mutex<Vec<(u64, IssueUpdate)>>,
    close_calls: Mutex<Vec<(u64, String)>>,
    merge_messages: Mutex<Vec<(u64, String)>>,
    // Error injection
    error_on_create: Mutex<Option<Injected>>,
    error_on_update: Mutex<Option<Injected>>,
    error_on_close: Mutex<Option<Injected>>,
}

impl Default for MockReviewTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReviewTracker {
    /// Empty tracker; the first issue gets id 1000
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            issues: Mutex::new(HashMap::new()),
            create_calls: Mutex::new(Vec::new()),
            query_calls: Mutex::new(Vec::new()),
            update_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            merge_messages: Mutex::new(Vec::new()),
            error_on_create: Mutex::new(None),
            error_on_update: Mutex::new(None),
            error_on_close: Mutex::new(None),
        }
    }

    // === Setup ===

    /// Add an open issue with `id`
    pub fn insert_open(&self, id: u64, subject: &str) {
        self.issues.lock().unwrap().insert(
            id,
            ReviewIssue {
                id,
                subject: subject.to_string(),
                description: String::new(),
                owner_email: OWNER_EMAIL.to_string(),
                owner_login: None,
                reviewer: Some("reviewer@example.com".to_string()),
                cc: vec![],
                status: IssueStatus::Open,
                approved: false,
                modified: None,
            },
        );
    }

    /// Mark an issue approved
    pub fn approve(&self, id: u64) {
        if let Some(issue) = self.issues.lock().unwrap().get_mut(&id) {
            issue.approved = true;
        }
    }

    /// Record the hosting login of an issue's author
    pub fn set_owner_login(&self, id: u64, login: &str) {
        if let Some(issue) = self.issues.lock().unwrap().get_mut(&id) {
            issue.owner_login = Some(login.to_string());
        }
    }

    /// Mark an issue closed
    pub fn set_closed(&self, id: u64) {
        if let Some(issue) = self.issues.lock().unwrap().get_mut(&id) {
            issue.status = IssueStatus::Closed;
        }
    }

    /// Forget an issue
    pub fn remove(&self, id: u64) {
        self.issues.lock().unwrap().remove(&id);
    }

    /// Current copy of an issue
    pub fn issue(&self, id: u64) -> Option<ReviewIssue> {
        self.issues.lock().unwrap().get(&id).cloned()
    }

    // === Error injection ===

    /// Make `create_issue` fail
    pub fn fail_create(&self, error: Injected) {
        *self.error_on_create.lock().unwrap() = Some(error);
    }

    /// Make `update_issue` fail
    pub fn fail_update(&self, error: Injected) {
        *self.error_on_update.lock().unwrap() = Some(error);
    }

    /// Make `close_issue` fail
    pub fn fail_close(&self, error: Injected) {
        *self.error_on_close.lock().unwrap() = Some(error);
    }

    // === Call verification ===

    /// Every `create_issue` argument
    pub fn create_calls(&self) -> Vec<NewIssue> {
        self.create_calls.lock().unwrap().clone()
    }

    /// Every `query_issue` argument
    pub fn query_calls(&self) -> Vec<u64> {
        self.query_calls.lock().unwrap().clone()
    }

    /// Every `update_issue` call
    pub fn update_calls(&self) -> Vec<(u64, IssueUpdate)> {
        self.update_calls.lock().unwrap().clone()
    }

    /// Every `close_issue` call
    pub fn close_calls(&self) -> Vec<(u64, String)> {
        self.close_calls.lock().unwrap().clone()
    }

    /// Every `add_merge_message` call
    pub fn merge_messages(&self) -> Vec<(u64, String)> {
        self.merge_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewTracker for MockReviewTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<u64> {
        self.create_calls.lock().unwrap().push(issue.clone());
        if let Some(err) = self.error_on_create.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.issues.lock().unwrap().insert(
            id,
            ReviewIssue {
                id,
                subject: issue.subject.clone(),
                description: issue.description.clone(),
                owner_email: OWNER_EMAIL.to_string(),
                owner_login: None,
                reviewer: Some(issue.reviewer.clone()),
                cc: issue.cc.clone(),
                status: IssueStatus::Open,
                approved: false,
                modified: None,
            },
        );
        Ok(id)
    }

    async fn query_issue(&self, issue_id: u64) -> Result<Option<ReviewIssue>> {
        self.query_calls.lock().unwrap().push(issue_id);
        Ok(self.issue(issue_id))
    }

    async fn update_issue(&self, issue_id: u64, update: &IssueUpdate) -> Result<()> {
        self.update_calls
            .lock()
            .unwrap()
            .push((issue_id, update.clone()));
        if let Some(err) = self.error_on_update.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }

        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .get_mut(&issue_id)
            .ok_or_else(|| Error::TrackerRejected(format!("no issue {issue_id}")))?;
        if let Some(subject) = &update.subject {
            issue.subject.clone_from(subject);
        }
        if let Some(reviewer) = &update.reviewer {
            issue.reviewer = Some(reviewer.clone());
        }
        if let Some(cc) = &update.cc {
            issue.cc.clone_from(cc);
        }
        Ok(())
    }

    async fn close_issue(&self, issue_id: u64, message: &str) -> Result<()> {
        self.close_calls
            .lock()
            .unwrap()
            .push((issue_id, message.to_string()));
        if let Some(err) = self.error_on_close.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }

        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .get_mut(&issue_id)
            .ok_or_else(|| Error::TrackerRejected(format!("no issue {issue_id}")))?;
        issue.status = IssueStatus::Closed;
        Ok(())
    }

    async fn add_merge_message(&self, issue_id: u64, commit: &str) -> Result<()> {
        self.merge_messages
            .lock()
            .unwrap()
            .push((issue_id, commit.to_string()));
        Ok(())
    }

    fn issue_url(&self, issue_id: u64) -> String {
        format!("https://review.example.org/{issue_id}")
    }
}

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head_owner: String,
    pub branch: String,
    pub base: String,
    pub title: String,
}

/// Mock hosting service with known users and PR tracking
pub struct MockHosting {
    users: Mutex<HashSet<String>>,
    next_pr_number: AtomicU64,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    error_on_create_pr: Mutex<Option<String>>,
}

impl MockHosting {
    /// Hosting that knows `users`
    pub fn with_users(users: &[&str]) -> Self {
        Self {
            users: Mutex::new(users.iter().map(ToString::to_string).collect()),
            next_pr_number: AtomicU64::new(1),
            create_pr_calls: Mutex::new(Vec::new()),
            error_on_create_pr: Mutex::new(None),
        }
    }

    /// Make `create_pull_request` fail
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Every `create_pull_request` call
    pub fn create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostingService for MockHosting {
    async fn query_user(&self, username: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .contains(username)
            .then(|| UserProfile {
                login: username.to_string(),
                name: None,
                email: None,
            }))
    }

    async fn create_pull_request(
        &self,
        head_owner: &str,
        branch: &str,
        base: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head_owner: head_owner.to_string(),
            branch: branch.to_string(),
            base: base.to_string(),
            title: title.to_string(),
        });
        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::TrackerRejected(msg.clone()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/log2timeline/l2tdevtools/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: branch.to_string(),
            title: title.to_string(),
        })
    }

    fn fork_url(&self, username: &str) -> String {
        format!("https://github.com/{username}/l2tdevtools.git")
    }
}

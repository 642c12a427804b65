//! Review tracker over JSON/HTTP
//!
//! Endpoints, relative to the tracker base URL:
//!
//! | Operation      | Request                          |
//! |----------------|----------------------------------|
//! | create         | `POST /api/issues`               |
//! | query          | `GET /api/issues/{id}`           |
//! | update         | `PATCH /api/issues/{id}`         |
//! | close          | `POST /api/issues/{id}/close`    |
//! | merge message  | `POST /api/issues/{id}/messages` |
//!
//! Mutations acquire a bearer token on first use and reuse it for the rest
//! of the session. Reads carry the token once it has been acquired and go
//! out anonymously before that.

use crate::error::{Error, Result};
use crate::tracker::ReviewTracker;
use crate::tracker::token::TokenSource;
use crate::types::{IssueUpdate, NewIssue, ReviewIssue};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct CreatedIssue {
    id: u64,
}

#[derive(Deserialize)]
struct TrackerErrorBody {
    error: String,
}

/// Tracker client using reqwest
pub struct HttpReviewTracker {
    client: Client,
    base_url: String,
    token_source: Box<dyn TokenSource>,
    token: OnceCell<String>,
}

impl HttpReviewTracker {
    /// Create a client for the tracker at `base_url`
    pub fn new(base_url: &str, token_source: Box<dyn TokenSource>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_source,
            token: OnceCell::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Session token, acquired on first call
    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                debug!("Acquiring tracker token via {}", self.token_source.describe());
                self.token_source.acquire()
            })
            .await?;
        Ok(token.as_str())
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(self.access_token().await?))
    }

    /// Attach the session token when one has already been acquired
    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Turn a non-success response into a tracker error
///
/// 4xx answers are the tracker refusing the request; everything else is
/// treated as the tracker being unavailable.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<TrackerErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    let detail = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    };

    if status.is_client_error() {
        Err(Error::TrackerRejected(detail))
    } else {
        Err(Error::TrackerUnavailable(detail))
    }
}

#[async_trait]
impl ReviewTracker for HttpReviewTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<u64> {
        let url = self.api_url("/issues");
        debug!("POST {url}");

        let request = self.authorized(self.client.post(&url)).await?;
        let response = check_status(request.json(issue).send().await?).await?;
        let created: CreatedIssue = response.json().await?;

        if created.id == 0 {
            return Err(Error::TrackerRejected(
                "tracker returned issue id 0".to_string(),
            ));
        }

        info!("Created review issue {}", created.id);
        Ok(created.id)
    }

    async fn query_issue(&self, issue_id: u64) -> Result<Option<ReviewIssue>> {
        if issue_id == 0 {
            return Ok(None);
        }

        let url = self.api_url(&format!("/issues/{issue_id}"));
        debug!("GET {url}");

        let response = self.with_session(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Issue {issue_id} not found");
            return Ok(None);
        }

        let issue = check_status(response).await?.json().await?;
        Ok(Some(issue))
    }

    async fn update_issue(&self, issue_id: u64, update: &IssueUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let url = self.api_url(&format!("/issues/{issue_id}"));
        debug!("PATCH {url}");

        let request = self.authorized(self.client.patch(&url)).await?;
        check_status(request.json(update).send().await?).await?;
        Ok(())
    }

    async fn close_issue(&self, issue_id: u64, message: &str) -> Result<()> {
        match self.query_issue(issue_id).await? {
            None => {
                return Err(Error::TrackerRejected(format!(
                    "issue {issue_id} does not exist"
                )));
            }
            Some(issue) if issue.is_closed() => {
                debug!("Issue {issue_id} already closed");
                return Ok(());
            }
            Some(_) => {}
        }

        let url = self.api_url(&format!("/issues/{issue_id}/close"));
        debug!("POST {url}");

        let request = self.authorized(self.client.post(&url)).await?;
        let response = request
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;

        // Closed by someone else since the query
        if response.status() == StatusCode::CONFLICT {
            debug!("Issue {issue_id} was closed concurrently");
            return Ok(());
        }
        check_status(response).await?;

        info!("Closed review issue {issue_id}");
        Ok(())
    }

    async fn add_merge_message(&self, issue_id: u64, commit: &str) -> Result<()> {
        let url = self.api_url(&format!("/issues/{issue_id}/messages"));
        debug!("POST {url}");

        let request = self.authorized(self.client.post(&url)).await?;
        check_status(
            request
                .json(&serde_json::json!({
                    "message": format!("Code merged in commit {commit}"),
                    "commit": commit,
                }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    fn issue_url(&self, issue_id: u64) -> String {
        format!("{}/{issue_id}", self.base_url)
    }
}

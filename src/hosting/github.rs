//! GitHub hosting service implementation

use crate::error::{Error, Result};
use crate::hosting::HostingService;
use crate::types::{PullRequest, UserProfile};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

/// GitHub service using octocrab
pub struct GitHubHosting {
    client: Octocrab,
    host: String,
    owner: String,
    repo: String,
}

impl GitHubHosting {
    /// Create a service for `owner/repo`
    ///
    /// `host` other than `github.com` is treated as GitHub Enterprise.
    pub fn new(token: &str, owner: String, repo: String, host: &str) -> Result<Self> {
        let api = if host == "github.com" {
            None
        } else {
            Some(format!("https://{host}/api/v3"))
        };
        Self::build(token, owner, repo, host, api.as_deref())
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_url(token: &str, owner: String, repo: String, api_url: &str) -> Result<Self> {
        Self::build(token, owner, repo, "github.com", Some(api_url))
    }

    fn build(
        token: &str,
        owner: String,
        repo: String,
        host: &str,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| Error::Config(format!("invalid API URL {url}: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::TrackerUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            host: host.to_string(),
            owner,
            repo,
        })
    }
}

#[async_trait]
impl HostingService for GitHubHosting {
    async fn query_user(&self, username: &str) -> Result<Option<UserProfile>> {
        debug!("Querying GitHub user {username}");

        match self.client.users(username).profile().await {
            Ok(profile) => Ok(Some(UserProfile {
                login: profile.login,
                name: profile.name,
                email: profile.email,
            })),
            Err(octocrab::Error::GitHub { source, .. }) if source.message == "Not Found" => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_pull_request(
        &self,
        head_owner: &str,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let head = format!("{head_owner}:{branch}");
        debug!("Creating pull request {head} -> {}/{base}", self.owner);

        let pr = self
            .client
            .pulls(&self.owner, &self.repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        Ok(PullRequest {
            number: pr.number,
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            base_ref: pr.base.ref_field.clone(),
            head_ref: pr.head.ref_field.clone(),
            title: pr.title.as_deref().unwrap_or_default().to_string(),
        })
    }

    fn fork_url(&self, username: &str) -> String {
        format!("https://{}/{username}/{}.git", self.host, self.repo)
    }
}

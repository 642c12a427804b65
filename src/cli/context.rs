//! Wiring of the workflow collaborators for one checkout

use review_flow::auth::{NetrcFile, get_github_auth};
use review_flow::config::Config;
use review_flow::error::{Error, Result};
use review_flow::hosting::{GitHubHosting, HostingService};
use review_flow::project::ProjectHelper;
use review_flow::state::ReviewStateStore;
use review_flow::tracker::{HttpReviewTracker, token_source_for};
use review_flow::vcs::{GitCoordinator, ProcessRunner, RepositoryLayout, parse_remote_url};
use review_flow::workflow::{ProgressCallback, WorkflowOrchestrator};
use std::path::Path;
use tracing::{debug, warn};

/// Everything a workflow phase needs, built from configuration
pub struct ReviewContext {
    pub config: Config,
    pub git: GitCoordinator,
    pub store: ReviewStateStore,
    pub tracker: HttpReviewTracker,
    pub hosting: Option<GitHubHosting>,
}

impl ReviewContext {
    /// Open the checkout containing `path`
    ///
    /// Hosting access is only set up when `with_hosting` is set; missing
    /// hosting credentials are a warning, not an error.
    pub async fn open(path: &Path, config: Config, with_hosting: bool) -> Result<Self> {
        let probe = GitCoordinator::new(
            Box::new(ProcessRunner::new(path)),
            RepositoryLayout::new(""),
        );
        let root = probe.repository_root().map_err(|_| {
            Error::Precondition(format!("{} is not inside a git repository", path.display()))
        })?;

        let repo = &config.repository;
        let project = match &repo.project {
            Some(name) => name.clone(),
            None => ProjectHelper::new(&root)
                .project_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "cannot derive a project name from {}; set repository.project",
                        root.display()
                    ))
                })?,
        };

        let netrc = NetrcFile::load();
        let upstream_owner = config.hosting.upstream_owner.clone().or_else(|| {
            probe
                .remote_url(&repo.upstream)
                .and_then(|url| parse_remote_url(&url).ok())
                .map(|loc| loc.owner)
        });

        let layout = RepositoryLayout {
            project,
            default_branch: repo.default_branch.clone(),
            origin_remote: repo.origin.clone(),
            upstream_remote: repo.upstream.clone(),
            fork_owner: netrc.github_username().map(str::to_string),
            upstream_owner,
        };
        debug!("Repository layout: {layout:?}");

        let hosting = if with_hosting {
            Self::connect_hosting(&config, &layout, &netrc).await
        } else {
            None
        };

        let tracker_url = config.tracker_url()?.to_string();
        let tracker = HttpReviewTracker::new(
            &tracker_url,
            token_source_for(&config.tracker, &tracker_url),
        );

        Ok(Self {
            store: ReviewStateStore::new(root.join(&repo.state_dir)),
            git: GitCoordinator::new(Box::new(ProcessRunner::new(&root)), layout),
            tracker,
            hosting,
            config,
        })
    }

    async fn connect_hosting(
        config: &Config,
        layout: &RepositoryLayout,
        netrc: &NetrcFile,
    ) -> Option<GitHubHosting> {
        let owner = layout.upstream_owner.clone()?;

        let auth = match get_github_auth(netrc).await {
            Ok(auth) => auth,
            Err(e) => {
                warn!("Continuing without hosting access: {e}");
                return None;
            }
        };

        match GitHubHosting::new(&auth.token, owner, layout.project.clone(), &config.hosting.host) {
            Ok(hosting) => Some(hosting),
            Err(e) => {
                warn!("Continuing without hosting access: {e}");
                None
            }
        }
    }

    /// Orchestrator over this context's collaborators
    pub fn orchestrator<'a>(&'a self, progress: &'a dyn ProgressCallback) -> WorkflowOrchestrator<'a> {
        let orchestrator =
            WorkflowOrchestrator::new(&self.git, &self.tracker, &self.store, &self.config.reviewers)
                .with_progress(progress);

        match &self.hosting {
            Some(hosting) => orchestrator.with_hosting(hosting as &dyn HostingService),
            None => orchestrator,
        }
    }
}

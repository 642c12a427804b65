//! Git coordinator
//!
//! Branch, remote, and synchronization operations against the local
//! repository, expressed as porcelain `git` commands issued through a
//! [`CommandRunner`].
//!
//! Mutating operations return `Ok(())` on success and
//! [`Error::VcsOperation`] with the failing command's output otherwise. Every
//! operation is safe to re-run after a failure.

use crate::error::{Error, Result};
use crate::types::{Branch, GitRemote, RemoteDirection, RemoteKind};
use crate::vcs::remote::url_matches_project;
use crate::vcs::runner::{CommandLine, CommandOutput, CommandRunner};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Name of the scratch remote used by [`GitCoordinator::pull_from_fork`]
pub const FORK_REMOTE: &str = "review-fork";

/// Names and identities the coordinator works against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    /// Project (repository) name, e.g. "plaso"
    pub project: String,
    /// Primary integration branch
    pub default_branch: String,
    /// Remote name of the contributor's fork
    pub origin_remote: String,
    /// Remote name of the canonical project
    pub upstream_remote: String,
    /// Owner the origin URL must belong to (the authenticated user)
    pub fork_owner: Option<String>,
    /// Owner the upstream URL must belong to
    pub upstream_owner: Option<String>,
}

impl RepositoryLayout {
    /// Layout with the conventional `master`/`origin`/`upstream` names
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            default_branch: "master".to_string(),
            origin_remote: "origin".to_string(),
            upstream_remote: "upstream".to_string(),
            fork_owner: None,
            upstream_owner: None,
        }
    }
}

/// Coordinates porcelain git operations for the review workflow
pub struct GitCoordinator {
    runner: Box<dyn CommandRunner>,
    layout: RepositoryLayout,
}

impl GitCoordinator {
    /// Create a coordinator issuing commands through `runner`
    pub fn new(runner: Box<dyn CommandRunner>, layout: RepositoryLayout) -> Self {
        Self { runner, layout }
    }

    /// The layout this coordinator was built with
    pub const fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    /// Name of the default branch
    pub fn default_branch(&self) -> &str {
        &self.layout.default_branch
    }

    fn git(&self, args: &[&str]) -> CommandOutput {
        let command = CommandLine::git(args.iter().copied());
        let output = self.runner.run(&command);
        debug!("`{command}` exited with {}", output.status);
        output
    }

    fn git_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.git(args);
        if output.success() {
            Ok(output)
        } else {
            Err(Error::VcsOperation {
                command: CommandLine::git(args.iter().copied()).to_string(),
                output: output.failure_text(),
            })
        }
    }

    /// Back out of a failed rebase or merge; the original failure is what
    /// gets reported
    fn abort(&self, args: &[&str]) {
        let output = self.git(args);
        if !output.success() {
            debug!("{}: {}", args.join(" "), output.failure_text());
        }
    }

    fn git_query(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args);
        if output.success() {
            Ok(output.stdout_str())
        } else {
            Err(Error::VcsQuery(format!(
                "`{}`: {}",
                CommandLine::git(args.iter().copied()),
                output.failure_text()
            )))
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Top-level directory of the working tree
    pub fn repository_root(&self) -> Result<PathBuf> {
        let stdout = self.git_query(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(stdout.trim()))
    }

    /// List local branches
    pub fn branches(&self) -> Result<Vec<Branch>> {
        let stdout = self.git_query(&["branch"])?;
        Ok(parse_branch_list(&stdout))
    }

    /// Name of the checked-out branch
    ///
    /// Fails with [`Error::VcsQuery`] on a detached HEAD.
    pub fn active_branch(&self) -> Result<String> {
        let stdout = self.git_query(&["branch"])?;

        for line in stdout.lines() {
            let Some(rest) = line.strip_prefix("* ") else {
                continue;
            };
            if rest.starts_with('(') {
                return Err(Error::VcsQuery(format!("no branch checked out: {rest}")));
            }
            return Ok(rest.trim().to_string());
        }

        Err(Error::VcsQuery("no branch checked out".to_string()))
    }

    /// Whether a local branch named exactly `name` exists
    ///
    /// A failing `git branch` counts as "no".
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches()
            .is_ok_and(|branches| branches.iter().any(|b| b.name == name))
    }

    /// Configured remotes, one entry per fetch/push URL
    pub fn remotes(&self) -> Result<Vec<GitRemote>> {
        let stdout = self.git_query(&["remote", "-v"])?;
        Ok(parse_remote_list(&stdout))
    }

    /// Fetch URL of the remote called `name`
    pub fn remote_url(&self, name: &str) -> Option<String> {
        self.remotes().ok()?.into_iter().find_map(|r| {
            (r.name == name && r.direction == RemoteDirection::Fetch).then_some(r.url)
        })
    }

    /// Fetch URL of the origin remote
    pub fn remote_origin(&self) -> Option<String> {
        self.remote_url(&self.layout.origin_remote)
    }

    /// Whether the origin or upstream remote is configured for this project
    ///
    /// Origin must belong to the fork owner and upstream to the upstream
    /// owner, when those are known. https and ssh URLs are both accepted.
    pub fn has_remote(&self, kind: RemoteKind) -> bool {
        let (name, owner) = match kind {
            RemoteKind::Origin => (&self.layout.origin_remote, &self.layout.fork_owner),
            RemoteKind::Upstream => (&self.layout.upstream_remote, &self.layout.upstream_owner),
        };

        self.remote_url(name)
            .is_some_and(|url| url_matches_project(&url, owner.as_deref(), &self.layout.project))
    }

    /// Whether tracked files have changes not yet committed
    ///
    /// Untracked files do not count.
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let stdout = self.git_query(&["status", "-s"])?;
        Ok(stdout
            .lines()
            .any(|line| !line.trim().is_empty() && !line.starts_with("??")))
    }

    /// Whether the active branch already contains upstream's default branch
    pub fn is_synchronized_with_upstream(&self) -> Result<bool> {
        let upstream = &self.layout.upstream_remote;
        self.git_checked(&["fetch", upstream])?;

        let range = format!("HEAD..{upstream}/{}", self.layout.default_branch);
        let stdout = self.git_query(&["log", &range, "--oneline"])?;
        Ok(stdout.trim().is_empty())
    }

    /// Configured `user.email`
    pub fn email_address(&self) -> Result<String> {
        let email = self.git_query(&["config", "user.email"])?.trim().to_string();
        if email.is_empty() {
            return Err(Error::VcsQuery("user.email is not set".to_string()));
        }
        Ok(email)
    }

    /// Full message of the last commit
    pub fn last_commit_message(&self) -> Result<String> {
        Ok(self
            .git_query(&["log", "-1", "--format=%B"])?
            .trim()
            .to_string())
    }

    /// Files changed relative to `diff_base`
    pub fn changed_files(&self, diff_base: &str) -> Result<Vec<String>> {
        Ok(self
            .git_query(&["diff", "--name-only", diff_base])?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Commit hash of HEAD
    pub fn head_commit(&self) -> Result<String> {
        self.resolve("HEAD")
            .ok_or_else(|| Error::VcsQuery("cannot resolve HEAD".to_string()))
    }

    /// Commit hash `rev` points at, if it exists
    pub fn resolve(&self, rev: &str) -> Option<String> {
        let output = self.git(&["rev-parse", "--verify", "--quiet", rev]);
        output
            .success()
            .then(|| output.stdout_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Whether `ancestor` is reachable from `descendant`
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.git(&["merge-base", "--is-ancestor", ancestor, descendant])
            .success()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Stage `path` (additions, modifications and removals)
    pub fn add_path(&self, path: &str) -> Result<()> {
        self.git_checked(&["add", "-A", path])?;
        Ok(())
    }

    /// Reset tracked files to HEAD, discarding uncommitted work
    ///
    /// Destructive. Callers confirm with the user before calling this.
    pub fn drop_uncommitted_changes(&self) -> Result<()> {
        warn!("Discarding uncommitted changes");
        self.git_checked(&["reset", "--hard", "HEAD"])?;
        Ok(())
    }

    /// Check out `name`, creating it from HEAD when `create` is set
    pub fn switch_to_branch(&self, name: &str, create: bool) -> Result<()> {
        if create {
            self.git_checked(&["checkout", "-b", name])?;
        } else {
            self.git_checked(&["checkout", name])?;
        }
        Ok(())
    }

    /// Check out the default branch
    ///
    /// Refuses when uncommitted changes would be overwritten.
    pub fn switch_to_master(&self) -> Result<()> {
        if self.has_uncommitted_changes()? {
            return Err(Error::Precondition(format!(
                "uncommitted changes would be overwritten by switching to {}",
                self.layout.default_branch
            )));
        }
        self.git_checked(&["checkout", &self.layout.default_branch])?;
        Ok(())
    }

    /// Fetch upstream and rebase the active branch onto its default branch
    ///
    /// A failed fetch stops before touching the branch. A failed rebase is
    /// aborted so the branch stays at its pre-rebase commit; conflicts are
    /// never resolved automatically.
    pub fn synchronize_with_upstream(&self) -> Result<()> {
        let upstream = &self.layout.upstream_remote;
        self.git_checked(&["fetch", upstream])?;

        let pulled = self.git_checked(&[
            "pull",
            "--no-edit",
            "--rebase",
            upstream,
            &self.layout.default_branch,
        ]);

        if let Err(e) = pulled {
            warn!("Rebase onto {upstream} failed, aborting it");
            self.abort(&["rebase", "--abort"]);
            return Err(e);
        }

        info!("Synchronized with {upstream}/{}", self.layout.default_branch);
        Ok(())
    }

    /// Fetch origin and merge the same-named branch into the active branch
    ///
    /// Catches up with a push made from another checkout.
    pub fn synchronize_with_origin(&self) -> Result<()> {
        let origin = &self.layout.origin_remote;
        let branch = self.active_branch()?;

        self.git_checked(&["fetch", origin])?;

        if let Err(e) = self.git_checked(&["pull", "--no-edit", origin, &branch]) {
            warn!("Merge from {origin}/{branch} failed, aborting it");
            self.abort(&["merge", "--abort"]);
            return Err(e);
        }

        Ok(())
    }

    /// Merge `branch` from the fork at `fork_url` into the active branch
    ///
    /// Points the scratch [`FORK_REMOTE`] at `fork_url` (adding or updating
    /// it) and merges without squashing and without committing, leaving the
    /// result staged for [`Self::commit_in_name_of`]. The scratch remote is
    /// left in place so a retry just updates it.
    pub fn pull_from_fork(&self, fork_url: &str, branch: &str) -> Result<()> {
        if self.git(&["remote", "get-url", FORK_REMOTE]).success() {
            self.git_checked(&["remote", "set-url", FORK_REMOTE, fork_url])?;
        } else {
            self.git_checked(&["remote", "add", FORK_REMOTE, fork_url])?;
        }

        self.git_checked(&["fetch", FORK_REMOTE, branch])?;

        if let Err(e) = self.git_checked(&[
            "pull",
            "--no-edit",
            "--no-commit",
            "--no-ff",
            FORK_REMOTE,
            branch,
        ]) {
            warn!("Merge of {branch} from {fork_url} failed, aborting it");
            self.abort(&["merge", "--abort"]);
            return Err(e);
        }

        Ok(())
    }

    /// Push `branch` to origin
    ///
    /// `force` rewrites the remote branch after a rebase and is refused for
    /// the default branch.
    pub fn push_to_origin(&self, branch: &str, force: bool) -> Result<()> {
        let origin = &self.layout.origin_remote;

        if force {
            if branch == self.layout.default_branch {
                return Err(Error::Precondition(format!(
                    "refusing to force-push the default branch {branch}"
                )));
            }
            self.git_checked(&["push", "--force", origin, branch])?;
        } else {
            self.git_checked(&["push", origin, branch])?;
        }

        info!("Pushed {branch} to {origin}");
        Ok(())
    }

    /// Commit all staged and tracked changes with `author` as the author
    ///
    /// The committer stays the configured user. `author` may be a bare email
    /// address or a full `Name <email>`.
    pub fn commit_in_name_of(&self, author: &str, message: &str) -> Result<()> {
        let author = if author.contains('<') {
            author.to_string()
        } else {
            format!("{author} <{author}>")
        };
        let author_arg = format!("--author={author}");

        self.git_checked(&["commit", "-a", &author_arg, "-m", message])?;
        Ok(())
    }

    /// Delete the local branch `name`
    ///
    /// Deleting the default branch is a silent no-op.
    pub fn remove_feature_branch(&self, name: &str) -> Result<()> {
        if name == self.layout.default_branch {
            debug!("Not removing default branch {name}");
            return Ok(());
        }

        self.git_checked(&["branch", "-D", name])?;
        Ok(())
    }
}

fn parse_branch_list(stdout: &str) -> Vec<Branch> {
    stdout
        .lines()
        .filter(|line| line.len() > 2)
        .filter_map(|line| {
            let (marker, name) = line.split_at(2);
            let name = name.trim();
            // "(HEAD detached at ...)" is not a branch
            if name.starts_with('(') || name.is_empty() {
                return None;
            }
            Some(Branch {
                name: name.to_string(),
                is_active: marker.starts_with('*'),
            })
        })
        .collect()
}

fn parse_remote_list(stdout: &str) -> Vec<GitRemote> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let url = parts.next()?;
            let direction = match parts.next()? {
                "(fetch)" => RemoteDirection::Fetch,
                "(push)" => RemoteDirection::Push,
                _ => return None,
            };
            Some(GitRemote {
                name: name.to_string(),
                url: url.to_string(),
                direction,
            })
        })
        .collect()
}

//! Repositories for workflow tests
//!
//! [`scripted_repo`] answers git commands from canned output; [`GitSandbox`]
//! builds real repositories with origin and upstream remotes in a temp dir.

#![allow(dead_code)]

use review_flow::vcs::{CommandOutput, GitCoordinator, ProcessRunner, RepositoryLayout, ScriptedRunner};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

pub const PROJECT: &str = "l2tdevtools";
pub const AUTHOR: &str = "test@example.com";
pub const HEAD_COMMIT: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

pub const REMOTE_DATA: &str = "origin\thttps://github.com/username/l2tdevtools.git (fetch)\n\
origin\thttps://github.com/username/l2tdevtools.git (push)\n\
upstream\thttps://github.com/log2timeline/l2tdevtools.git (fetch)\n\
upstream\thttps://github.com/log2timeline/l2tdevtools.git (push)\n";

/// Layout for the test project; `fork_owner` left unset
pub fn layout() -> RepositoryLayout {
    RepositoryLayout::new(PROJECT)
}

/// Scripted checkout with `active` checked out and every mutation succeeding
pub fn scripted_repo(active: &str) -> Arc<ScriptedRunner> {
    let runner = Arc::new(ScriptedRunner::new());
    let branches = if active == "master" {
        "  feature\n* master\n".to_string()
    } else {
        format!("* {active}\n  master\n")
    };

    runner
        .on("git branch", CommandOutput::ok_with(branches))
        .on("git remote -v", CommandOutput::ok_with(REMOTE_DATA))
        .on("git status -s", CommandOutput::ok())
        .on("git config user.email", CommandOutput::ok_with(format!("{AUTHOR}\n")))
        .on(
            "git log -1 --format=%B",
            CommandOutput::ok_with("Added parser\n\nParses the new format.\n"),
        )
        .on(
            "git rev-parse --verify --quiet HEAD",
            CommandOutput::ok_with(format!("{HEAD_COMMIT}\n")),
        )
        .on_prefix("git add ", CommandOutput::ok())
        .on_prefix("git branch -D ", CommandOutput::ok())
        .on_prefix("git checkout ", CommandOutput::ok())
        .on_prefix("git commit ", CommandOutput::ok())
        .on_prefix("git fetch ", CommandOutput::ok())
        .on_prefix("git pull ", CommandOutput::ok())
        .on_prefix("git push ", CommandOutput::ok())
        .on_prefix("git remote ", CommandOutput::ok())
        .on_prefix("git reset ", CommandOutput::ok());
    runner
}

/// Coordinator over a shared scripted runner
pub fn coordinator(runner: &Arc<ScriptedRunner>) -> GitCoordinator {
    GitCoordinator::new(Box::new(Arc::clone(runner)), layout())
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working checkout plus bare origin and upstream repositories
pub struct GitSandbox {
    _temp: TempDir,
    pub work: PathBuf,
    pub origin: PathBuf,
    pub upstream: PathBuf,
}

impl GitSandbox {
    /// Checkout on `master` with one commit, pushed to both remotes
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join(PROJECT);
        let origin = temp.path().join("origin.git");
        let upstream = temp.path().join("upstream.git");

        for bare in [&origin, &upstream] {
            std::fs::create_dir_all(bare).unwrap();
            git(bare, &["init", "--bare", "-q"]);
            git(bare, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        }

        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "-q"]);
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git(&work, &["config", "user.email", AUTHOR]);
        git(&work, &["config", "user.name", "Test Author"]);
        git(&work, &["config", "commit.gpgsign", "false"]);
        git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
        git(&work, &["remote", "add", "upstream", upstream.to_str().unwrap()]);

        let sandbox = Self {
            _temp: temp,
            work,
            origin,
            upstream,
        };
        sandbox.commit_file("README", "base\n", "Initial commit");
        git(&sandbox.work, &["push", "-q", "origin", "master"]);
        git(&sandbox.work, &["push", "-q", "upstream", "master"]);
        sandbox
    }

    /// Write `path` and commit it on the active branch
    pub fn commit_file(&self, path: &str, contents: &str, message: &str) -> String {
        std::fs::write(self.work.join(path), contents).unwrap();
        git(&self.work, &["add", path]);
        git(&self.work, &["commit", "-q", "-m", message]);
        self.head()
    }

    /// Commit hash of HEAD in the working checkout
    pub fn head(&self) -> String {
        git(&self.work, &["rev-parse", "HEAD"])
    }

    /// Put a commit on upstream's master without changing the local master
    pub fn advance_upstream(&self, path: &str, contents: &str, message: &str) {
        let active = git(&self.work, &["rev-parse", "--abbrev-ref", "HEAD"]);
        git(&self.work, &["checkout", "-q", "master"]);
        self.commit_file(path, contents, message);
        git(&self.work, &["push", "-q", "upstream", "master"]);
        git(&self.work, &["reset", "-q", "--hard", "HEAD~1"]);
        git(&self.work, &["checkout", "-q", &active]);
    }

    /// Coordinator running real git in the working checkout
    pub fn coordinator(&self) -> GitCoordinator {
        GitCoordinator::new(Box::new(ProcessRunner::new(&self.work)), layout())
    }

    /// Commit `branch` points at in the origin repository, if any
    pub fn origin_ref(&self, branch: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .current_dir(&self.origin)
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

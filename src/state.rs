//! Per-branch review records
//!
//! One file per branch with an active review under a hidden directory in the
//! repository root. The file holds the tracker issue identifier as decimal
//! text. This is the only local state; workflow state is otherwise rebuilt
//! from git and the tracker on every run.

use crate::error::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the state directory
pub const DEFAULT_STATE_DIR: &str = ".review";

/// Branch to issue-identifier records on disk
#[derive(Debug, Clone)]
pub struct ReviewStateStore {
    dir: PathBuf,
}

impl ReviewStateStore {
    /// Store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store at `<repo_root>/.review`
    pub fn in_repository(repo_root: &Path) -> Self {
        Self::new(repo_root.join(DEFAULT_STATE_DIR))
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `branch`
    ///
    /// Slashes in branch names map to nested directories.
    pub fn record_path(&self, branch: &str) -> PathBuf {
        self.dir.join(branch)
    }

    /// Record that `branch` is reviewed in issue `issue_id`
    ///
    /// Fails with [`Error::StateConsistency`] when a record already exists;
    /// an existing link is never overwritten.
    pub fn create(&self, branch: &str, issue_id: u64) -> Result<()> {
        validate_branch_name(branch)?;
        let path = self.record_path(branch);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let existing = self
                    .issue_id(branch)
                    .ok()
                    .flatten()
                    .map_or_else(|| "unreadable".to_string(), |id| id.to_string());
                return Err(Error::StateConsistency(format!(
                    "branch {branch} already has a review record (issue {existing})"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(issue_id.to_string().as_bytes())?;
        debug!("Recorded {branch} -> issue {issue_id} in {}", path.display());
        Ok(())
    }

    /// Issue identifier recorded for `branch`, `None` when there is no record
    pub fn issue_id(&self, branch: &str) -> Result<Option<u64>> {
        validate_branch_name(branch)?;
        let path = self.record_path(branch);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        contents.trim().parse::<u64>().map(Some).map_err(|e| {
            Error::Parse(format!(
                "review record {} does not hold an issue number: {e}",
                path.display()
            ))
        })
    }

    /// Whether a record exists for `branch`
    pub fn exists(&self, branch: &str) -> bool {
        validate_branch_name(branch).is_ok() && self.record_path(branch).is_file()
    }

    /// Delete the record for `branch`; absent records are fine
    pub fn remove(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        match fs::remove_file(self.record_path(branch)) {
            Ok(()) => {
                debug!("Removed review record for {branch}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_branch_name(branch: &str) -> Result<()> {
    let bad = branch.is_empty()
        || branch.starts_with('/')
        || branch.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(Error::Precondition(format!("invalid branch name: {branch:?}")));
    }
    Ok(())
}

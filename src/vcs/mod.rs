//! Local repository access
//!
//! Porcelain git only; the object store is never touched directly.

mod git;
mod remote;
mod runner;

pub use git::{FORK_REMOTE, GitCoordinator, RepositoryLayout};
pub use remote::{parse_remote_url, url_matches_project};
pub use runner::{
    CommandLine, CommandOutput, CommandRunner, ProcessRunner, SPAWN_FAILURE_STATUS, ScriptedRunner,
};

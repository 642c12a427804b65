//! review-flow - drive a git feature branch through code review
//!
//! Coordinates the local repository, the contributor's fork (origin), the
//! canonical project (upstream), and an external review-issue tracker to
//! create, update, merge and close a review.
//!
//! Each invocation runs to completion on one task. The checkout is assumed to
//! be used by a single invocation at a time; nothing here locks it.

pub mod auth;
pub mod config;
pub mod error;
pub mod hosting;
pub mod project;
pub mod state;
pub mod tracker;
pub mod types;
pub mod vcs;
pub mod workflow;

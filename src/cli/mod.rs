//! CLI commands
//!
//! Command implementations for the `review-flow` binary.

mod auth;
mod context;
mod progress;
mod review;
pub mod style;

pub use auth::{run_auth_setup, run_auth_test};
pub use context::ReviewContext;
pub use review::{run_close, run_create, run_merge, run_status, run_update};

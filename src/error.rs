//! Error types for review-flow

use crate::workflow::Step;
use std::fmt::Write;
use thiserror::Error;

/// Result type alias for review-flow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for review-flow operations
#[derive(Error, Debug)]
pub enum Error {
    /// A workflow precondition does not hold; nothing was changed
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A git command ran and failed
    #[error("`{command}` failed: {output}")]
    VcsOperation {
        /// Command line that failed
        command: String,
        /// Captured stderr (or stdout when stderr was empty)
        output: String,
    },

    /// Repository state could not be determined
    #[error("git query failed: {0}")]
    VcsQuery(String),

    /// Transport-level failure talking to the tracker or hosting API
    #[error("review tracker unavailable: {0}")]
    TrackerUnavailable(String),

    /// The tracker or hosting API answered with a structured error
    #[error("review tracker rejected request: {0}")]
    TrackerRejected(String),

    /// Local review record and tracker disagree
    #[error("inconsistent review state: {0}")]
    StateConsistency(String),

    /// A workflow step failed after earlier steps completed
    #[error("step `{step}` failed: {source}")]
    StepFailed {
        /// The step that failed
        step: Step,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap this error as the failure of a workflow step
    #[must_use]
    pub fn at_step(self, step: Step) -> Self {
        Self::StepFailed {
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through `StepFailed`
    pub fn root(&self) -> &Self {
        match self {
            Self::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// The step that failed, if this error came out of a workflow phase
    pub const fn failed_step(&self) -> Option<Step> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::TrackerUnavailable(e.to_string())
    }
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        match e {
            octocrab::Error::GitHub { source, .. } => {
                let mut msg = source.message.clone();
                if let Some(errors) = &source.errors {
                    for detail in errors {
                        let _ = write!(msg, " ({detail})");
                    }
                }
                Self::TrackerRejected(msg)
            }
            other => Self::TrackerUnavailable(other.to_string()),
        }
    }
}

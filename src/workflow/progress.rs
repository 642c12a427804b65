//! Progress callback trait for interface-agnostic updates
//!
//! The orchestrator reports each phase and step through this trait; the
//! CLI prints them, tests record them.

use crate::error::Error;
use crate::workflow::{Phase, Step};
use async_trait::async_trait;

/// Step outcome as reported to a [`ProgressCallback`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// Step started
    Started,
    /// Step succeeded
    Success,
    /// Step was not needed
    Skipped,
    /// Step failed with error message
    Failed(String),
}

/// Progress callback trait
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase begins
    async fn on_phase(&self, phase: Phase);

    /// Called as a step starts and finishes
    async fn on_step(&self, step: Step, status: StepStatus);

    /// Called for failures that do not stop the phase
    async fn on_warning(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_step(&self, _step: Step, _status: StepStatus) {}
    async fn on_warning(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}

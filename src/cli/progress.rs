//! Shared CLI progress callback with styled output and spinners

use crate::cli::style::{check, cross, spinner_style, Stylize};
use anstream::{eprintln, println};
use async_trait::async_trait;
use indicatif::ProgressBar;
use review_flow::error::Error;
use review_flow::workflow::{Phase, ProgressCallback, Step, StepStatus};
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress callback printing one line per step
///
/// A spinner runs while a step is in flight. With `verbose` unset, skipped
/// steps are not shown.
pub struct CliProgress {
    verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create progress output
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            spinner: Mutex::new(None),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if self.verbose {
            println!("{} {}...", "Running".emphasis(), phase.accent());
        }
    }

    async fn on_step(&self, step: Step, status: StepStatus) {
        match status {
            StepStatus::Started => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(spinner_style());
                spinner.set_message(format!("{step}..."));
                spinner.enable_steady_tick(Duration::from_millis(80));
                if let Some(old) = self
                    .spinner
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .replace(spinner)
                {
                    old.finish_and_clear();
                }
            }
            StepStatus::Success => {
                if let Some(spinner) = self.take_spinner() {
                    spinner.finish_and_clear();
                }
                println!("  {} {step}", check());
            }
            StepStatus::Skipped => {
                if self.verbose {
                    println!("  {} {step} {}", "-".muted(), "(skipped)".muted());
                }
            }
            StepStatus::Failed(msg) => {
                if let Some(spinner) = self.take_spinner() {
                    spinner.finish_and_clear();
                }
                eprintln!("  {} {step}: {}", cross(), msg.error());
            }
        }
    }

    async fn on_warning(&self, error: &Error) {
        eprintln!("{}: {error}", "warning".warn());
    }

    async fn on_message(&self, message: &str) {
        println!("{}", message.muted());
    }
}

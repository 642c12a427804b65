//! Reviewer selection
//!
//! Picks a primary reviewer and the cc list for a project from configured
//! preferences. Selection is deterministic: the same author and project
//! always get the same reviewer.

use crate::config::ReviewersConfig;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};

/// Reviewer choices for one change author
#[derive(Debug, Clone)]
pub struct ReviewerPolicy {
    config: ReviewersConfig,
    author: String,
}

impl ReviewerPolicy {
    /// Policy for changes authored by `author`
    pub fn new(config: ReviewersConfig, author: impl Into<String>) -> Self {
        Self {
            config,
            author: author.into(),
        }
    }

    /// The change author's email address
    pub fn author(&self) -> &str {
        &self.author
    }

    fn is_author(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.author)
    }

    /// Preferred reviewers for `project`, falling back to the default list
    fn candidates(&self, project: &str) -> &[String] {
        match self.config.projects.get(project) {
            Some(p) if !p.reviewers.is_empty() => &p.reviewers,
            _ => &self.config.default,
        }
    }

    /// Primary reviewer for `project`, never the author
    ///
    /// The author's address seeds a stable index into the eligible
    /// candidates, spreading authors across reviewers without randomness.
    pub fn get_reviewer(&self, project: &str) -> Result<String> {
        let eligible: Vec<&String> = self
            .candidates(project)
            .iter()
            .filter(|r| !self.is_author(r))
            .collect();

        if eligible.is_empty() {
            return Err(Error::Config(format!(
                "no reviewer other than {} configured for {project}",
                self.author
            )));
        }

        let len = u64::try_from(eligible.len()).unwrap_or(u64::MAX);
        let idx = usize::try_from(stable_hash(&self.author.to_ascii_lowercase()) % len)
            .unwrap_or_default();
        Ok(eligible[idx].clone())
    }

    /// Addresses to cc for `project`
    ///
    /// Project reviewers plus the mailing lists, minus the author and
    /// `primary`. Sorted and free of case-insensitive duplicates.
    pub fn get_reviewers_on_cc(&self, project: &str, primary: &str) -> Vec<String> {
        let project_config = self.config.projects.get(project);

        let mut cc: BTreeMap<String, String> = BTreeMap::new();
        let mut add = |email: &str| {
            if self.is_author(email) || email.eq_ignore_ascii_case(primary) {
                return;
            }
            cc.entry(email.to_ascii_lowercase())
                .or_insert_with(|| email.to_string());
        };

        for reviewer in self.candidates(project) {
            add(reviewer);
        }
        if let Some(list) = &self.config.mailing_list {
            add(list);
        }
        if let Some(list) = project_config.and_then(|p| p.mailing_list.as_deref()) {
            add(list);
        }

        cc.into_values().collect()
    }

    /// Accept a user-chosen primary reviewer unless it is the author
    pub fn check_reviewer(&self, reviewer: &str) -> Result<()> {
        if self.is_author(reviewer) {
            return Err(Error::Precondition(format!(
                "{reviewer} authored the change and cannot review it"
            )));
        }
        Ok(())
    }

    /// User-supplied cc list without the author, `primary` or duplicates
    ///
    /// Keeps the order given.
    pub fn sanitize_cc(&self, cc: Vec<String>, primary: Option<&str>) -> Vec<String> {
        let mut seen = HashSet::new();
        cc.into_iter()
            .filter(|email| {
                !self.is_author(email)
                    && !primary.is_some_and(|p| email.eq_ignore_ascii_case(p))
            })
            .filter(|email| seen.insert(email.to_ascii_lowercase()))
            .collect()
    }
}

/// FNV-1a; stable across runs and platforms
fn stable_hash(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

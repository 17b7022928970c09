//! Run configuration passed explicitly from the command line into the runner.

use serde::{Deserialize, Serialize};

use crate::types::Mode;

/// How a program is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    /// Report every step to the observer, not just the final verdicts.
    pub verbose: bool,
    /// Stop every deterministic machine as soon as one accepts.
    pub first_accept: bool,
    /// Worker threads for deterministic runs. Always at least 1.
    pub jobs: usize,
    /// Reject ambiguous transitions in deterministic mode instead of following the first match.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Deterministic,
            verbose: false,
            first_accept: false,
            jobs: 1,
            strict: false,
        }
    }
}

impl Config {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sets the number of worker threads, clamped to at least 1.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_first_accept(mut self, first_accept: bool) -> Self {
        self.first_accept = first_accept;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

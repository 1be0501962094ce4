//! Failure collection and report rendering.

use indexmap::IndexSet;
use isomorph_core::Path;
use serde::{Deserialize, Serialize};

/// One concrete mismatch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Where the mismatch was found
    pub path: Path,
    /// Complete, path-qualified message
    pub message: String,
}

impl FailureRecord {
    /// Create a failure record
    #[must_use]
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Accumulates failures during one run
#[derive(Debug, Default)]
pub struct Diagnostics {
    stop_on_first_failure: bool,
    records: Vec<FailureRecord>,
}

impl Diagnostics {
    /// Create an accumulator
    #[must_use]
    pub fn new(stop_on_first_failure: bool) -> Self {
        Self {
            stop_on_first_failure,
            records: Vec::new(),
        }
    }

    /// Record a failure at `path`
    pub fn fail(&mut self, path: &Path, message: impl Into<String>) {
        if self.should_stop() {
            return;
        }
        self.records.push(FailureRecord::new(path.clone(), message));
    }

    /// Whether traversal should stop collecting
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_on_first_failure && !self.records.is_empty()
    }

    /// Whether nothing failed so far
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of failures so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// First recorded failure
    #[must_use]
    pub fn first(&self) -> Option<&FailureRecord> {
        self.records.first()
    }

    /// Take the collected records
    #[must_use]
    pub fn into_records(self) -> Vec<FailureRecord> {
        self.records
    }
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    failures: Vec<FailureRecord>,
    configuration: Vec<String>,
}

impl FailureReport {
    /// Build a report, dropping exact `(path, message)` duplicates while
    /// keeping discovery order
    #[must_use]
    pub fn build(failures: Vec<FailureRecord>, configuration: Vec<String>) -> Self {
        let unique: IndexSet<FailureRecord> = failures.into_iter().collect();
        Self {
            failures: unique.into_iter().collect(),
            configuration,
        }
    }

    /// Whether the graphs are equivalent
    #[must_use]
    pub fn is_equivalent(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures in discovery order
    #[must_use]
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Number of failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether there are no failures
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Configuration lines appended to the rendered report
    #[must_use]
    pub fn configuration(&self) -> &[String] {
        &self.configuration
    }

    /// Render the report; `None` when equivalent
    #[must_use]
    pub fn render(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let mut out: Vec<String> = self.failures.iter().map(|f| f.message.clone()).collect();
        if !self.configuration.is_empty() {
            out.push(String::new());
            out.push("With configuration:".to_string());
            out.extend(self.configuration.iter().map(|line| format!("- {}", line)));
        }
        Some(out.join("\n"))
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        match self.failures.len() {
            0 => "equivalent".to_string(),
            1 => "1 difference".to_string(),
            n => format!("{} differences", n),
        }
    }
}

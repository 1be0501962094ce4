//! Failure reporters.
//!
//! The engine never decides how a failed comparison becomes visible. A
//! reporter receives the rendered report once per failed run.

use crate::diagnostics::FailureReport;
use crate::error::ConfigError;
use crate::options::EquivalencyOptions;
use crate::validator::validate;
use isomorph_core::Value;
use std::sync::{Mutex, PoisonError};

/// Receives the rendered report of a failed run
pub trait FailureReporter {
    /// Report a failure message
    fn report(&self, message: &str);
}

/// Panics with the report, the way test assertions fail
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicReporter;

impl FailureReporter for PanicReporter {
    fn report(&self, message: &str) {
        panic!("{}", message);
    }
}

/// Records reports for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl FailureReporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Validate and hand a non-empty report to `reporter`.
///
/// # Errors
///
/// Returns error on a configuration mistake, before anything is reported
pub fn assert_equivalent(
    subject: &Value,
    expectation: &Value,
    options: &EquivalencyOptions,
    reporter: &dyn FailureReporter,
) -> Result<FailureReport, ConfigError> {
    let report = validate(subject, expectation, options)?;
    if let Some(message) = report.render() {
        reporter.report(&message);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter_called_once_on_failure() {
        let reporter = CollectingReporter::new();
        let options = EquivalencyOptions::default();
        let report = assert_equivalent(&Value::seq([1, 2]), &Value::seq([1, 3]), &options, &reporter).unwrap();
        assert!(!report.is_equivalent());
        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Expected subject[1] to be 3"));
    }

    #[test]
    fn test_not_called_when_equivalent() {
        let reporter = CollectingReporter::new();
        let options = EquivalencyOptions::default();
        assert_equivalent(&Value::from(1), &Value::from(1), &options, &reporter).unwrap();
        assert!(reporter.is_empty());
    }

    #[test]
    #[should_panic(expected = "Expected subject to be 1, but found 2.")]
    fn test_panic_reporter() {
        let options = EquivalencyOptions::default();
        let _ = assert_equivalent(&Value::from(2), &Value::from(1), &options, &PanicReporter);
    }
}

//! Document comparison for the command line.
//!
//! Both documents are JSON files imported into object graphs. Settings come
//! from an optional settings file, then command-line flags override them.

use isomorph_core::{parse_json, CoreError, JsonObjectMode, Value};
use isomorph_engine::{validate, ConfigError, EquivalencySettings, FailureReport};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised before or instead of a comparison
#[derive(Debug, Error)]
pub enum CompareError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid document
    #[error("{}: {source}", path.display())]
    Document {
        /// File path
        path: PathBuf,
        /// Parse error
        #[source]
        source: CoreError,
    },

    /// Settings are invalid or inconsistent
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Flag values layered over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Members to include
    pub include: Vec<String>,
    /// Members to exclude
    pub exclude: Vec<String>,
    /// Compare collections index-for-index
    pub strict_ordering: bool,
    /// Skip members the subject lacks
    pub shared_only: bool,
    /// Stop at the first difference
    pub stop_on_first_failure: bool,
    /// Maximum recursion depth
    pub max_depth: Option<i64>,
    /// Absolute tolerance for floating point values
    pub float_tolerance: Option<f64>,
    /// Name of the root in messages
    pub root_name: Option<String>,
}

impl Overrides {
    /// Apply the flags to `settings`
    pub fn apply(self, settings: &mut EquivalencySettings) {
        settings.include.extend(self.include);
        settings.exclude.extend(self.exclude);
        settings.strict_ordering |= self.strict_ordering;
        settings.shared_members_only |= self.shared_only;
        settings.stop_on_first_failure |= self.stop_on_first_failure;
        if let Some(depth) = self.max_depth {
            settings.max_depth = depth;
        }
        if self.float_tolerance.is_some() {
            settings.float_tolerance = self.float_tolerance;
        }
        if let Some(name) = self.root_name {
            settings.root_name = name;
        }
    }
}

fn read(path: &Path) -> Result<String, CompareError> {
    fs::read_to_string(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a settings file, or the defaults when `path` is `None`
///
/// # Errors
///
/// Returns error if the file cannot be read or is not a settings document
pub fn load_settings(path: Option<&Path>) -> Result<EquivalencySettings, CompareError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            Ok(EquivalencySettings::from_json(&read(path)?)?)
        }
        None => Ok(EquivalencySettings::default()),
    }
}

/// Load a JSON document as an object graph
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_document(path: &Path, mode: JsonObjectMode) -> Result<Value, CompareError> {
    parse_json(&read(path)?, mode).map_err(|source| CompareError::Document {
        path: path.to_path_buf(),
        source,
    })
}

/// Compare the subject file against the expectation file
///
/// # Errors
///
/// Returns error if a document cannot be loaded or the settings are invalid
pub fn compare_files(
    subject: &Path,
    expectation: &Path,
    settings: EquivalencySettings,
    mode: JsonObjectMode,
) -> Result<FailureReport, CompareError> {
    let options = settings.build()?;
    let subject_value = load_document(subject, mode)?;
    let expectation_value = load_document(expectation, mode)?;

    info!(
        subject = %subject.display(),
        expectation = %expectation.display(),
        "comparing documents"
    );
    let report = validate(&subject_value, &expectation_value, &options)?;
    debug!(differences = report.len(), "comparison finished");
    Ok(report)
}

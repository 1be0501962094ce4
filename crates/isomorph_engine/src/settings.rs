//! Serializable settings.
//!
//! The data-only subset of [`EquivalencyOptions`], loaded from JSON. Missing
//! fields take their defaults.

use crate::comparer::{ApproximateComparer, ComparerRule};
use crate::convert::ConversionRule;
use crate::error::ConfigError;
use crate::options::{
    CyclicReferenceHandling, DEFAULT_MAX_DEPTH, EnumHandling, EquivalencyOptions,
    EquivalencyOptionsBuilder, StringOptions,
};
use isomorph_core::ValueKind;
use serde::{Deserialize, Serialize};

/// Equivalency settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquivalencySettings {
    /// Members to include
    pub include: Vec<String>,
    /// Members to exclude
    pub exclude: Vec<String>,
    /// Compare every collection index-for-index
    pub strict_ordering: bool,
    /// Paths compared index-for-index
    pub strict_ordering_for: Vec<String>,
    /// Skip members the subject lacks
    pub shared_members_only: bool,
    /// Maximum recursion depth
    pub max_depth: i64,
    /// Types compared with equality
    pub compare_by_value: Vec<String>,
    /// Select members from runtime types
    pub respect_runtime_types: bool,
    /// Select fields
    pub include_fields: bool,
    /// Select properties
    pub include_properties: bool,
    /// Treat internal members as non-private
    pub include_internal: bool,
    /// Enum matching mode
    pub enum_handling: EnumHandling,
    /// Enabled conversion rules
    pub conversions: Vec<ConversionRule>,
    /// String relaxations
    pub strings: StringOptions,
    /// In-tandem cycle handling
    pub cyclic_references: CyclicReferenceHandling,
    /// Stop at the first failure
    pub stop_on_first_failure: bool,
    /// Absolute tolerance for floating point values
    pub float_tolerance: Option<f64>,
    /// Name of the root in messages
    pub root_name: String,
}

impl Default for EquivalencySettings {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            strict_ordering: false,
            strict_ordering_for: Vec::new(),
            shared_members_only: false,
            max_depth: DEFAULT_MAX_DEPTH as i64,
            compare_by_value: Vec::new(),
            respect_runtime_types: false,
            include_fields: true,
            include_properties: true,
            include_internal: true,
            enum_handling: EnumHandling::default(),
            conversions: ConversionRule::DEFAULT.to_vec(),
            strings: StringOptions::default(),
            cyclic_references: CyclicReferenceHandling::default(),
            stop_on_first_failure: false,
            float_tolerance: None,
            root_name: "subject".to_string(),
        }
    }
}

impl EquivalencySettings {
    /// Parse settings from JSON text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid settings document
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::InvalidSettings {
            reason: e.to_string(),
        })
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidSettings {
            reason: e.to_string(),
        })
    }

    /// Builder holding these settings
    #[must_use]
    pub fn into_builder(self) -> EquivalencyOptionsBuilder {
        let mut builder = EquivalencyOptions::builder()
            .with_max_depth(self.max_depth)
            .with_conversions(self.conversions)
            .with_string_options(self.strings)
            .with_cyclic_references(self.cyclic_references)
            .with_root_name(self.root_name);

        builder = self.include.into_iter().fold(builder, |b, m| b.including(m));
        builder = self.exclude.into_iter().fold(builder, |b, m| b.excluding(m));
        builder = self
            .strict_ordering_for
            .into_iter()
            .fold(builder, |b, p| b.with_strict_ordering_for(p));
        builder = self
            .compare_by_value
            .into_iter()
            .fold(builder, |b, t| b.comparing_by_value(t));

        if self.strict_ordering {
            builder = builder.with_strict_ordering();
        }
        if self.shared_members_only {
            builder = builder.excluding_missing_members();
        }
        if self.respect_runtime_types {
            builder = builder.respecting_runtime_types();
        }
        if !self.include_fields {
            builder = builder.excluding_fields();
        }
        if !self.include_properties {
            builder = builder.excluding_properties();
        }
        if !self.include_internal {
            builder = builder.excluding_internal_members();
        }
        if self.enum_handling == EnumHandling::ByName {
            builder = builder.comparing_enums_by_name();
        }
        if self.stop_on_first_failure {
            builder = builder.stopping_on_first_failure();
        }
        if let Some(tolerance) = self.float_tolerance {
            builder = builder.using(ComparerRule::for_kind(
                ValueKind::Float,
                ApproximateComparer::new(tolerance),
            ));
        }
        builder
    }

    /// Build options from these settings
    ///
    /// # Errors
    ///
    /// Returns error if the settings are inconsistent
    pub fn build(self) -> Result<EquivalencyOptions, ConfigError> {
        self.into_builder().build()
    }
}

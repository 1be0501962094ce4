//! ISOMORPH Equivalency Engine
//!
//! Recursive structural comparison of object graphs: member selection,
//! classification, type harmonization, cycle tracking and path-qualified
//! diagnostics.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comparer;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod formatter;
pub mod matcher;
pub mod matching;
pub mod node;
pub mod options;
pub mod reporter;
pub mod selector;
pub mod settings;
pub mod strings;
pub mod tracker;
pub mod validator;

// Re-exports
pub use comparer::{
    reachable_type_names, ApproximateComparer, ComparerRule, Comparison, EquivalencyComparer,
    RuleTarget,
};
pub use convert::{harmonize, ConversionRule};
pub use diagnostics::{Diagnostics, FailureRecord, FailureReport};
pub use error::{ConfigError, ConversionError};
pub use formatter::{SafeFormatter, UNFORMATTABLE};
pub use matcher::{Classification, TypeMatcher};
pub use matching::EquivalenceMatrix;
pub use node::ComparisonNode;
pub use options::{
    default_is_value_type, CyclicReferenceHandling, EnumHandling, EquivalencyOptions,
    EquivalencyOptionsBuilder, MemberKinds, StringOptions, ValueTypePredicate, DEFAULT_MAX_DEPTH,
};
pub use reporter::{assert_equivalent, CollectingReporter, FailureReporter, PanicReporter};
pub use selector::MemberSelector;
pub use settings::EquivalencySettings;
pub use strings::{compare_strings, StringMismatch};
pub use tracker::{enter_scoped, CycleTracker, Entry, Revisit, TrackerGuard};
pub use validator::{validate, EquivalencyValidator};

//! Engine error types.
//!
//! Mismatches are never errors: they are collected as failure records.
//! Only configuration mistakes abort a run.

use isomorph_core::ValueKind;

/// Configuration errors, surfaced before (or instead of) a comparison
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Negative maximum recursion depth
    #[error("maximum recursion depth must not be negative, got {depth}")]
    NegativeMaxDepth {
        /// Requested depth
        depth: i64,
    },
    /// Member selection produced nothing to compare
    #[error(
        "no members were found for comparison on type {type_name} at {path}; \
         adjust the member selection rules or compare the type by value"
    )]
    NoMembers {
        /// Type whose members were selected
        type_name: String,
        /// Qualified path of the node
        path: String,
    },
    /// Custom comparer registered for a type that never occurs
    #[error(
        "custom comparer for type {type_name} can never be applied: \
         the type does not occur in the subject or the expectation"
    )]
    UnreachableComparer {
        /// Registered type name
        type_name: String,
    },
    /// Empty name in a member selection rule or comparer registration
    #[error("member selection rules and comparers must name a member or type")]
    EmptyName,
    /// The same member is both included and excluded
    #[error("member {name} is both included and excluded")]
    ConflictingMemberRule {
        /// Member name or path
        name: String,
    },
    /// Both fields and properties are disabled
    #[error("both fields and properties are excluded, nothing can be compared")]
    NoMemberKinds,
    /// Settings document could not be read
    #[error("invalid equivalency settings: {reason}")]
    InvalidSettings {
        /// Parser message
        reason: String,
    },
}

/// A type harmonization attempt that failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Value does not fit the target type
    #[error("{value} is out of range for {to}")]
    OutOfRange {
        /// Rendered source value
        value: String,
        /// Target kind
        to: ValueKind,
    },
    /// Conversion would lose information
    #[error("{value} cannot be represented exactly as {to}")]
    Lossy {
        /// Rendered source value
        value: String,
        /// Target kind
        to: ValueKind,
    },
    /// String could not be parsed
    #[error("\"{value}\" cannot be parsed as {to}")]
    Unparsable {
        /// Source string
        value: String,
        /// Target kind
        to: ValueKind,
    },
}

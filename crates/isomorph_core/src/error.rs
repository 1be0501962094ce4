//! Core error types for ISOMORPH.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input could not be parsed as JSON
    InvalidJson {
        /// Parser message
        reason: String,
    },

    /// Type does not declare the requested member
    UnknownMember {
        /// Runtime type name
        type_name: String,
        /// Requested member
        member: String,
    },

    /// Member exists but cannot be read (write-only, static or indexer)
    NotReadable {
        /// Runtime type name
        type_name: String,
        /// Requested member
        member: String,
    },

    /// Invalid type descriptor
    InvalidDescriptor {
        /// Type name
        type_name: String,
        /// Reason
        reason: String,
    },

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { reason } => write!(f, "Invalid JSON: {}", reason),
            Self::UnknownMember { type_name, member } => {
                write!(f, "Type {} has no member {}", type_name, member)
            }
            Self::NotReadable { type_name, member } => {
                write!(f, "Member {}.{} is not readable", type_name, member)
            }
            Self::InvalidDescriptor { type_name, reason } => {
                write!(f, "Invalid descriptor for {}: {}", type_name, reason)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson {
            reason: err.to_string(),
        }
    }
}

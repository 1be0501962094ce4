//! ISOMORPH Core Types
//!
//! Dynamic object graphs, type descriptors and member paths.
//! This crate contains pure types and logic with no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod error;
pub mod format;
pub mod id;
pub mod json;
pub mod path;
pub mod value;

// Re-exports
pub use descriptor::{
    EqualityFn, MemberDescriptor, MemberKind, TypeDescriptor, TypeDescriptorBuilder, Visibility,
};
pub use error::{CoreError, CoreResult};
pub use format::{DefaultFormatter, FormatError, ValueFormatter};
pub use id::RefId;
pub use json::{from_json, parse_json, JsonObjectMode};
pub use path::{Path, Segment};
pub use value::{Dictionary, EnumValue, MapKey, Object, Sequence, Value, ValueKind};

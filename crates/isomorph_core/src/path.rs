//! Member paths from the root of a comparison.

use crate::value::MapKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Member access (`.Name`)
    Member(String),
    /// Collection index (`[2]`)
    Index(usize),
    /// Dictionary key (`[key]`)
    Key(String),
}

/// Path of a node relative to the root, e.g. `Orders[0].Total`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether this is the root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Child path for a member
    #[must_use]
    pub fn member(&self, name: &str) -> Self {
        self.child(Segment::Member(name.to_string()))
    }

    /// Child path for a collection index
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    /// Child path for a dictionary key
    #[must_use]
    pub fn key(&self, key: &MapKey) -> Self {
        self.child(Segment::Key(key.to_string()))
    }

    fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Dotted member path with indices and keys removed (`Orders.Total`).
    ///
    /// Used to match member selection rules regardless of element position.
    #[must_use]
    pub fn member_path(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Member(name) => Some(name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Path qualified with a root name (`subject.Orders[0].Total`)
    #[must_use]
    pub fn describe(&self, root: &str) -> String {
        if self.is_root() {
            return root.to_string();
        }
        let rendered = self.to_string();
        if rendered.starts_with('[') {
            format!("{}{}", root, rendered)
        } else {
            format!("{}.{}", root, rendered)
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Member(name) if i == 0 => f.write_str(name)?,
                Segment::Member(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

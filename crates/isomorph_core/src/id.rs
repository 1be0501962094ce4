//! Reference identity for shared graph nodes.
//!
//! Composite values live behind `Arc`, so the address of the shared
//! allocation is a stable identity for as long as the value is alive.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reference identifier - identity of one shared composite value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(usize);

impl RefId {
    /// Identity of the allocation behind an `Arc`
    #[must_use]
    pub fn of<T>(value: &Arc<T>) -> Self {
        Self(Arc::as_ptr(value) as *const () as usize)
    }

    /// Create from a raw address
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Get the raw address
    #[must_use]
    pub const fn as_raw(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ref_{:#x}", self.0)
    }
}

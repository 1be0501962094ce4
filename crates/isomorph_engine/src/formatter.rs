//! Formatter isolation.

use isomorph_core::{Value, ValueFormatter};
use std::panic::{self, AssertUnwindSafe};

/// Placeholder for values the formatter could not render
pub const UNFORMATTABLE: &str = "<unformattable>";

/// Wraps a formatter so that neither errors nor panics escape
pub struct SafeFormatter<'a> {
    inner: &'a dyn ValueFormatter,
}

impl<'a> SafeFormatter<'a> {
    /// Wrap a formatter
    #[must_use]
    pub fn new(inner: &'a dyn ValueFormatter) -> Self {
        Self { inner }
    }

    /// Render a value, falling back to [`UNFORMATTABLE`]
    #[must_use]
    pub fn format(&self, value: &Value) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.format(value))) {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, kind = %value.kind(), "value formatter failed");
                UNFORMATTABLE.to_string()
            }
            Err(_) => {
                tracing::warn!(kind = %value.kind(), "value formatter panicked");
                UNFORMATTABLE.to_string()
            }
        }
    }
}

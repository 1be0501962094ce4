//! String comparison.

use crate::options::StringOptions;

/// Characters of context shown around a divergence
const SNIPPET_BEFORE: usize = 3;
const SNIPPET_LEN: usize = 10;

/// How two strings differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringMismatch {
    /// The strings differ only in trailing whitespace
    TrailingWhitespace {
        /// Subject has more whitespace than expected
        superfluous: bool,
    },
    /// The strings differ only in leading whitespace
    LeadingWhitespace {
        /// Subject has more whitespace than expected
        superfluous: bool,
    },
    /// First differing character
    Divergence {
        /// Character index of the first difference
        index: usize,
        /// Text around the difference
        snippet: String,
        /// Subject length in characters
        subject_len: usize,
        /// Expectation length in characters
        expectation_len: usize,
    },
}

impl StringMismatch {
    /// Render the failure message for a node
    #[must_use]
    pub fn describe(&self, path: &str, subject: &str, expectation: &str) -> String {
        match self {
            Self::TrailingWhitespace { superfluous: true } => format!(
                "Expected {} to be {}, but it has unexpected trailing whitespace.",
                path, expectation
            ),
            Self::TrailingWhitespace { superfluous: false } => format!(
                "Expected {} to be {}, but it misses some extra trailing whitespace.",
                path, expectation
            ),
            Self::LeadingWhitespace { superfluous: true } => format!(
                "Expected {} to be {}, but it has unexpected leading whitespace.",
                path, expectation
            ),
            Self::LeadingWhitespace { superfluous: false } => format!(
                "Expected {} to be {}, but it misses some extra leading whitespace.",
                path, expectation
            ),
            Self::Divergence {
                index,
                snippet,
                subject_len,
                expectation_len,
            } if subject_len == expectation_len => format!(
                "Expected {} to be {}, but {} differs near {:?} (index {}).",
                path, expectation, subject, snippet, index
            ),
            Self::Divergence {
                index,
                snippet,
                subject_len,
                expectation_len,
            } => format!(
                "Expected {} to be {} with a length of {}, but {} has a length of {}, differs near {:?} (index {}).",
                path, expectation, expectation_len, subject, subject_len, snippet, index
            ),
        }
    }
}

/// Apply the relaxations to one side
#[must_use]
pub fn normalize(s: &str, options: StringOptions) -> String {
    let mut out = if options.ignore_newline_style {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    };
    if options.ignore_case {
        out = out.to_lowercase();
    }
    if options.ignore_leading_whitespace {
        out = out.trim_start().to_string();
    }
    if options.ignore_trailing_whitespace {
        out = out.trim_end().to_string();
    }
    out
}

/// Compare two strings, returning how they differ
#[must_use]
pub fn compare_strings(
    subject: &str,
    expectation: &str,
    options: StringOptions,
) -> Option<StringMismatch> {
    let subject = normalize(subject, options);
    let expectation = normalize(expectation, options);
    if subject == expectation {
        return None;
    }

    // whitespace is only superfluous or missing when one side extends the other
    if subject.trim_end() == expectation.trim_end() {
        if subject.starts_with(expectation.as_str()) {
            return Some(StringMismatch::TrailingWhitespace { superfluous: true });
        }
        if expectation.starts_with(subject.as_str()) {
            return Some(StringMismatch::TrailingWhitespace { superfluous: false });
        }
    }
    if subject.trim_start() == expectation.trim_start() {
        if subject.ends_with(expectation.as_str()) {
            return Some(StringMismatch::LeadingWhitespace { superfluous: true });
        }
        if expectation.ends_with(subject.as_str()) {
            return Some(StringMismatch::LeadingWhitespace { superfluous: false });
        }
    }

    let s: Vec<char> = subject.chars().collect();
    let e: Vec<char> = expectation.chars().collect();
    let index = s
        .iter()
        .zip(&e)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| s.len().min(e.len()));

    // past the end of the subject, show where the expectation continues
    let source = if index < s.len() { &s } else { &e };
    let start = index.saturating_sub(SNIPPET_BEFORE);
    let snippet: String = source.iter().skip(start).take(SNIPPET_LEN).collect();

    Some(StringMismatch::Divergence {
        index,
        snippet,
        subject_len: s.len(),
        expectation_len: e.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_strings() {
        assert_eq!(compare_strings("abc", "abc", StringOptions::default()), None);
    }

    #[test]
    fn test_trailing_whitespace() {
        let m = compare_strings("abc  ", "abc", StringOptions::default());
        assert_eq!(m, Some(StringMismatch::TrailingWhitespace { superfluous: true }));
        let m = compare_strings("abc", "abc\n", StringOptions::default());
        assert_eq!(m, Some(StringMismatch::TrailingWhitespace { superfluous: false }));
    }

    #[test]
    fn test_different_trailing_whitespace_diverges() {
        let m = compare_strings("abc ", "abc\t", StringOptions::default()).unwrap();
        assert_eq!(
            m,
            StringMismatch::Divergence {
                index: 3,
                snippet: "abc ".to_string(),
                subject_len: 4,
                expectation_len: 4,
            }
        );
    }

    #[test]
    fn test_different_leading_whitespace_diverges() {
        let m = compare_strings("\tabc", " abc", StringOptions::default()).unwrap();
        assert!(matches!(m, StringMismatch::Divergence { index: 0, .. }));
    }

    #[test]
    fn test_leading_whitespace() {
        let m = compare_strings(" abc", "abc", StringOptions::default());
        assert_eq!(m, Some(StringMismatch::LeadingWhitespace { superfluous: true }));
    }

    #[test]
    fn test_divergence_index() {
        let m = compare_strings("hello world", "hello there", StringOptions::default()).unwrap();
        match m {
            StringMismatch::Divergence { index, ref snippet, .. } => {
                assert_eq!(index, 6);
                assert_eq!(snippet, "lo world");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_prefix_reports_length() {
        let m = compare_strings("abc", "abcdef", StringOptions::default()).unwrap();
        assert_eq!(
            m,
            StringMismatch::Divergence {
                index: 3,
                snippet: "abcdef".to_string(),
                subject_len: 3,
                expectation_len: 6,
            }
        );
        let msg = m.describe("subject.Name", "\"abc\"", "\"abcdef\"");
        assert_eq!(
            msg,
            "Expected subject.Name to be \"abcdef\" with a length of 6, but \"abc\" has a length of 3, differs near \"abcdef\" (index 3)."
        );
    }

    #[test]
    fn test_relaxations() {
        let options = StringOptions {
            ignore_case: true,
            ignore_leading_whitespace: true,
            ignore_trailing_whitespace: true,
            ignore_newline_style: true,
        };
        assert_eq!(compare_strings("  A\r\nb ", "a\nB", options), None);
    }

    #[test]
    fn test_multibyte_index_is_in_chars() {
        let m = compare_strings("héllo", "hélla", StringOptions::default()).unwrap();
        assert!(matches!(m, StringMismatch::Divergence { index: 4, .. }));
    }
}

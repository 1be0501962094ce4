//! Custom comparison rules.
//!
//! Rules are consulted in registration order; the first rule whose target
//! matches a node decides that node and nothing below it is traversed.

use isomorph_core::{Path, Value, ValueKind};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Outcome of a custom comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Values are equivalent
    Equivalent,
    /// Values differ
    Mismatch {
        /// Why they differ
        reason: String,
    },
}

impl Comparison {
    /// Mismatch with a reason
    #[must_use]
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::Mismatch {
            reason: reason.into(),
        }
    }

    /// Equivalent when `ok`, otherwise a mismatch with `reason`
    #[must_use]
    pub fn check(ok: bool, reason: impl Into<String>) -> Self {
        if ok { Self::Equivalent } else { Self::mismatch(reason) }
    }
}

/// Replaces the default comparison for matching nodes
pub trait EquivalencyComparer: Send + Sync {
    /// Compare a non-null subject with a non-null expectation
    fn compare(&self, subject: &Value, expectation: &Value) -> Comparison;
}

impl<F> EquivalencyComparer for F
where
    F: Fn(&Value, &Value) -> Comparison + Send + Sync,
{
    fn compare(&self, subject: &Value, expectation: &Value) -> Comparison {
        self(subject, expectation)
    }
}

/// Numbers are equivalent when within a tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateComparer {
    tolerance: f64,
}

impl ApproximateComparer {
    /// Create a comparer with an absolute tolerance
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

impl EquivalencyComparer for ApproximateComparer {
    fn compare(&self, subject: &Value, expectation: &Value) -> Comparison {
        match (as_f64(subject), as_f64(expectation)) {
            (Some(s), Some(e)) => Comparison::check(
                s == e || (s.is_nan() && e.is_nan()) || (s - e).abs() <= self.tolerance,
                format!("it differs by more than {}", self.tolerance),
            ),
            _ => Comparison::mismatch(format!(
                "{} cannot be compared approximately with {}",
                subject.type_name(),
                expectation.type_name()
            )),
        }
    }
}

/// What a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// Expectation values of this runtime type (or derived from it)
    Type(String),
    /// Expectation values of this kind
    Kind(ValueKind),
    /// Nodes at this member path (indices ignored) or exact path
    Path(String),
}

impl RuleTarget {
    fn matches(&self, expectation: &Value, path: &Path) -> bool {
        match self {
            Self::Type(name) => match expectation {
                Value::Object(obj) => obj.descriptor().is_or_derives_from(name),
                other => other.type_name() == *name,
            },
            Self::Kind(kind) => expectation.kind() == *kind,
            Self::Path(p) => path.member_path() == *p || path.to_string() == *p,
        }
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => write!(f, "type {}", name),
            Self::Kind(kind) => write!(f, "{} values", kind),
            Self::Path(path) => write!(f, "member {}", path),
        }
    }
}

/// A registered custom comparer
#[derive(Clone)]
pub struct ComparerRule {
    target: RuleTarget,
    comparer: Arc<dyn EquivalencyComparer>,
}

impl ComparerRule {
    /// Rule for values of a runtime type
    #[must_use]
    pub fn for_type(type_name: impl Into<String>, comparer: impl EquivalencyComparer + 'static) -> Self {
        Self {
            target: RuleTarget::Type(type_name.into()),
            comparer: Arc::new(comparer),
        }
    }

    /// Rule for values of a kind
    #[must_use]
    pub fn for_kind(kind: ValueKind, comparer: impl EquivalencyComparer + 'static) -> Self {
        Self {
            target: RuleTarget::Kind(kind),
            comparer: Arc::new(comparer),
        }
    }

    /// Rule for a member path
    #[must_use]
    pub fn for_path(path: impl Into<String>, comparer: impl EquivalencyComparer + 'static) -> Self {
        Self {
            target: RuleTarget::Path(path.into()),
            comparer: Arc::new(comparer),
        }
    }

    /// Rule target
    #[must_use]
    pub fn target(&self) -> &RuleTarget {
        &self.target
    }

    /// Whether this rule decides the node
    #[must_use]
    pub fn matches(&self, expectation: &Value, path: &Path) -> bool {
        self.target.matches(expectation, path)
    }

    /// Run the comparer
    #[must_use]
    pub fn compare(&self, subject: &Value, expectation: &Value) -> Comparison {
        self.comparer.compare(subject, expectation)
    }
}

impl fmt::Debug for ComparerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparerRule")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Names of every runtime type reachable from the given roots.
///
/// Object types contribute their base type names too, both plain and
/// namespace-qualified. Composite values are
/// visited once by identity, so cyclic graphs terminate.
#[must_use]
pub fn reachable_type_names(roots: &[&Value]) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut visited = HashSet::new();
    let mut pending: Vec<Value> = roots.iter().map(|v| (*v).clone()).collect();

    while let Some(value) = pending.pop() {
        if let Some(id) = value.ref_id() {
            if !visited.insert(id) {
                continue;
            }
        }
        names.insert(value.type_name());
        match &value {
            Value::Seq(seq) => pending.extend(seq.items()),
            Value::Map(map) => pending.extend(map.entries().into_iter().map(|(_, v)| v)),
            Value::Object(obj) => {
                names.insert(obj.descriptor().full_name());
                let mut base = obj.descriptor().base();
                while let Some(ty) = base {
                    names.insert(ty.name().to_string());
                    names.insert(ty.full_name());
                    base = ty.base();
                }
                for member in obj.descriptor().members() {
                    if let Ok(v) = member.get(obj) {
                        pending.push(v);
                    }
                }
            }
            _ => {}
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use isomorph_core::{Object, TypeDescriptor};

    #[test]
    fn test_approximate_comparer() {
        let cmp = ApproximateComparer::new(0.01);
        assert_eq!(cmp.compare(&Value::from(1.005), &Value::from(1.0)), Comparison::Equivalent);
        assert!(matches!(
            cmp.compare(&Value::from(1.1), &Value::from(1.0)),
            Comparison::Mismatch { .. }
        ));
        assert_eq!(cmp.compare(&Value::from(2), &Value::from(2.0)), Comparison::Equivalent);
    }

    #[test]
    fn test_approximate_comparer_nan_and_infinity() {
        let cmp = ApproximateComparer::new(0.1);
        assert_eq!(cmp.compare(&Value::from(f64::NAN), &Value::from(f64::NAN)), Comparison::Equivalent);
        assert_eq!(
            cmp.compare(&Value::from(f64::INFINITY), &Value::from(f64::INFINITY)),
            Comparison::Equivalent
        );
        assert!(matches!(
            cmp.compare(&Value::from(f64::NAN), &Value::from(1.0)),
            Comparison::Mismatch { .. }
        ));
    }

    #[test]
    fn test_closure_comparer() {
        let rule = ComparerRule::for_kind(ValueKind::Str, |s: &Value, e: &Value| {
            Comparison::check(
                s.as_str().map(str::len) == e.as_str().map(str::len),
                "length differs",
            )
        });
        assert_eq!(rule.compare(&Value::from("abc"), &Value::from("xyz")), Comparison::Equivalent);
    }

    #[test]
    fn test_rule_targets() {
        let base = TypeDescriptor::builder("Shape").property("Id").build();
        let circle = TypeDescriptor::builder("Circle").base(base).build();
        let value = Value::object(circle, [("Id", 1)]);
        let path = Path::root().member("Shapes").index(3);

        let by_base = ComparerRule::for_type("Shape", ApproximateComparer::new(0.0));
        assert!(by_base.matches(&value, &path));

        let by_kind = ComparerRule::for_kind(ValueKind::Float, ApproximateComparer::new(0.0));
        assert!(!by_kind.matches(&value, &path));

        let by_path = ComparerRule::for_path("Shapes", ApproximateComparer::new(0.0));
        assert!(by_path.matches(&value, &path));
        assert_eq!(by_path.target().to_string(), "member Shapes");
    }

    #[test]
    fn test_reachable_type_names_handles_cycles() {
        let node = TypeDescriptor::builder("Node").property("Next").property("Tags").build();
        let a = Object::new(node);
        a.set("Next", &a);
        a.set("Tags", Value::seq([Value::from(1.5)]));

        let names = reachable_type_names(&[&Value::from(&a)]);
        assert!(names.contains("Node"));
        assert!(names.contains("sequence"));
        assert!(names.contains("f64"));
        a.clear();
    }
}

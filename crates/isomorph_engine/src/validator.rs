//! Recursive equivalency validation.
//!
//! Each node is settled in this order: null handling, custom comparers,
//! classification, then either a single equality check or a composite
//! descent guarded by the depth cap and the cycle tracker. Mismatches are
//! recorded and traversal continues with the siblings; only configuration
//! errors abort the run.

use crate::comparer::{reachable_type_names, Comparison, RuleTarget};
use crate::convert::harmonize;
use crate::diagnostics::{Diagnostics, FailureRecord, FailureReport};
use crate::error::ConfigError;
use crate::formatter::SafeFormatter;
use crate::matcher::{Classification, TypeMatcher};
use crate::matching::EquivalenceMatrix;
use crate::node::ComparisonNode;
use crate::options::{CyclicReferenceHandling, EnumHandling, EquivalencyOptions};
use crate::selector::MemberSelector;
use crate::strings::compare_strings;
use crate::tracker::{enter_scoped, CycleTracker, Revisit};
use isomorph_core::{CoreError, EnumValue, Path, Value};
use std::sync::Arc;
use tracing::{debug, trace};

type Step = Result<(), ConfigError>;

/// Compares object graphs under one set of options
#[derive(Debug, Clone, Copy)]
pub struct EquivalencyValidator<'o> {
    options: &'o EquivalencyOptions,
}

impl<'o> EquivalencyValidator<'o> {
    /// Create a validator
    #[must_use]
    pub fn new(options: &'o EquivalencyOptions) -> Self {
        Self { options }
    }

    /// Compare `subject` against `expectation`
    ///
    /// # Errors
    ///
    /// Returns error if a custom comparer targets a type that occurs in
    /// neither graph, or if member selection yields nothing for an object
    pub fn validate(&self, subject: &Value, expectation: &Value) -> Result<FailureReport, ConfigError> {
        self.check_comparers(subject, expectation)?;

        debug!(
            subject = %subject.type_name(),
            expectation = %expectation.type_name(),
            "equivalency run started"
        );
        let mut traversal = Traversal::new(self.options);
        traversal.compare(&ComparisonNode::root(subject.clone(), expectation.clone()))?;

        let report = FailureReport::build(traversal.diagnostics.into_records(), self.options.describe());
        debug!(failures = report.len(), "equivalency run finished");
        Ok(report)
    }

    fn check_comparers(&self, subject: &Value, expectation: &Value) -> Step {
        let mut targets = self.options.comparers().iter().filter_map(|rule| match rule.target() {
            RuleTarget::Type(name) => Some(name),
            _ => None,
        });
        let Some(first) = targets.next() else {
            return Ok(());
        };
        let reachable = reachable_type_names(&[subject, expectation]);
        for name in std::iter::once(first).chain(targets) {
            if !reachable.contains(name) {
                return Err(ConfigError::UnreachableComparer {
                    type_name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Compare `subject` against `expectation` with `options`
///
/// # Errors
///
/// Returns error on a configuration mistake; mismatches are in the report
pub fn validate(
    subject: &Value,
    expectation: &Value,
    options: &EquivalencyOptions,
) -> Result<FailureReport, ConfigError> {
    EquivalencyValidator::new(options).validate(subject, expectation)
}

/// Per-run state: the tracker and diagnostics belong to one call
struct Traversal<'o> {
    options: &'o EquivalencyOptions,
    formatter: SafeFormatter<'o>,
    tracker: CycleTracker,
    diagnostics: Diagnostics,
}

impl AsMut<CycleTracker> for Traversal<'_> {
    fn as_mut(&mut self) -> &mut CycleTracker {
        &mut self.tracker
    }
}

impl<'o> Traversal<'o> {
    fn new(options: &'o EquivalencyOptions) -> Self {
        Self {
            options,
            formatter: SafeFormatter::new(options.formatter().as_ref()),
            tracker: CycleTracker::new(),
            diagnostics: Diagnostics::new(options.stop_on_first_failure()),
        }
    }

    fn describe(&self, path: &Path) -> String {
        path.describe(self.options.root_name())
    }

    fn format(&self, value: &Value) -> String {
        self.formatter.format(value)
    }

    fn fail(&mut self, path: &Path, message: String) {
        self.diagnostics.fail(path, message);
    }

    fn fail_value(&mut self, node: &ComparisonNode) {
        let message = format!(
            "Expected {} to be {}, but found {}.",
            self.describe(&node.path),
            self.format(&node.expectation),
            self.format(&node.subject)
        );
        self.fail(&node.path, message);
    }

    fn fail_type(&mut self, node: &ComparisonNode, subject: &Value) {
        let message = format!(
            "Expected {} to be {} of type {}, but found {} of type {}.",
            self.describe(&node.path),
            self.format(&node.expectation),
            node.expectation.type_name(),
            self.format(subject),
            subject.type_name()
        );
        self.fail(&node.path, message);
    }

    fn fail_unreadable(&mut self, path: &Path, expected: &Value, err: &CoreError) {
        let message = format!(
            "Expected {} to be {}, but it cannot be read: {}.",
            self.describe(path),
            self.format(expected),
            err
        );
        self.fail(path, message);
    }

    fn compare(&mut self, node: &ComparisonNode) -> Step {
        if self.diagnostics.should_stop() {
            return Ok(());
        }

        match (node.subject.is_null(), node.expectation.is_null()) {
            (true, true) => return Ok(()),
            (true, false) | (false, true) => {
                self.fail_value(node);
                return Ok(());
            }
            (false, false) => {}
        }

        let options = self.options;
        if let Some(rule) = options.comparer_for(&node.expectation, &node.path) {
            trace!(path = %node.path, rule = %rule.target(), "custom comparer");
            if let Comparison::Mismatch { reason } = rule.compare(&node.subject, &node.expectation) {
                let message = format!(
                    "Expected {} to be {}, but found {} ({}).",
                    self.describe(&node.path),
                    self.format(&node.expectation),
                    self.format(&node.subject),
                    reason
                );
                self.fail(&node.path, message);
            }
            return Ok(());
        }

        let class = TypeMatcher::new(options)
            .classify(node.compile_time_type.as_deref(), &node.expectation);
        match class {
            Classification::Primitive => {
                self.compare_primitive(node);
                Ok(())
            }
            Classification::String => {
                self.compare_string(node);
                Ok(())
            }
            _ => self.compare_composite(node, class),
        }
    }

    fn compare_primitive(&mut self, node: &ComparisonNode) {
        match (&node.subject, &node.expectation) {
            (subject, Value::Enum(expected)) => self.compare_enum(node, subject, expected),
            (Value::Enum(actual), expected) => self.compare_enum(node, expected, actual),
            (subject, Value::Object(expected)) => match subject {
                Value::Object(actual) => {
                    let equal = match expected.descriptor().equality() {
                        Some(eq) => eq(actual, expected),
                        None => Arc::ptr_eq(actual, expected),
                    };
                    if !equal {
                        self.fail_value(node);
                    }
                }
                other => self.fail_type(node, other),
            },
            (subject, expected) => match harmonize(self.options.conversions(), subject, expected.kind()) {
                Some(Ok(converted)) => {
                    if !scalars_equal(&converted, expected) {
                        self.fail_value(node);
                    }
                }
                Some(Err(err)) => self.fail_conversion(node, &err.to_string()),
                None => self.fail_type(node, &node.subject),
            },
        }
    }

    /// Match an enum against the value on the other side, in either direction
    fn compare_enum(&mut self, node: &ComparisonNode, other: &Value, value: &EnumValue) {
        match self.enums_match(other, value) {
            Some(true) => {}
            Some(false) => self.fail_value(node),
            None => self.fail_type(node, &node.subject),
        }
    }

    fn enums_match(&self, subject: &Value, expected: &EnumValue) -> Option<bool> {
        let handling = self.options.enum_handling();
        match (handling, subject) {
            (EnumHandling::ByValue, Value::Enum(actual)) => Some(actual.discriminant == expected.discriminant),
            (EnumHandling::ByName, Value::Enum(actual)) => Some(actual.variant == expected.variant),
            (EnumHandling::ByValue, Value::Int(i)) => Some(*i == expected.discriminant),
            (EnumHandling::ByValue, Value::UInt(u)) => {
                Some(i64::try_from(*u).is_ok_and(|u| u == expected.discriminant))
            }
            (EnumHandling::ByName, Value::Str(s)) => Some(*s == expected.variant),
            _ => None,
        }
    }

    fn fail_conversion(&mut self, node: &ComparisonNode, reason: &str) {
        let message = format!(
            "Expected {} to be {} of type {}, but found {} of type {}, which cannot be converted: {}.",
            self.describe(&node.path),
            self.format(&node.expectation),
            node.expectation.type_name(),
            self.format(&node.subject),
            node.subject.type_name(),
            reason
        );
        self.fail(&node.path, message);
    }

    fn compare_string(&mut self, node: &ComparisonNode) {
        let Some(expected) = node.expectation.as_str() else {
            return;
        };
        if let Value::Enum(actual) = &node.subject {
            return self.compare_enum(node, &node.expectation, actual);
        }
        let converted = match harmonize(self.options.conversions(), &node.subject, node.expectation.kind()) {
            Some(Ok(converted)) => converted,
            Some(Err(err)) => return self.fail_conversion(node, &err.to_string()),
            None => return self.fail_type(node, &node.subject),
        };
        let Some(actual) = converted.as_str() else {
            return self.fail_type(node, &node.subject);
        };
        if let Some(mismatch) = compare_strings(actual, expected, self.options.string_options()) {
            let message = mismatch.describe(
                &self.describe(&node.path),
                &self.format(&node.subject),
                &self.format(&node.expectation),
            );
            self.fail(&node.path, message);
        }
    }

    fn compare_composite(&mut self, node: &ComparisonNode, class: Classification) -> Step {
        let fits = match class {
            Classification::Collection => node.subject.as_seq().is_some(),
            Classification::Dictionary => node.subject.as_map().is_some(),
            _ => node.subject.as_object().is_some(),
        };
        if !fits {
            let message = format!(
                "Expected {} to be {} {}, but found {}.",
                self.describe(&node.path),
                class,
                self.format(&node.expectation),
                self.format(&node.subject)
            );
            self.fail(&node.path, message);
            return Ok(());
        }

        if node.depth >= self.options.max_depth() {
            let message = format!(
                "The maximum recursion depth of {} levels was exceeded at {}.",
                self.options.max_depth(),
                self.describe(&node.path)
            );
            self.fail(&node.path, message);
            return Ok(());
        }

        let (Some(subject), Some(expectation)) = (node.subject.ref_id(), node.expectation.ref_id()) else {
            return Ok(());
        };
        let revisit = match enter_scoped(self, subject, expectation, &node.path) {
            Ok(mut scope) => {
                trace!(path = %node.path, %class, depth = node.depth, "descending");
                return scope.descend(node, class);
            }
            Err(revisit) => revisit,
        };

        match revisit {
            Revisit::InTandem { target } => {
                trace!(path = %node.path, %target, "cycle in tandem");
                if self.options.cyclic_references() == CyclicReferenceHandling::Fail {
                    let message = format!(
                        "Expected {} to be {}, but it contains a cyclic reference back to {}.",
                        self.describe(&node.path),
                        self.format(&node.expectation),
                        self.describe(&target)
                    );
                    self.fail(&node.path, message);
                }
            }
            Revisit::Asymmetric {
                subject_target,
                expectation_target,
            } => {
                trace!(path = %node.path, "asymmetric cycle");
                let path = self.describe(&node.path);
                let message = match (subject_target, expectation_target) {
                    (Some(s), Some(e)) => format!(
                        "Expected {} to refer back to {} like the expectation, but it refers back to {}.",
                        path,
                        self.describe(&e),
                        self.describe(&s)
                    ),
                    (Some(s), None) => format!(
                        "Expected {} to be {}, but found a cyclic reference back to {} that the expectation does not have.",
                        path,
                        self.format(&node.expectation),
                        self.describe(&s)
                    ),
                    (None, e) => format!(
                        "Expected {} to be a cyclic reference back to {}, but found {}, which does not cycle back.",
                        path,
                        e.map_or_else(|| path.clone(), |e| self.describe(&e)),
                        self.format(&node.subject)
                    ),
                };
                self.fail(&node.path, message);
            }
        }
        Ok(())
    }

    fn descend(&mut self, node: &ComparisonNode, class: Classification) -> Step {
        match class {
            Classification::Collection => self.compare_collection(node),
            Classification::Dictionary => self.compare_dictionary(node),
            Classification::Structured => self.compare_object(node),
            Classification::Primitive | Classification::String => Ok(()),
        }
    }

    fn compare_collection(&mut self, node: &ComparisonNode) -> Step {
        let (Some(subject), Some(expectation)) = (node.subject.as_seq(), node.expectation.as_seq()) else {
            return Ok(());
        };
        let actual = subject.items();
        let expected = expectation.items();

        if actual.len() != expected.len() {
            let (difference, direction) = if actual.len() < expected.len() {
                (expected.len() - actual.len(), "less")
            } else {
                (actual.len() - expected.len(), "more")
            };
            let message = format!(
                "Expected {} to be a collection with {} item(s), but {} contains {} item(s) {} than {}.",
                self.describe(&node.path),
                expected.len(),
                self.format(&node.subject),
                difference,
                direction,
                self.format(&node.expectation)
            );
            self.fail(&node.path, message);
        }

        if self.options.is_order_sensitive(&node.path) {
            for (index, (a, e)) in actual.iter().zip(&expected).enumerate() {
                if self.diagnostics.should_stop() {
                    break;
                }
                self.compare(&node.element(index, a.clone(), e.clone()))?;
            }
            Ok(())
        } else {
            self.match_unordered(node, &actual, &expected)
        }
    }

    /// Run `node` against scratch diagnostics, returning what it found
    fn probe(&mut self, node: &ComparisonNode, stop_on_first: bool) -> Result<Vec<FailureRecord>, ConfigError> {
        let saved = std::mem::replace(&mut self.diagnostics, Diagnostics::new(stop_on_first));
        let outcome = self.compare(node);
        let scratch = std::mem::replace(&mut self.diagnostics, saved);
        outcome.map(|()| scratch.into_records())
    }

    fn match_unordered(&mut self, node: &ComparisonNode, actual: &[Value], expected: &[Value]) -> Step {
        let mut error = None;
        let matrix = EquivalenceMatrix::build(expected.len(), actual.len(), |row, column| {
            if error.is_some() {
                return false;
            }
            let candidate = node.element(row, actual[column].clone(), expected[row].clone());
            match self.probe(&candidate, true) {
                Ok(failures) => failures.is_empty(),
                Err(err) => {
                    error = Some(err);
                    false
                }
            }
        });
        if let Some(err) = error {
            return Err(err);
        }

        let matched = matrix.maximum_matching();
        let taken: Vec<usize> = matched.iter().flatten().copied().collect();
        let free: Vec<usize> = (0..actual.len()).filter(|c| !taken.contains(c)).collect();

        for (row, column) in matched.iter().enumerate() {
            if column.is_some() {
                continue;
            }
            if self.diagnostics.should_stop() {
                break;
            }
            self.report_unmatched(node, row, actual, expected, &free)?;
        }
        Ok(())
    }

    /// Report an expectation without a partner, citing the closest
    /// unmatched candidate (fewest differences, lowest index on ties)
    fn report_unmatched(
        &mut self,
        node: &ComparisonNode,
        row: usize,
        actual: &[Value],
        expected: &[Value],
        free: &[usize],
    ) -> Step {
        let mut closest: Option<Vec<FailureRecord>> = None;
        for &column in free {
            let candidate = node.element(row, actual[column].clone(), expected[row].clone());
            let failures = self.probe(&candidate, false)?;
            if closest.as_ref().is_none_or(|best| failures.len() < best.len()) {
                closest = Some(failures);
            }
        }

        let path = node.path.index(row);
        let mut message = format!(
            "Expected {} to be {}, but no equivalent item was found in {}.",
            self.describe(&path),
            self.format(&expected[row]),
            self.describe(&node.path)
        );
        if let Some(first) = closest.as_ref().and_then(|failures| failures.first()) {
            message.push_str(" The closest candidate differs: ");
            message.push_str(&first.message);
        }
        self.fail(&path, message);
        Ok(())
    }

    fn compare_dictionary(&mut self, node: &ComparisonNode) -> Step {
        let (Some(subject), Some(expectation)) = (node.subject.as_map(), node.expectation.as_map()) else {
            return Ok(());
        };
        let path = self.describe(&node.path);

        let expected = expectation.entries();
        for (key, _) in &expected {
            if !subject.contains_key(key) {
                let message = format!(
                    "Expected {} to contain key {}, but it is missing.",
                    path,
                    self.format(&key.to_value())
                );
                self.fail(&node.path.key(key), message);
            }
        }
        for (key, value) in subject.entries() {
            if !expectation.contains_key(&key) {
                let message = format!(
                    "Expected {} not to contain key {}, but found it with value {}.",
                    path,
                    self.format(&key.to_value()),
                    self.format(&value)
                );
                self.fail(&node.path.key(&key), message);
            }
        }

        for (key, value) in expected {
            if self.diagnostics.should_stop() {
                break;
            }
            if let Some(actual) = subject.get(&key) {
                self.compare(&node.entry(&key, actual, value))?;
            }
        }
        Ok(())
    }

    fn compare_object(&mut self, node: &ComparisonNode) -> Step {
        let (Some(subject), Some(expectation)) = (node.subject.as_object(), node.expectation.as_object()) else {
            return Ok(());
        };
        let relevant = match &node.compile_time_type {
            Some(declared) if !self.options.respect_runtime_types() => Arc::clone(declared),
            _ => Arc::clone(expectation.descriptor()),
        };

        let selector = MemberSelector::new(self.options);
        for member in selector.select(&relevant, &node.path)? {
            if self.diagnostics.should_stop() {
                break;
            }
            let path = node.path.member(member.name());
            let expected = match member.get(expectation) {
                Ok(value) => value,
                Err(err) => {
                    let message = format!("Cannot read {} on the expectation: {}.", self.describe(&path), err);
                    self.fail(&path, message);
                    continue;
                }
            };
            let Some(actual_member) = selector.find_subject_member(subject.descriptor(), member.name()) else {
                if !self.options.shared_members_only() {
                    let message = format!(
                        "Expected {} to be {}, but {} of type {} has no member {}.",
                        self.describe(&path),
                        self.format(&expected),
                        self.describe(&node.path),
                        subject.type_name(),
                        member.name()
                    );
                    self.fail(&path, message);
                }
                continue;
            };
            let actual = match actual_member.get(subject) {
                Ok(value) => value,
                Err(err) => {
                    self.fail_unreadable(&path, &expected, &err);
                    continue;
                }
            };
            self.compare(&node.member(member, actual, expected))?;
        }
        Ok(())
    }
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::UInt(x), Value::UInt(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::{ApproximateComparer, ComparerRule};
    use isomorph_core::{
        from_json, FormatError, JsonObjectMode, MemberDescriptor, Object, TypeDescriptor,
        ValueFormatter, ValueKind,
    };
    use proptest::prelude::*;

    fn run(subject: &Value, expectation: &Value) -> FailureReport {
        validate(subject, expectation, &EquivalencyOptions::default()).unwrap()
    }

    fn run_with(subject: &Value, expectation: &Value, options: &EquivalencyOptions) -> FailureReport {
        validate(subject, expectation, options).unwrap()
    }

    fn paths(report: &FailureReport) -> Vec<String> {
        report.failures().iter().map(|f| f.path.to_string()).collect()
    }

    fn node_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Node").property("Next").build()
    }

    fn point(x: i64, y: i64) -> Value {
        let ty = TypeDescriptor::builder("Point").property("X").property("Y").build();
        Value::object(ty, [("X", x), ("Y", y)])
    }

    #[test]
    fn test_equal_scalars() {
        assert!(run(&Value::from(1), &Value::from(1)).is_equivalent());
        assert!(run(&Value::from("a"), &Value::from("a")).is_equivalent());
        assert!(run(&Value::Float(f64::NAN), &Value::Float(f64::NAN)).is_equivalent());
    }

    #[test]
    fn test_scalar_mismatch_message() {
        let report = run(&Value::from(2), &Value::from(1));
        assert_eq!(report.failures()[0].message, "Expected subject to be 1, but found 2.");
    }

    #[test]
    fn test_null_handling() {
        assert!(run(&Value::Null, &Value::Null).is_equivalent());
        let report = run(&Value::Null, &Value::from(1));
        assert_eq!(report.failures()[0].message, "Expected subject to be 1, but found <null>.");
        let report = run(&point(1, 2), &Value::Null);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_structured_members() {
        let report = run(&point(1, 3), &point(1, 2));
        assert_eq!(paths(&report), vec!["Y"]);
        assert_eq!(report.failures()[0].message, "Expected subject.Y to be 2, but found 3.");
    }

    #[test]
    fn test_equivalence_ignores_type_identity() {
        let other = TypeDescriptor::builder("Coordinate").property("Y").property("X").build();
        let subject = Value::object(other, [("X", 1), ("Y", 2)]);
        assert!(run(&subject, &point(1, 2)).is_equivalent());
    }

    #[test]
    fn test_missing_member() {
        let partial = TypeDescriptor::builder("Partial").property("X").build();
        let subject = Value::object(partial, [("X", 1)]);
        let report = run(&subject, &point(1, 2));
        assert_eq!(paths(&report), vec!["Y"]);
        assert!(report.failures()[0].message.contains("has no member Y"));

        let shared = EquivalencyOptions::builder().excluding_missing_members().build().unwrap();
        assert!(run_with(&subject, &point(1, 2), &shared).is_equivalent());
    }

    #[test]
    fn test_member_exclusion() {
        let options = EquivalencyOptions::builder().excluding("Y").build().unwrap();
        assert!(run_with(&point(1, 3), &point(1, 2), &options).is_equivalent());
    }

    #[test]
    fn test_nested_paths() {
        let order = TypeDescriptor::builder("Order").property("Lines").build();
        let line = TypeDescriptor::builder("Line").property("Qty").build();
        let make = |qty: i64| {
            Value::object(
                order.clone(),
                [("Lines", Value::seq([Value::object(line.clone(), [("Qty", qty)])]))],
            )
        };
        let strict = EquivalencyOptions::builder().with_strict_ordering().build().unwrap();
        let report = run_with(&make(2), &make(1), &strict);
        assert_eq!(report.failures()[0].path.describe("subject"), "subject.Lines[0].Qty");

        let report = run(&make(2), &make(1));
        assert_eq!(paths(&report), vec!["Lines[0]"]);
        assert!(report.failures()[0].message.contains("Expected subject.Lines[0].Qty to be 1, but found 2."));
    }

    #[test]
    fn test_collection_order_sensitivity() {
        let subject = Value::seq([1, 2, 3]);
        let expectation = Value::seq([3, 2, 1]);

        let strict = EquivalencyOptions::builder().with_strict_ordering().build().unwrap();
        let report = run_with(&subject, &expectation, &strict);
        assert_eq!(paths(&report), vec!["[0]", "[2]"]);

        assert!(run(&subject, &expectation).is_equivalent());
    }

    #[test]
    fn test_count_mismatch_then_prefix() {
        let strict = EquivalencyOptions::builder().with_strict_ordering().build().unwrap();
        let report = run_with(&Value::seq([1, 9]), &Value::seq([1, 2, 3]), &strict);
        assert_eq!(paths(&report), vec!["", "[1]"]);
        assert_eq!(
            report.failures()[0].message,
            "Expected subject to be a collection with 3 item(s), but {1, 9} contains 1 item(s) less than {1, 2, 3}."
        );
    }

    #[test]
    fn test_unordered_reports_unmatched_with_closest() {
        let report = run(&Value::seq([point(1, 2), point(3, 5)]), &Value::seq([point(3, 4), point(1, 2)]));
        assert_eq!(paths(&report), vec!["[0]"]);
        let message = &report.failures()[0].message;
        assert!(message.starts_with("Expected subject[0] to be Point { X = 3, Y = 4 }, but no equivalent item"));
        assert!(message.contains("The closest candidate differs: Expected subject[0].Y to be 4, but found 5."));
    }

    #[test]
    fn test_unordered_duplicates() {
        assert!(run(&Value::seq([1, 1, 2]), &Value::seq([1, 2, 1])).is_equivalent());
        let report = run(&Value::seq([1, 2, 2]), &Value::seq([1, 1, 2]));
        assert_eq!(paths(&report), vec!["[1]"]);
    }

    #[test]
    fn test_strict_ordering_for_one_path() {
        let ty = TypeDescriptor::builder("Bag").property("Fixed").property("Loose").build();
        let make = |fixed: [i64; 2], loose: [i64; 2]| {
            Value::object(ty.clone(), [("Fixed", Value::seq(fixed)), ("Loose", Value::seq(loose))])
        };
        let options = EquivalencyOptions::builder().with_strict_ordering_for("Fixed").build().unwrap();
        let report = run_with(&make([2, 1], [2, 1]), &make([1, 2], [1, 2]), &options);
        assert_eq!(paths(&report), vec!["Fixed[0]", "Fixed[1]"]);
    }

    #[test]
    fn test_dictionary_missing_and_extra_keys() {
        let subject = Value::map([("a", 1), ("b", 2)]);
        let expectation = Value::map([("a", 1), ("c", 3)]);
        let report = run(&subject, &expectation);
        let messages: Vec<&str> = report.failures().iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Expected subject to contain key \"c\", but it is missing.",
                "Expected subject not to contain key \"b\", but found it with value 2.",
            ]
        );
        assert_eq!(paths(&report), vec!["[c]", "[b]"]);
    }

    #[test]
    fn test_dictionary_values_recurse() {
        let report = run(&Value::map([("a", 2)]), &Value::map([("a", 1)]));
        assert_eq!(paths(&report), vec!["[a]"]);
    }

    #[test]
    fn test_structural_kind_mismatch_stops_branch() {
        let report = run(&Value::from(5), &Value::seq([1, 2]));
        assert_eq!(report.len(), 1);
        assert_eq!(report.failures()[0].message, "Expected subject to be a collection {1, 2}, but found 5.");
    }

    #[test]
    fn test_self_cycle_is_equivalent() {
        let a = Object::new(node_type());
        a.set("Next", &a);
        let value = Value::from(&a);
        assert!(run(&value, &value).is_equivalent());

        let b = Object::new(node_type());
        b.set("Next", &b);
        assert!(run(&value, &Value::from(&b)).is_equivalent());

        let strict = EquivalencyOptions::builder()
            .with_cyclic_references(CyclicReferenceHandling::Fail)
            .build()
            .unwrap();
        let report = run_with(&value, &Value::from(&b), &strict);
        assert_eq!(paths(&report), vec!["Next"]);
        a.clear();
        b.clear();
    }

    #[test]
    fn test_asymmetric_cycle_is_mismatch() {
        let a = Object::new(node_type());
        a.set("Next", &a);
        let b = Object::new(node_type());
        let c = Object::new(node_type());
        b.set("Next", &c);
        c.set("Next", &b);

        let report = run(&Value::from(&a), &Value::from(&b));
        assert_eq!(paths(&report), vec!["Next"]);
        assert!(report.failures()[0].message.contains("cyclic reference back to subject"));

        let reverse = run(&Value::from(&b), &Value::from(&a));
        assert!(!reverse.is_equivalent());
        a.clear();
        b.clear();
        c.clear();
    }

    #[test]
    fn test_depth_cap_reports_once() {
        fn chain(len: usize) -> Value {
            let ty = node_type();
            let mut next = Value::Null;
            for _ in 0..len {
                next = Value::object(ty.clone(), [("Next", next)]);
            }
            next
        }

        let options = EquivalencyOptions::default();
        let limit = options.max_depth();
        assert!(run(&chain(limit), &chain(limit)).is_equivalent());

        let report = run(&chain(limit + 1), &chain(limit + 1));
        assert_eq!(report.len(), 1);
        assert!(report.failures()[0]
            .message
            .starts_with("The maximum recursion depth of 10 levels was exceeded at subject.Next.Next"));
    }

    #[test]
    fn test_zero_depth_stops_at_root() {
        let options = EquivalencyOptions::builder().with_max_depth(0).build().unwrap();
        let report = run_with(&point(1, 2), &point(1, 2), &options);
        assert_eq!(report.len(), 1);
        assert!(run_with(&Value::from(1), &Value::from(1), &options).is_equivalent());
    }

    #[test]
    fn test_conversions() {
        assert!(run(&Value::from(1), &Value::from(1.0)).is_equivalent());
        assert!(run(&Value::from(1u64), &Value::from(1)).is_equivalent());

        let report = run(&Value::from("1"), &Value::from(1));
        assert!(report.failures()[0].message.contains("of type string"));

        let auto = EquivalencyOptions::builder().with_auto_conversion().build().unwrap();
        assert!(run_with(&Value::from("1"), &Value::from(1), &auto).is_equivalent());
        assert!(run_with(&Value::from(1), &Value::from("1"), &auto).is_equivalent());

        let report = run_with(&Value::from("x"), &Value::from(1), &auto);
        assert!(report.failures()[0].message.contains("cannot be converted: \"x\" cannot be parsed as i64"));

        let none = EquivalencyOptions::builder().with_conversions(Vec::new()).build().unwrap();
        assert!(!run_with(&Value::from(1), &Value::from(1.0), &none).is_equivalent());
    }

    #[test]
    fn test_enum_handling() {
        let red = Value::from(EnumValue::new("Color", "Red", 1));
        let rouge = Value::from(EnumValue::new("Couleur", "Rouge", 1));
        assert!(run(&rouge, &red).is_equivalent());

        let by_name = EquivalencyOptions::builder().comparing_enums_by_name().build().unwrap();
        assert!(!run_with(&rouge, &red, &by_name).is_equivalent());
        assert!(run_with(&Value::from("Red"), &red, &by_name).is_equivalent());
        assert!(run(&Value::from(1), &red).is_equivalent());
    }

    #[test]
    fn test_value_types_use_equality() {
        fn same_amount(a: &Object, b: &Object) -> bool {
            a.get("Amount").and_then(|v| v.to_key()) == b.get("Amount").and_then(|v| v.to_key())
        }
        let money = TypeDescriptor::builder("Money")
            .property("Amount")
            .property("Note")
            .equality(same_amount)
            .build();
        let a = Value::object(money.clone(), [("Amount", Value::from(5)), ("Note", Value::from("x"))]);
        let b = Value::object(money, [("Amount", Value::from(5)), ("Note", Value::from("y"))]);
        assert!(run(&a, &b).is_equivalent());
    }

    #[test]
    fn test_compare_by_value_without_equality_uses_identity() {
        let options = EquivalencyOptions::builder().comparing_by_value("Point").build().unwrap();
        let shared = point(1, 2);
        assert!(run_with(&shared, &shared, &options).is_equivalent());
        assert!(!run_with(&point(1, 2), &point(1, 2), &options).is_equivalent());
    }

    #[test]
    fn test_declared_type_limits_members() {
        let shape = TypeDescriptor::builder("Shape").property("Id").build();
        let circle = TypeDescriptor::builder("Circle").property("Radius").base(shape.clone()).build();
        let holder = TypeDescriptor::builder("Holder")
            .member(MemberDescriptor::property("Item").with_declared_type(shape))
            .build();
        let make = |radius: i64| {
            Value::object(
                holder.clone(),
                [("Item", Value::object(circle.clone(), [("Id", 1), ("Radius", radius)]))],
            )
        };
        assert!(run(&make(1), &make(2)).is_equivalent());

        let runtime = EquivalencyOptions::builder().respecting_runtime_types().build().unwrap();
        let report = run_with(&make(1), &make(2), &runtime);
        assert_eq!(paths(&report), vec!["Item.Radius"]);
    }

    #[test]
    fn test_string_mismatch_messages() {
        let report = run(&Value::from("abc "), &Value::from("abc"));
        assert_eq!(
            report.failures()[0].message,
            "Expected subject to be \"abc\", but it has unexpected trailing whitespace."
        );

        let options = EquivalencyOptions::builder().ignoring_case().build().unwrap();
        assert!(run_with(&Value::from("ABC"), &Value::from("abc"), &options).is_equivalent());
    }

    #[test]
    fn test_custom_comparer_decides_node() {
        let options = EquivalencyOptions::builder()
            .using(ComparerRule::for_kind(ValueKind::Float, ApproximateComparer::new(0.01)))
            .build()
            .unwrap();
        assert!(run_with(&Value::from(1.001), &Value::from(1.0), &options).is_equivalent());
        let report = run_with(&Value::from(1.5), &Value::from(1.0), &options);
        assert_eq!(
            report.failures()[0].message,
            "Expected subject to be 1.0, but found 1.5 (it differs by more than 0.01)."
        );
    }

    #[test]
    fn test_custom_comparer_for_type() {
        let options = EquivalencyOptions::builder()
            .using(ComparerRule::for_type("Point", |s: &Value, e: &Value| {
                Comparison::check(s.type_name() == e.type_name(), "type differs")
            }))
            .build()
            .unwrap();
        assert!(run_with(&point(1, 2), &point(9, 9), &options).is_equivalent());
    }

    #[test]
    fn test_unreachable_comparer_is_config_error() {
        let options = EquivalencyOptions::builder()
            .using(ComparerRule::for_type("Ghost", ApproximateComparer::new(0.1)))
            .build()
            .unwrap();
        let err = validate(&point(1, 2), &point(1, 2), &options).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnreachableComparer {
                type_name: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn test_empty_selection_is_config_error() {
        let options = EquivalencyOptions::builder().excluding("X").excluding("Y").build().unwrap();
        let err = validate(&point(1, 2), &point(1, 2), &options).unwrap_err();
        assert!(matches!(err, ConfigError::NoMembers { .. }));

        let nested = EquivalencyOptions::builder().excluding("Inner.Only").build().unwrap();
        let leaf = TypeDescriptor::builder("Leaf").property("Only").build();
        let outer = TypeDescriptor::builder("Outer").property("Inner").build();
        let value = Value::object(outer, [("Inner", Value::object(leaf, [("Only", 1)]))]);
        let err = validate(&value, &value, &nested).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NoMembers {
                type_name: "Leaf".to_string(),
                path: "subject.Inner".to_string(),
            }
        );
    }

    #[test]
    fn test_stop_on_first_failure() {
        let options = EquivalencyOptions::builder()
            .with_strict_ordering()
            .stopping_on_first_failure()
            .build()
            .unwrap();
        let report = run_with(&Value::seq([1, 2, 3]), &Value::seq([4, 5, 6]), &options);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_broken_formatter_does_not_abort() {
        struct Broken;
        impl ValueFormatter for Broken {
            fn format(&self, _value: &Value) -> Result<String, FormatError> {
                Err(FormatError::Failed {
                    reason: "broken".to_string(),
                })
            }
        }
        let options = EquivalencyOptions::builder().with_formatter(Arc::new(Broken)).build().unwrap();
        let report = run_with(&Value::from(2), &Value::from(1), &options);
        assert_eq!(
            report.failures()[0].message,
            "Expected subject to be <unformattable>, but found <unformattable>."
        );
    }

    #[test]
    fn test_report_is_idempotent() {
        let options = EquivalencyOptions::builder().with_strict_ordering().build().unwrap();
        let subject = Value::seq([1, 2, 3]);
        let expectation = Value::seq([3, 2, 1]);
        let first = run_with(&subject, &expectation, &options).render();
        let second = run_with(&subject, &expectation, &options).render();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(first.unwrap().contains("With configuration:"));
    }

    #[test]
    fn test_differing_whitespace_reports_divergence() {
        let report = run(&Value::from("abc "), &Value::from("abc\t"));
        let message = &report.failures()[0].message;
        assert!(message.ends_with("(index 3)."), "{}", message);
        assert!(!message.contains("whitespace"));
    }

    #[test]
    fn test_tolerance_keeps_nan_reflexive() {
        let options = EquivalencyOptions::builder()
            .using(ComparerRule::for_kind(ValueKind::Float, ApproximateComparer::new(0.1)))
            .build()
            .unwrap();
        let nan = Value::from(f64::NAN);
        assert!(run_with(&nan, &nan, &options).is_equivalent());
        assert!(run_with(&Value::seq([f64::NAN, 1.0]), &Value::seq([1.05, f64::NAN]), &options).is_equivalent());
    }

    fn shared_leaves(value: i64) -> Value {
        let leaf_type = TypeDescriptor::builder("Leaf").property("Value").build();
        let pair_type = TypeDescriptor::builder("Pair").property("Left").property("Right").build();
        let leaf = Value::object(leaf_type, [("Value", value)]);
        Value::object(pair_type, [("Left", leaf.clone()), ("Right", leaf)])
    }

    #[test]
    fn test_tracker_balanced_after_failed_sibling() {
        let options = EquivalencyOptions::default();
        let mut traversal = Traversal::new(&options);
        traversal
            .compare(&ComparisonNode::root(shared_leaves(1), shared_leaves(2)))
            .unwrap();
        assert_eq!(traversal.tracker.depth(), 0);

        let records = traversal.diagnostics.into_records();
        let failed: Vec<String> = records.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(failed, vec!["Left.Value", "Right.Value"]);
        assert!(records.iter().all(|r| !r.message.contains("cyclic")));
    }

    #[test]
    fn test_tracker_balanced_after_config_error() {
        let options = EquivalencyOptions::builder().excluding("Left.Value").build().unwrap();
        let mut traversal = Traversal::new(&options);
        let err = traversal
            .compare(&ComparisonNode::root(shared_leaves(1), shared_leaves(1)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoMembers { .. }));
        assert_eq!(traversal.tracker.depth(), 0);
    }

    #[test]
    fn test_unreadable_subject_member_is_mismatch() {
        let gadget = TypeDescriptor::builder("Gadget")
            .member(MemberDescriptor::property("Sink").write_only())
            .build();
        let device = TypeDescriptor::builder("Device").property("Sink").build();
        let subject = Value::object(gadget, [("Sink", 1)]);
        let expectation = Value::object(device, [("Sink", 1)]);

        let report = run(&subject, &expectation);
        assert_eq!(paths(&report), vec!["Sink"]);
        assert_eq!(
            report.failures()[0].message,
            "Expected subject.Sink to be 1, but it cannot be read: Member Gadget.Sink is not readable."
        );
    }

    #[test]
    fn test_enum_handling_is_symmetric() {
        let red = Value::from(EnumValue::new("Color", "Red", 1));
        assert!(run(&red, &Value::from(1)).is_equivalent());
        assert_eq!(
            run(&red, &Value::from(2)).failures()[0].message,
            "Expected subject to be 2, but found Color.Red(1)."
        );

        let by_name = EquivalencyOptions::builder().comparing_enums_by_name().build().unwrap();
        assert!(run_with(&red, &Value::from("Red"), &by_name).is_equivalent());
        assert!(!run_with(&red, &Value::from("Blue"), &by_name).is_equivalent());

        let report = run(&red, &Value::from("Red"));
        assert!(report.failures()[0].message.contains("of type string"));
    }

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            (-1.0e6..1.0e6f64).prop_map(serde_json::Value::from),
            "[a-z ]{0,6}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
                proptest::collection::btree_map("[a-z]{1,4}", inner, 1..4)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_reflexive(json in arb_json()) {
            let a = from_json(&json, JsonObjectMode::Structured);
            let b = from_json(&json, JsonObjectMode::Structured);
            prop_assert!(run(&a, &a).is_equivalent());
            prop_assert!(run(&a, &b).is_equivalent());
        }

        #[test]
        fn prop_unordered_permutation(items in proptest::collection::vec(0i64..5, 0..8).prop_shuffle()) {
            let mut sorted = items.clone();
            sorted.sort_unstable();
            prop_assert!(run(&Value::seq(items), &Value::seq(sorted)).is_equivalent());
        }
    }
}

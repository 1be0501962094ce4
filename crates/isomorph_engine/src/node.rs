//! One step of a traversal.

use isomorph_core::{MapKey, MemberDescriptor, Path, TypeDescriptor, Value};
use std::sync::Arc;

/// A subject/expectation pair at a path
#[derive(Debug, Clone)]
pub struct ComparisonNode {
    /// Path from the root
    pub path: Path,
    /// Value under test
    pub subject: Value,
    /// Value it should be equivalent to
    pub expectation: Value,
    /// Statically declared type at this point, if known
    pub compile_time_type: Option<Arc<TypeDescriptor>>,
    /// Distance from the root
    pub depth: usize,
}

impl ComparisonNode {
    /// Root node; the declared type is the expectation's own type
    #[must_use]
    pub fn root(subject: Value, expectation: Value) -> Self {
        let compile_time_type = expectation.as_object().map(|o| Arc::clone(o.descriptor()));
        Self {
            path: Path::root(),
            subject,
            expectation,
            compile_time_type,
            depth: 0,
        }
    }

    fn child(&self, path: Path, subject: Value, expectation: Value) -> Self {
        Self {
            path,
            subject,
            expectation,
            compile_time_type: None,
            depth: self.depth + 1,
        }
    }

    /// Child node for a collection element
    #[must_use]
    pub fn element(&self, index: usize, subject: Value, expectation: Value) -> Self {
        self.child(self.path.index(index), subject, expectation)
    }

    /// Child node for a dictionary entry
    #[must_use]
    pub fn entry(&self, key: &MapKey, subject: Value, expectation: Value) -> Self {
        self.child(self.path.key(key), subject, expectation)
    }

    /// Child node for a member, carrying the member's declared type
    #[must_use]
    pub fn member(&self, member: &MemberDescriptor, subject: Value, expectation: Value) -> Self {
        let mut node = self.child(self.path.member(member.name()), subject, expectation);
        node.compile_time_type = member.declared_type().cloned();
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_nodes_extend_path_and_depth() {
        let root = ComparisonNode::root(Value::seq([1]), Value::seq([1]));
        let child = root.element(0, Value::from(1), Value::from(1));
        assert_eq!(child.path.to_string(), "[0]");
        assert_eq!(child.depth, 1);

        let entry = child.entry(&MapKey::from("k"), Value::Null, Value::Null);
        assert_eq!(entry.path.to_string(), "[0][k]");
        assert_eq!(entry.depth, 2);
    }

    #[test]
    fn test_member_node_carries_declared_type() {
        let address = TypeDescriptor::builder("Address").property("Street").build();
        let member = MemberDescriptor::property("Home").with_declared_type(address);
        let ty = TypeDescriptor::builder("Person").member(member).build();
        let expectation = Value::object(ty.clone(), [("Home", Value::Null)]);

        let root = ComparisonNode::root(Value::Null, expectation);
        assert_eq!(root.compile_time_type.as_ref().map(|t| t.name()), Some("Person"));

        let home = ty.member("Home").unwrap();
        let child = root.member(home, Value::Null, Value::Null);
        assert_eq!(child.path.to_string(), "Home");
        assert_eq!(child.compile_time_type.as_ref().map(|t| t.name()), Some("Address"));
    }
}

//! Node classification.

use crate::options::EquivalencyOptions;
use isomorph_core::{TypeDescriptor, Value};
use std::fmt;

/// How a node is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Single equality check
    Primitive,
    /// Scalar string comparison
    String,
    /// Ordered collection of elements
    Collection,
    /// Keyed collection
    Dictionary,
    /// Member-by-member comparison
    Structured,
}

impl Classification {
    /// Whether nodes of this class are descended into
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Collection | Self::Dictionary | Self::Structured)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primitive => "a value",
            Self::String => "a string",
            Self::Collection => "a collection",
            Self::Dictionary => "a dictionary",
            Self::Structured => "an object",
        };
        f.write_str(name)
    }
}

/// Classifies nodes according to the options' value-type rules
#[derive(Debug, Clone, Copy)]
pub struct TypeMatcher<'a> {
    options: &'a EquivalencyOptions,
}

impl<'a> TypeMatcher<'a> {
    /// Create a matcher
    #[must_use]
    pub fn new(options: &'a EquivalencyOptions) -> Self {
        Self { options }
    }

    /// Classify a non-null value.
    ///
    /// An object is compared by value when either its declared type or its
    /// runtime type is a value type.
    #[must_use]
    pub fn classify(&self, compile_time_type: Option<&TypeDescriptor>, value: &Value) -> Classification {
        match value {
            Value::Str(_) => Classification::String,
            Value::Seq(_) => Classification::Collection,
            Value::Map(_) => Classification::Dictionary,
            Value::Object(obj) => {
                let declared_by_value = compile_time_type.is_some_and(|ty| self.options.is_value_type(ty));
                if declared_by_value || self.options.is_value_type(obj.descriptor()) {
                    Classification::Primitive
                } else {
                    Classification::Structured
                }
            }
            _ => Classification::Primitive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isomorph_core::{EnumValue, Object};

    fn money_eq(a: &Object, b: &Object) -> bool {
        a.get("Amount").and_then(|v| v.to_key()) == b.get("Amount").and_then(|v| v.to_key())
    }

    #[test]
    fn test_scalars_and_collections() {
        let options = EquivalencyOptions::default();
        let matcher = TypeMatcher::new(&options);
        assert_eq!(matcher.classify(None, &Value::from(1)), Classification::Primitive);
        assert_eq!(
            matcher.classify(None, &Value::from(EnumValue::new("Color", "Red", 0))),
            Classification::Primitive
        );
        assert_eq!(matcher.classify(None, &Value::from("s")), Classification::String);
        assert_eq!(matcher.classify(None, &Value::seq([1])), Classification::Collection);
        assert_eq!(matcher.classify(None, &Value::map([("a", 1)])), Classification::Dictionary);
    }

    #[test]
    fn test_objects() {
        let options = EquivalencyOptions::default();
        let matcher = TypeMatcher::new(&options);

        let plain = TypeDescriptor::builder("Order").property("Id").build();
        let value = Value::object(plain, [("Id", 1)]);
        assert_eq!(matcher.classify(None, &value), Classification::Structured);

        let money = TypeDescriptor::builder("Money")
            .property("Amount")
            .equality(money_eq)
            .build();
        let value = Value::object(money, [("Amount", 1)]);
        assert_eq!(matcher.classify(None, &value), Classification::Primitive);
    }

    #[test]
    fn test_declared_value_type() {
        let options = EquivalencyOptions::builder()
            .comparing_by_value("Shape")
            .build()
            .unwrap();
        let matcher = TypeMatcher::new(&options);
        let shape = TypeDescriptor::builder("Shape").property("Id").build();
        let other = TypeDescriptor::builder("Widget").property("Id").build();
        let value = Value::object(other, [("Id", 1)]);
        assert_eq!(matcher.classify(Some(&shape), &value), Classification::Primitive);
        assert_eq!(matcher.classify(None, &value), Classification::Structured);
        assert!(Classification::Dictionary.is_composite());
        assert_eq!(Classification::Structured.to_string(), "an object");
    }
}

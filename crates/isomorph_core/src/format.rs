//! Rendering values for diagnostics.

use crate::id::RefId;
use crate::value::Value;
use std::fmt;

/// Formatting error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Formatter does not support this kind of value
    Unsupported {
        /// Type name of the value
        type_name: String,
    },
    /// Formatter failed
    Failed {
        /// Reason
        reason: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { type_name } => write!(f, "Cannot format value of type {}", type_name),
            Self::Failed { reason } => write!(f, "Formatting failed: {}", reason),
        }
    }
}

impl std::error::Error for FormatError {}

/// Renders a value as a short diagnostic string
pub trait ValueFormatter: Send + Sync {
    /// Format a value
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be rendered
    fn format(&self, value: &Value) -> Result<String, FormatError>;
}

/// Default formatter with depth and item limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultFormatter {
    /// Nesting levels rendered before eliding with `…`
    pub max_depth: usize,
    /// Elements rendered per collection
    pub max_items: usize,
}

impl DefaultFormatter {
    /// Create a formatter with default limits
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 3,
            max_items: 8,
        }
    }

    /// Set the depth limit
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the per-collection item limit
    #[must_use]
    pub fn with_max_items(mut self, items: usize) -> Self {
        self.max_items = items;
        self
    }

    fn render(&self, value: &Value, depth: usize, active: &mut Vec<RefId>, out: &mut String) {
        if let Some(id) = value.ref_id() {
            if active.contains(&id) {
                out.push_str(&format!("{{Cyclic reference to {}}}", value.type_name()));
                return;
            }
        }

        match value {
            Value::Null => out.push_str("<null>"),
            Value::Bool(b) => out.push_str(&b.to_string()),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::UInt(u) => out.push_str(&u.to_string()),
            Value::Float(x) => out.push_str(&format!("{:?}", x)),
            Value::Char(c) => out.push_str(&format!("{:?}", c)),
            Value::Str(s) => out.push_str(&format!("{:?}", s)),
            Value::Enum(e) => {
                out.push_str(&format!("{}.{}({})", e.type_name, e.variant, e.discriminant));
            }
            Value::Seq(seq) => {
                let items = seq.items();
                self.render_items(
                    value,
                    depth,
                    active,
                    out,
                    items.len(),
                    items.iter().map(|item| (None, item.clone())),
                );
            }
            Value::Map(map) => {
                let entries = map.entries();
                self.render_items(
                    value,
                    depth,
                    active,
                    out,
                    entries.len(),
                    entries.into_iter().map(|(k, v)| (Some(k.to_value()), v)),
                );
            }
            Value::Object(obj) => {
                let name = obj.type_name().to_string();
                if depth >= self.max_depth {
                    out.push_str(&format!("{} {{ … }}", name));
                    return;
                }
                let members: Vec<(String, Value)> = obj
                    .descriptor()
                    .members()
                    .into_iter()
                    .filter_map(|m| m.get(obj).ok().map(|v| (m.name().to_string(), v)))
                    .collect();
                if members.is_empty() {
                    out.push_str(&format!("{} {{ }}", name));
                    return;
                }
                if let Some(id) = value.ref_id() {
                    active.push(id);
                }
                out.push_str(&name);
                out.push_str(" { ");
                for (i, (member, v)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(member);
                    out.push_str(" = ");
                    self.render(v, depth + 1, active, out);
                }
                out.push_str(" }");
                active.pop();
            }
        }
    }

    fn render_items<I>(
        &self,
        value: &Value,
        depth: usize,
        active: &mut Vec<RefId>,
        out: &mut String,
        len: usize,
        items: I,
    ) where
        I: Iterator<Item = (Option<Value>, Value)>,
    {
        if len == 0 {
            out.push_str("{empty}");
            return;
        }
        if depth >= self.max_depth {
            out.push_str(&format!("{{… {} item(s)}}", len));
            return;
        }
        if let Some(id) = value.ref_id() {
            active.push(id);
        }
        out.push('{');
        for (i, (key, item)) in items.take(self.max_items).enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(key) = key {
                out.push('[');
                self.render(&key, depth + 1, active, out);
                out.push_str("] = ");
            }
            self.render(&item, depth + 1, active, out);
        }
        if len > self.max_items {
            out.push_str(&format!(", …{} more", len - self.max_items));
        }
        out.push('}');
        active.pop();
    }
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueFormatter for DefaultFormatter {
    fn format(&self, value: &Value) -> Result<String, FormatError> {
        let mut out = String::new();
        self.render(value, 0, &mut Vec::new(), &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use crate::value::{EnumValue, Object};

    fn fmt(value: &Value) -> String {
        DefaultFormatter::new().format(value).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(fmt(&Value::Null), "<null>");
        assert_eq!(fmt(&Value::from(42)), "42");
        assert_eq!(fmt(&Value::from(1.0)), "1.0");
        assert_eq!(fmt(&Value::from("hi")), "\"hi\"");
        assert_eq!(fmt(&Value::from('x')), "'x'");
        assert_eq!(fmt(&Value::from(EnumValue::new("Color", "Red", 1))), "Color.Red(1)");
    }

    #[test]
    fn test_collections() {
        assert_eq!(fmt(&Value::seq([1, 2, 3])), "{1, 2, 3}");
        assert_eq!(fmt(&Value::seq(Vec::<i64>::new())), "{empty}");
        assert_eq!(fmt(&Value::map([("a", 1)])), "{[\"a\"] = 1}");
    }

    #[test]
    fn test_item_limit() {
        let formatter = DefaultFormatter::new().with_max_items(2);
        let out = formatter.format(&Value::seq([1, 2, 3, 4])).unwrap();
        assert_eq!(out, "{1, 2, …2 more}");
    }

    #[test]
    fn test_object() {
        let ty = TypeDescriptor::builder("Point").property("X").property("Y").build();
        let value = Value::object(ty, [("X", 1), ("Y", 2)]);
        assert_eq!(fmt(&value), "Point { X = 1, Y = 2 }");
    }

    #[test]
    fn test_cycle_marker() {
        let ty = TypeDescriptor::builder("Node").property("Next").build();
        let node = Object::new(ty);
        node.set("Next", &node);
        let out = fmt(&Value::from(&node));
        assert_eq!(out, "Node { Next = {Cyclic reference to Node} }");
        node.clear();
    }

    #[test]
    fn test_depth_limit() {
        let ty = TypeDescriptor::builder("Box").property("Inner").build();
        let inner = Value::object(ty.clone(), [("Inner", 1)]);
        let outer = Value::object(ty, [("Inner", inner)]);
        let formatter = DefaultFormatter::new().with_max_depth(1);
        assert_eq!(formatter.format(&outer).unwrap(), "Box { Inner = Box { … } }");
    }
}

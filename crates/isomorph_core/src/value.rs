//! Dynamic object graph values.
//!
//! Scalars are stored inline. Composites ([`Object`], [`Sequence`],
//! [`Dictionary`]) are shared behind `Arc` with interior mutability so a
//! graph can refer back to itself. Accessors hand out clones of the stored
//! values and never keep a lock across calls.

use crate::descriptor::TypeDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::id::RefId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Runtime kind of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// Absent value
    Null,
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Unsigned integer
    UInt,
    /// Floating point
    Float,
    /// Single character
    Char,
    /// String
    Str,
    /// Enumeration member
    Enum,
    /// Ordered collection
    Seq,
    /// Keyed collection
    Map,
    /// Structured object
    Object,
}

impl ValueKind {
    /// Name used in diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "i64",
            Self::UInt => "u64",
            Self::Float => "f64",
            Self::Char => "char",
            Self::Str => "string",
            Self::Enum => "enum",
            Self::Seq => "sequence",
            Self::Map => "dictionary",
            Self::Object => "object",
        }
    }

    /// Whether the kind is a number
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::Float)
    }

    /// Whether values of this kind have reference identity
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Seq | Self::Map | Self::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Member of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    /// Enumeration type name
    pub type_name: String,
    /// Variant name
    pub variant: String,
    /// Underlying numeric value
    pub discriminant: i64,
}

impl EnumValue {
    /// Create a new enum value
    #[must_use]
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>, discriminant: i64) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
            discriminant,
        }
    }
}

/// Dictionary key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapKey {
    /// Boolean key
    Bool(bool),
    /// Signed integer key
    Int(i64),
    /// Unsigned integer key
    UInt(u64),
    /// Character key
    Char(char),
    /// String key
    Str(String),
    /// Enum key
    Enum {
        /// Enumeration type name
        type_name: String,
        /// Variant name
        variant: String,
    },
}

impl MapKey {
    /// Key as a value
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::UInt(u) => Value::UInt(*u),
            Self::Char(c) => Value::Char(*c),
            Self::Str(s) => Value::Str(s.clone()),
            Self::Enum { type_name, variant } => {
                Value::Enum(EnumValue::new(type_name.clone(), variant.clone(), 0))
            }
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::UInt(u) => write!(f, "{}", u),
            Self::Char(c) => write!(f, "{}", c),
            Self::Str(s) => f.write_str(s),
            Self::Enum { type_name, variant } => write!(f, "{}.{}", type_name, variant),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for MapKey {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for MapKey {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<bool> for MapKey {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<char> for MapKey {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

/// Structured object: a runtime type plus member values
pub struct Object {
    descriptor: Arc<TypeDescriptor>,
    members: RwLock<IndexMap<String, Value>>,
}

impl Object {
    /// Create an object with no member values set
    #[must_use]
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            descriptor,
            members: RwLock::new(IndexMap::new()),
        })
    }

    /// Create an object with initial member values
    #[must_use]
    pub fn with_members<I, K, V>(descriptor: Arc<TypeDescriptor>, members: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let members = members
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Arc::new(Self {
            descriptor,
            members: RwLock::new(members),
        })
    }

    /// Runtime type
    #[must_use]
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Runtime type name
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Set a member value
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        write(&self.members).insert(name.into(), value.into());
    }

    /// Raw stored value, without consulting the descriptor
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        read(&self.members).get(name).cloned()
    }

    /// Read a member through the type descriptor
    ///
    /// # Errors
    ///
    /// Returns error if the type has no such member or it is not readable
    pub fn member_value(&self, name: &str) -> CoreResult<Value> {
        match self.descriptor.member(name) {
            Some(member) => member.get(self),
            None => Err(CoreError::UnknownMember {
                type_name: self.type_name().to_string(),
                member: name.to_string(),
            }),
        }
    }

    /// Drop all member values, breaking any cycles through this object
    pub fn clear(&self) {
        write(&self.members).clear();
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.descriptor.name())
            .field("members", &read(&self.members).len())
            .finish()
    }
}

/// Ordered collection
pub struct Sequence {
    element_type: Option<String>,
    items: RwLock<Vec<Value>>,
}

impl Sequence {
    /// Create a sequence
    #[must_use]
    pub fn new<I, V>(items: I) -> Arc<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Arc::new(Self {
            element_type: None,
            items: RwLock::new(items.into_iter().map(Into::into).collect()),
        })
    }

    /// Create an empty sequence with a declared element type
    #[must_use]
    pub fn typed(element_type: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            element_type: Some(element_type.into()),
            items: RwLock::new(Vec::new()),
        })
    }

    /// Declared element type name, if any
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    /// Append an element
    pub fn push(&self, value: impl Into<Value>) {
        write(&self.items).push(value.into());
    }

    /// Element at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    /// Snapshot of the elements
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        read(&self.items).clone()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    /// Whether the sequence is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all elements
    pub fn clear(&self) {
        write(&self.items).clear();
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("element_type", &self.element_type)
            .field("len", &self.len())
            .finish()
    }
}

/// Insertion-ordered keyed collection
pub struct Dictionary {
    entries: RwLock<IndexMap<MapKey, Value>>,
}

impl Dictionary {
    /// Create a dictionary
    #[must_use]
    pub fn new<I, K, V>(entries: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value>,
    {
        Arc::new(Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        })
    }

    /// Insert or replace an entry
    pub fn insert(&self, key: impl Into<MapKey>, value: impl Into<Value>) {
        write(&self.entries).insert(key.into(), value.into());
    }

    /// Value for `key`
    #[must_use]
    pub fn get(&self, key: &MapKey) -> Option<Value> {
        read(&self.entries).get(key).cloned()
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains_key(&self, key: &MapKey) -> bool {
        read(&self.entries).contains_key(key)
    }

    /// Keys in insertion order
    #[must_use]
    pub fn keys(&self) -> Vec<MapKey> {
        read(&self.entries).keys().cloned().collect()
    }

    /// Snapshot of the entries in insertion order
    #[must_use]
    pub fn entries(&self) -> Vec<(MapKey, Value)> {
        read(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    /// Whether the dictionary is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries
    pub fn clear(&self) {
        write(&self.entries).clear();
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary").field("len", &self.len()).finish()
    }
}

/// A node of an object graph
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point
    Float(f64),
    /// Character
    Char(char),
    /// String
    Str(String),
    /// Enumeration member
    Enum(EnumValue),
    /// Ordered collection
    Seq(Arc<Sequence>),
    /// Keyed collection
    Map(Arc<Dictionary>),
    /// Structured object
    Object(Arc<Object>),
}

impl Value {
    /// Build a structured object value
    #[must_use]
    pub fn object<I, K, V>(descriptor: Arc<TypeDescriptor>, members: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(Object::with_members(descriptor, members))
    }

    /// Build a sequence value
    #[must_use]
    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Seq(Sequence::new(items))
    }

    /// Build a dictionary value
    #[must_use]
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value>,
    {
        Self::Map(Dictionary::new(entries))
    }

    /// Runtime kind
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::UInt(_) => ValueKind::UInt,
            Self::Float(_) => ValueKind::Float,
            Self::Char(_) => ValueKind::Char,
            Self::Str(_) => ValueKind::Str,
            Self::Enum(_) => ValueKind::Enum,
            Self::Seq(_) => ValueKind::Seq,
            Self::Map(_) => ValueKind::Map,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Runtime type name: the descriptor or enum name, or the kind name
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Enum(e) => e.type_name.clone(),
            Self::Object(o) => o.type_name().to_string(),
            other => other.kind().name().to_string(),
        }
    }

    /// Whether the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Identity of a composite value
    #[must_use]
    pub fn ref_id(&self) -> Option<RefId> {
        match self {
            Self::Seq(s) => Some(RefId::of(s)),
            Self::Map(m) => Some(RefId::of(m)),
            Self::Object(o) => Some(RefId::of(o)),
            _ => None,
        }
    }

    /// Whether two values are the same shared allocation
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.ref_id(), other.ref_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// String contents
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object reference
    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<Object>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Sequence reference
    #[must_use]
    pub fn as_seq(&self) -> Option<&Arc<Sequence>> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Dictionary reference
    #[must_use]
    pub fn as_map(&self) -> Option<&Arc<Dictionary>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Scalar value as a dictionary key
    #[must_use]
    pub fn to_key(&self) -> Option<MapKey> {
        match self {
            Self::Bool(b) => Some(MapKey::Bool(*b)),
            Self::Int(i) => Some(MapKey::Int(*i)),
            Self::UInt(u) => Some(MapKey::UInt(*u)),
            Self::Char(c) => Some(MapKey::Char(*c)),
            Self::Str(s) => Some(MapKey::Str(s.clone())),
            Self::Enum(e) => Some(MapKey::Enum {
                type_name: e.type_name.clone(),
                variant: e.variant.clone(),
            }),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Self::UInt(u64::from(u))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Self::Enum(e)
    }
}

impl From<Arc<Object>> for Value {
    fn from(o: Arc<Object>) -> Self {
        Self::Object(o)
    }
}

impl From<&Arc<Object>> for Value {
    fn from(o: &Arc<Object>) -> Self {
        Self::Object(Arc::clone(o))
    }
}

impl From<Arc<Sequence>> for Value {
    fn from(s: Arc<Sequence>) -> Self {
        Self::Seq(s)
    }
}

impl From<&Arc<Sequence>> for Value {
    fn from(s: &Arc<Sequence>) -> Self {
        Self::Seq(Arc::clone(s))
    }
}

impl From<Arc<Dictionary>> for Value {
    fn from(m: Arc<Dictionary>) -> Self {
        Self::Map(m)
    }
}

impl From<&Arc<Dictionary>> for Value {
    fn from(m: &Arc<Dictionary>) -> Self {
        Self::Map(Arc::clone(m))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

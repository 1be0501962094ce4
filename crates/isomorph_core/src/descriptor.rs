//! Type descriptors.
//!
//! A [`TypeDescriptor`] is the introspection capability the engine relies on:
//! it enumerates the members of a type and reads them from an [`Object`].
//! Descriptors are built once and shared behind `Arc`.

use crate::error::{CoreError, CoreResult};
use crate::value::{Object, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Equality override for value-semantic types
pub type EqualityFn = fn(&Object, &Object) -> bool;

/// Kind of member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Plain data field
    Field,
    /// Accessor-backed property
    Property,
}

/// Declared accessibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible inside the declaring assembly/crate
    Internal,
    /// Visible to derived types
    Protected,
    /// Visible to the declaring type only
    Private,
}

/// Describes one member of a type
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    name: String,
    kind: MemberKind,
    visibility: Visibility,
    is_static: bool,
    is_indexer: bool,
    readable: bool,
    declaring_type: String,
    declared_type: Option<Arc<TypeDescriptor>>,
}

impl MemberDescriptor {
    fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            is_static: false,
            is_indexer: false,
            readable: true,
            declaring_type: String::new(),
            declared_type: None,
        }
    }

    /// Public readable property
    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Property)
    }

    /// Public field
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Field)
    }

    /// Set visibility
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static
    #[must_use]
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as indexer
    #[must_use]
    pub fn as_indexer(mut self) -> Self {
        self.is_indexer = true;
        self
    }

    /// Mark as write-only
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Set the statically declared type of the member
    #[must_use]
    pub fn with_declared_type(mut self, declared: Arc<TypeDescriptor>) -> Self {
        self.declared_type = Some(declared);
        self
    }

    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member kind
    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Declared visibility
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the member is static
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the member is an indexer
    #[must_use]
    pub const fn is_indexer(&self) -> bool {
        self.is_indexer
    }

    /// Whether the member has a getter
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.readable
    }

    /// Name of the type that declares this member
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Statically declared type, if known
    #[must_use]
    pub fn declared_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.declared_type.as_ref()
    }

    /// Read the member from an instance.
    ///
    /// Unset members read as [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns error if the member is static, an indexer or write-only
    pub fn get(&self, object: &Object) -> CoreResult<Value> {
        if !self.readable || self.is_static || self.is_indexer {
            return Err(CoreError::NotReadable {
                type_name: object.type_name().to_string(),
                member: self.name.clone(),
            });
        }
        Ok(object.get(&self.name).unwrap_or(Value::Null))
    }
}

/// Describes a type: its name, members and equality semantics
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    namespace: Option<String>,
    members: Vec<MemberDescriptor>,
    equality: Option<EqualityFn>,
    base: Option<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Start building a descriptor
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            name: name.into(),
            namespace: None,
            members: Vec::new(),
            equality: None,
            base: None,
        }
    }

    /// Descriptor with public properties only, in the given order
    #[must_use]
    pub fn anonymous<I, S>(members: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        members
            .into_iter()
            .fold(Self::builder("<anonymous>"), |b, m| {
                b.member(MemberDescriptor::property(m))
            })
            .build()
    }

    /// Type name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, if any
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace-qualified name
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Members declared directly on this type
    #[must_use]
    pub fn own_members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// All members including inherited ones.
    ///
    /// Own members come first; base members shadowed by name are skipped.
    #[must_use]
    pub fn members(&self) -> Vec<&MemberDescriptor> {
        let mut all: Vec<&MemberDescriptor> = self.members.iter().collect();
        let mut base = self.base.as_deref();
        while let Some(parent) = base {
            for member in &parent.members {
                if !all.iter().any(|m| m.name == member.name) {
                    all.push(member);
                }
            }
            base = parent.base.as_deref();
        }
        all
    }

    /// Look up a member by name, searching base types
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        let mut current = Some(self);
        while let Some(ty) = current {
            if let Some(m) = ty.members.iter().find(|m| m.name == name) {
                return Some(m);
            }
            current = ty.base.as_deref();
        }
        None
    }

    /// Equality override, if the type declares one
    #[must_use]
    pub fn equality(&self) -> Option<EqualityFn> {
        self.equality
    }

    /// Whether the type overrides equality semantics
    #[must_use]
    pub fn overrides_equality(&self) -> bool {
        self.equality.is_some()
    }

    /// Base type, if any
    #[must_use]
    pub fn base(&self) -> Option<&Arc<TypeDescriptor>> {
        self.base.as_ref()
    }

    /// Whether this type is `name` or derives from it
    #[must_use]
    pub fn is_or_derives_from(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.name == name || ty.full_name() == name {
                return true;
            }
            current = ty.base.as_deref();
        }
        false
    }
}

/// Builder for [`TypeDescriptor`]
#[derive(Debug, Clone)]
pub struct TypeDescriptorBuilder {
    name: String,
    namespace: Option<String>,
    members: Vec<MemberDescriptor>,
    equality: Option<EqualityFn>,
    base: Option<Arc<TypeDescriptor>>,
}

impl TypeDescriptorBuilder {
    /// Set the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a member
    #[must_use]
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Add a public property
    #[must_use]
    pub fn property(self, name: impl Into<String>) -> Self {
        self.member(MemberDescriptor::property(name))
    }

    /// Add a public field
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.member(MemberDescriptor::field(name))
    }

    /// Override equality semantics
    #[must_use]
    pub fn equality(mut self, equality: EqualityFn) -> Self {
        self.equality = Some(equality);
        self
    }

    /// Derive from a base type
    #[must_use]
    pub fn base(mut self, base: Arc<TypeDescriptor>) -> Self {
        self.base = Some(base);
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Arc<TypeDescriptor> {
        let name = self.name;
        let members = self
            .members
            .into_iter()
            .map(|mut m| {
                m.declaring_type = name.clone();
                m
            })
            .collect();
        Arc::new(TypeDescriptor {
            name,
            namespace: self.namespace,
            members,
            equality: self.equality,
            base: self.base,
        })
    }

    /// Finish building, rejecting duplicate or empty member names
    ///
    /// # Errors
    ///
    /// Returns error if a member name is empty or declared twice
    pub fn try_build(self) -> CoreResult<Arc<TypeDescriptor>> {
        for (i, member) in self.members.iter().enumerate() {
            if member.name.is_empty() {
                return Err(CoreError::InvalidDescriptor {
                    type_name: self.name.clone(),
                    reason: "empty member name".to_string(),
                });
            }
            if self.members[..i].iter().any(|m| m.name == member.name) {
                return Err(CoreError::InvalidDescriptor {
                    type_name: self.name.clone(),
                    reason: format!("member {} declared twice", member.name),
                });
            }
        }
        Ok(self.build())
    }
}

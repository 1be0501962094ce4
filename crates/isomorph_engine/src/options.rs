//! Equivalency configuration.
//!
//! [`EquivalencyOptions`] is immutable once built and cheap to clone; every
//! node of a run reads the same instance and independent runs may share it
//! across threads.

use crate::comparer::{ComparerRule, RuleTarget};
use crate::convert::ConversionRule;
use crate::error::ConfigError;
use isomorph_core::{DefaultFormatter, Path, TypeDescriptor, Value, ValueFormatter, Visibility};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default maximum recursion depth
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Namespaces whose types are compared by value by default
const SYSTEM_NAMESPACES: [&str; 4] = ["System", "core", "std", "alloc"];

/// Predicate deciding whether a type is compared with equality
pub type ValueTypePredicate = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

/// What to do with a cycle that occurs identically in both graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclicReferenceHandling {
    /// Treat the revisited pair as equivalent
    #[default]
    Ignore,
    /// Report the cycle as a mismatch
    Fail,
}

/// How enum values are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumHandling {
    /// Compare discriminants
    #[default]
    ByValue,
    /// Compare variant names
    ByName,
}

/// String comparison relaxations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StringOptions {
    /// Compare case-insensitively
    pub ignore_case: bool,
    /// Ignore whitespace at the start
    pub ignore_leading_whitespace: bool,
    /// Ignore whitespace at the end
    pub ignore_trailing_whitespace: bool,
    /// Treat `\r\n`, `\r` and `\n` alike
    pub ignore_newline_style: bool,
}

/// Which member kinds are selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKinds {
    /// Select fields
    pub fields: bool,
    /// Select properties
    pub properties: bool,
}

impl Default for MemberKinds {
    fn default() -> Self {
        Self {
            fields: true,
            properties: true,
        }
    }
}

/// Immutable comparison configuration
#[derive(Clone)]
pub struct EquivalencyOptions {
    include_members: Vec<String>,
    exclude_members: Vec<String>,
    order_sensitive: bool,
    strict_ordering_for: Vec<String>,
    shared_members_only: bool,
    max_depth: usize,
    value_type_predicate: Option<ValueTypePredicate>,
    compare_by_value: Vec<String>,
    comparers: Vec<ComparerRule>,
    respect_runtime_types: bool,
    member_kinds: MemberKinds,
    include_internal: bool,
    enum_handling: EnumHandling,
    conversions: Vec<ConversionRule>,
    string_options: StringOptions,
    cyclic_references: CyclicReferenceHandling,
    stop_on_first_failure: bool,
    root_name: String,
    formatter: Arc<dyn ValueFormatter>,
}

impl EquivalencyOptions {
    /// Start building options
    #[must_use]
    pub fn builder() -> EquivalencyOptionsBuilder {
        EquivalencyOptionsBuilder::new()
    }

    /// Explicit include rules
    #[must_use]
    pub fn include_members(&self) -> &[String] {
        &self.include_members
    }

    /// Explicit exclude rules
    #[must_use]
    pub fn exclude_members(&self) -> &[String] {
        &self.exclude_members
    }

    /// Whether collections are compared index-for-index everywhere
    #[must_use]
    pub fn order_sensitive_collections(&self) -> bool {
        self.order_sensitive
    }

    /// Whether the collection at `path` is compared index-for-index
    #[must_use]
    pub fn is_order_sensitive(&self, path: &Path) -> bool {
        if self.order_sensitive {
            return true;
        }
        let member_path = path.member_path();
        let exact = path.to_string();
        self.strict_ordering_for
            .iter()
            .any(|p| *p == member_path || *p == exact)
    }

    /// Whether expectation members missing on the subject are skipped
    #[must_use]
    pub fn shared_members_only(&self) -> bool {
        self.shared_members_only
    }

    /// Composite nesting levels that may be expanded
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether `ty` is compared with equality rather than member by member
    #[must_use]
    pub fn is_value_type(&self, ty: &TypeDescriptor) -> bool {
        if self.compare_by_value.iter().any(|name| ty.is_or_derives_from(name)) {
            return true;
        }
        match &self.value_type_predicate {
            Some(predicate) => predicate(ty),
            None => default_is_value_type(ty),
        }
    }

    /// Registered custom comparers, in resolution order
    #[must_use]
    pub fn comparers(&self) -> &[ComparerRule] {
        &self.comparers
    }

    /// First comparer rule matching the node
    #[must_use]
    pub fn comparer_for(&self, expectation: &Value, path: &Path) -> Option<&ComparerRule> {
        self.comparers.iter().find(|rule| rule.matches(expectation, path))
    }

    /// Whether members are selected from runtime rather than declared types
    #[must_use]
    pub fn respect_runtime_types(&self) -> bool {
        self.respect_runtime_types
    }

    /// Selected member kinds
    #[must_use]
    pub fn member_kinds(&self) -> MemberKinds {
        self.member_kinds
    }

    /// Whether a member with this visibility counts as non-private
    #[must_use]
    pub fn is_visible(&self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Public | Visibility::Protected => true,
            Visibility::Internal => self.include_internal,
            Visibility::Private => false,
        }
    }

    /// Enum matching mode
    #[must_use]
    pub fn enum_handling(&self) -> EnumHandling {
        self.enum_handling
    }

    /// Enabled conversion rules
    #[must_use]
    pub fn conversions(&self) -> &[ConversionRule] {
        &self.conversions
    }

    /// String relaxations
    #[must_use]
    pub fn string_options(&self) -> StringOptions {
        self.string_options
    }

    /// In-tandem cycle handling
    #[must_use]
    pub fn cyclic_references(&self) -> CyclicReferenceHandling {
        self.cyclic_references
    }

    /// Whether diagnostics stop at the first failure
    #[must_use]
    pub fn stop_on_first_failure(&self) -> bool {
        self.stop_on_first_failure
    }

    /// Name of the root in messages
    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Formatter used to render values
    #[must_use]
    pub fn formatter(&self) -> &Arc<dyn ValueFormatter> {
        &self.formatter
    }

    /// Human-readable description of the options in effect, one line each
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(if self.respect_runtime_types {
            "Use runtime types and members".to_string()
        } else {
            "Use declared types and members".to_string()
        });
        lines.push(match self.enum_handling {
            EnumHandling::ByValue => "Compare enums by value".to_string(),
            EnumHandling::ByName => "Compare enums by name".to_string(),
        });
        let kinds = match (self.member_kinds.fields, self.member_kinds.properties) {
            (true, true) => "fields and properties",
            (true, false) => "fields",
            (false, true) => "properties",
            (false, false) => "no members",
        };
        lines.push(if self.include_internal {
            format!("Include all non-private {}", kinds)
        } else {
            format!("Include public and protected {}", kinds)
        });
        for name in &self.include_members {
            lines.push(format!("Include member {}", name));
        }
        for name in &self.exclude_members {
            lines.push(format!("Exclude member {}", name));
        }
        if self.shared_members_only {
            lines.push("Exclude members missing on the subject".to_string());
        }
        lines.push(if self.order_sensitive {
            "Compare collections with strict ordering".to_string()
        } else {
            "Compare collections without strict ordering".to_string()
        });
        for path in &self.strict_ordering_for {
            lines.push(format!("Use strict ordering for {}", path));
        }
        for name in &self.compare_by_value {
            lines.push(format!("Compare {} by value", name));
        }
        for rule in &self.comparers {
            lines.push(format!("Use a custom comparer for {}", rule.target()));
        }
        if !self.conversions.is_empty() {
            let rules: Vec<String> = self.conversions.iter().map(ToString::to_string).collect();
            lines.push(format!("Convert values using {}", rules.join(", ")));
        }
        let s = &self.string_options;
        if s.ignore_case {
            lines.push("Ignore case in strings".to_string());
        }
        if s.ignore_leading_whitespace {
            lines.push("Ignore leading whitespace in strings".to_string());
        }
        if s.ignore_trailing_whitespace {
            lines.push("Ignore trailing whitespace in strings".to_string());
        }
        if s.ignore_newline_style {
            lines.push("Ignore newline style in strings".to_string());
        }
        lines.push(match self.cyclic_references {
            CyclicReferenceHandling::Ignore => {
                "Accept cyclic references that occur in both graphs".to_string()
            }
            CyclicReferenceHandling::Fail => "Fail on cyclic references".to_string(),
        });
        lines.push(format!("Stop at a recursion depth of {} levels", self.max_depth));
        if self.stop_on_first_failure {
            lines.push("Stop at the first failure".to_string());
        }
        lines
    }
}

impl Default for EquivalencyOptions {
    fn default() -> Self {
        Self {
            include_members: Vec::new(),
            exclude_members: Vec::new(),
            order_sensitive: false,
            strict_ordering_for: Vec::new(),
            shared_members_only: false,
            max_depth: DEFAULT_MAX_DEPTH,
            value_type_predicate: None,
            compare_by_value: Vec::new(),
            comparers: Vec::new(),
            respect_runtime_types: false,
            member_kinds: MemberKinds::default(),
            include_internal: true,
            enum_handling: EnumHandling::default(),
            conversions: ConversionRule::DEFAULT.to_vec(),
            string_options: StringOptions::default(),
            cyclic_references: CyclicReferenceHandling::default(),
            stop_on_first_failure: false,
            root_name: "subject".to_string(),
            formatter: Arc::new(DefaultFormatter::new()),
        }
    }
}

impl fmt::Debug for EquivalencyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquivalencyOptions")
            .field("include_members", &self.include_members)
            .field("exclude_members", &self.exclude_members)
            .field("order_sensitive", &self.order_sensitive)
            .field("strict_ordering_for", &self.strict_ordering_for)
            .field("shared_members_only", &self.shared_members_only)
            .field("max_depth", &self.max_depth)
            .field("custom_value_types", &self.value_type_predicate.is_some())
            .field("compare_by_value", &self.compare_by_value)
            .field("comparers", &self.comparers)
            .field("respect_runtime_types", &self.respect_runtime_types)
            .field("member_kinds", &self.member_kinds)
            .field("include_internal", &self.include_internal)
            .field("enum_handling", &self.enum_handling)
            .field("conversions", &self.conversions)
            .field("string_options", &self.string_options)
            .field("cyclic_references", &self.cyclic_references)
            .field("stop_on_first_failure", &self.stop_on_first_failure)
            .field("root_name", &self.root_name)
            .finish_non_exhaustive()
    }
}

/// Default value-type rule: equality overrides and system namespaces
#[must_use]
pub fn default_is_value_type(ty: &TypeDescriptor) -> bool {
    if ty.overrides_equality() {
        return true;
    }
    ty.namespace().is_some_and(|ns| {
        SYSTEM_NAMESPACES
            .iter()
            .any(|sys| ns == *sys || ns.strip_prefix(sys).is_some_and(|rest| rest.starts_with('.')))
    })
}

/// Builder for [`EquivalencyOptions`]
pub struct EquivalencyOptionsBuilder {
    options: EquivalencyOptions,
    max_depth: i64,
}

impl EquivalencyOptionsBuilder {
    /// Builder starting from the defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: EquivalencyOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH as i64,
        }
    }

    /// Only compare the named member (name or dotted path)
    #[must_use]
    pub fn including(mut self, member: impl Into<String>) -> Self {
        self.options.include_members.push(member.into());
        self
    }

    /// Skip the named member (name or dotted path)
    #[must_use]
    pub fn excluding(mut self, member: impl Into<String>) -> Self {
        self.options.exclude_members.push(member.into());
        self
    }

    /// Compare every collection index-for-index
    #[must_use]
    pub fn with_strict_ordering(mut self) -> Self {
        self.options.order_sensitive = true;
        self
    }

    /// Compare collections as multisets
    #[must_use]
    pub fn without_strict_ordering(mut self) -> Self {
        self.options.order_sensitive = false;
        self
    }

    /// Compare the collection at `path` index-for-index
    #[must_use]
    pub fn with_strict_ordering_for(mut self, path: impl Into<String>) -> Self {
        self.options.strict_ordering_for.push(path.into());
        self
    }

    /// Skip expectation members the subject does not have
    #[must_use]
    pub fn excluding_missing_members(mut self) -> Self {
        self.options.shared_members_only = true;
        self
    }

    /// Set the maximum recursion depth; negative values are rejected by [`build`](Self::build)
    #[must_use]
    pub fn with_max_depth(mut self, depth: i64) -> Self {
        self.max_depth = depth;
        self
    }

    /// Replace the default value-type predicate
    #[must_use]
    pub fn with_value_types<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.options.value_type_predicate = Some(Arc::new(predicate));
        self
    }

    /// Compare the named type (and derived types) with equality
    #[must_use]
    pub fn comparing_by_value(mut self, type_name: impl Into<String>) -> Self {
        self.options.compare_by_value.push(type_name.into());
        self
    }

    /// Register a custom comparer; earlier registrations win
    #[must_use]
    pub fn using(mut self, rule: ComparerRule) -> Self {
        self.options.comparers.push(rule);
        self
    }

    /// Select members from runtime types
    #[must_use]
    pub fn respecting_runtime_types(mut self) -> Self {
        self.options.respect_runtime_types = true;
        self
    }

    /// Select members from declared types
    #[must_use]
    pub fn respecting_declared_types(mut self) -> Self {
        self.options.respect_runtime_types = false;
        self
    }

    /// Do not select fields
    #[must_use]
    pub fn excluding_fields(mut self) -> Self {
        self.options.member_kinds.fields = false;
        self
    }

    /// Do not select properties
    #[must_use]
    pub fn excluding_properties(mut self) -> Self {
        self.options.member_kinds.properties = false;
        self
    }

    /// Treat internal members as private
    #[must_use]
    pub fn excluding_internal_members(mut self) -> Self {
        self.options.include_internal = false;
        self
    }

    /// Match enums by variant name
    #[must_use]
    pub fn comparing_enums_by_name(mut self) -> Self {
        self.options.enum_handling = EnumHandling::ByName;
        self
    }

    /// Match enums by discriminant
    #[must_use]
    pub fn comparing_enums_by_value(mut self) -> Self {
        self.options.enum_handling = EnumHandling::ByValue;
        self
    }

    /// Enable every conversion rule
    #[must_use]
    pub fn with_auto_conversion(mut self) -> Self {
        self.options.conversions = ConversionRule::ALL.to_vec();
        self
    }

    /// Replace the enabled conversion rules
    #[must_use]
    pub fn with_conversions(mut self, rules: Vec<ConversionRule>) -> Self {
        self.options.conversions = rules;
        self
    }

    /// Replace the string relaxations
    #[must_use]
    pub fn with_string_options(mut self, string_options: StringOptions) -> Self {
        self.options.string_options = string_options;
        self
    }

    /// Compare strings case-insensitively
    #[must_use]
    pub fn ignoring_case(mut self) -> Self {
        self.options.string_options.ignore_case = true;
        self
    }

    /// Ignore leading whitespace in strings
    #[must_use]
    pub fn ignoring_leading_whitespace(mut self) -> Self {
        self.options.string_options.ignore_leading_whitespace = true;
        self
    }

    /// Ignore trailing whitespace in strings
    #[must_use]
    pub fn ignoring_trailing_whitespace(mut self) -> Self {
        self.options.string_options.ignore_trailing_whitespace = true;
        self
    }

    /// Treat all newline styles alike
    #[must_use]
    pub fn ignoring_newline_style(mut self) -> Self {
        self.options.string_options.ignore_newline_style = true;
        self
    }

    /// Set in-tandem cycle handling
    #[must_use]
    pub fn with_cyclic_references(mut self, handling: CyclicReferenceHandling) -> Self {
        self.options.cyclic_references = handling;
        self
    }

    /// Stop collecting after the first failure
    #[must_use]
    pub fn stopping_on_first_failure(mut self) -> Self {
        self.options.stop_on_first_failure = true;
        self
    }

    /// Name used for the root in messages
    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.options.root_name = name.into();
        self
    }

    /// Formatter used to render values
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.options.formatter = formatter;
        self
    }

    /// Validate and freeze the options
    ///
    /// # Errors
    ///
    /// Returns error on a negative depth, empty or conflicting member rules,
    /// an empty comparer type name, or when no member kind is selected
    pub fn build(self) -> Result<EquivalencyOptions, ConfigError> {
        let mut options = self.options;

        if self.max_depth < 0 {
            return Err(ConfigError::NegativeMaxDepth {
                depth: self.max_depth,
            });
        }
        options.max_depth = usize::try_from(self.max_depth).unwrap_or(usize::MAX);

        let names = options
            .include_members
            .iter()
            .chain(&options.exclude_members)
            .chain(&options.strict_ordering_for)
            .chain(&options.compare_by_value);
        if names.into_iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::EmptyName);
        }
        if let Some(name) = options
            .include_members
            .iter()
            .find(|n| options.exclude_members.contains(n))
        {
            return Err(ConfigError::ConflictingMemberRule { name: name.clone() });
        }
        let empty_target = options.comparers.iter().any(|rule| match rule.target() {
            RuleTarget::Type(name) | RuleTarget::Path(name) => name.trim().is_empty(),
            RuleTarget::Kind(_) => false,
        });
        if empty_target {
            return Err(ConfigError::EmptyName);
        }
        if !options.member_kinds.fields && !options.member_kinds.properties {
            return Err(ConfigError::NoMemberKinds);
        }
        if options.root_name.is_empty() {
            options.root_name = "subject".to_string();
        }

        Ok(options)
    }
}

impl Default for EquivalencyOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

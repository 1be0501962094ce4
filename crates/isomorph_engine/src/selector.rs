//! Member selection.
//!
//! Precedence: an include list restricts the selection to the named
//! members, an exclude list then removes members, and by default every
//! readable, non-static, non-indexer, non-private member of an enabled kind
//! is selected. Rules name either a bare member or a dotted member path with
//! indices removed (`Orders.Total`).

use crate::error::ConfigError;
use crate::options::EquivalencyOptions;
use isomorph_core::{MemberDescriptor, MemberKind, Path, TypeDescriptor};

/// Selects the comparable members of a type
#[derive(Debug, Clone, Copy)]
pub struct MemberSelector<'a> {
    options: &'a EquivalencyOptions,
}

impl<'a> MemberSelector<'a> {
    /// Create a selector
    #[must_use]
    pub fn new(options: &'a EquivalencyOptions) -> Self {
        Self { options }
    }

    /// Whether a member can be compared at all, before name rules
    #[must_use]
    pub fn is_comparable(&self, member: &MemberDescriptor) -> bool {
        self.is_instance_member(member) && member.is_readable()
    }

    fn is_instance_member(&self, member: &MemberDescriptor) -> bool {
        let kinds = self.options.member_kinds();
        let kind_enabled = match member.kind() {
            MemberKind::Field => kinds.fields,
            MemberKind::Property => kinds.properties,
        };
        kind_enabled
            && !member.is_static()
            && !member.is_indexer()
            && self.options.is_visible(member.visibility())
    }

    /// Members of `ty` to compare for a node at `parent`
    ///
    /// # Errors
    ///
    /// Returns error if the selection is empty
    pub fn select<'t>(
        &self,
        ty: &'t TypeDescriptor,
        parent: &Path,
    ) -> Result<Vec<&'t MemberDescriptor>, ConfigError> {
        let include = self.options.include_members();
        let exclude = self.options.exclude_members();

        let selected: Vec<&MemberDescriptor> = ty
            .members()
            .into_iter()
            .filter(|m| self.is_comparable(m))
            .filter(|m| {
                let member_path = parent.member(m.name()).member_path();
                let included = include.is_empty()
                    || include.iter().any(|rule| includes(rule, m.name(), &member_path));
                included && !exclude.iter().any(|rule| excludes(rule, m.name(), &member_path))
            })
            .collect();

        if selected.is_empty() {
            return Err(ConfigError::NoMembers {
                type_name: ty.full_name(),
                path: parent.describe(self.options.root_name()),
            });
        }
        Ok(selected)
    }

    /// Subject member matching an expectation member by name. Write-only
    /// members are found too; reading them fails.
    #[must_use]
    pub fn find_subject_member<'t>(
        &self,
        ty: &'t TypeDescriptor,
        name: &str,
    ) -> Option<&'t MemberDescriptor> {
        ty.member(name).filter(|m| self.is_instance_member(m))
    }
}

/// An include rule also keeps the ancestors of an included path so that
/// traversal can reach it, and everything below an included member.
fn includes(rule: &str, name: &str, member_path: &str) -> bool {
    rule == name
        || rule == member_path
        || is_below(rule, member_path)
        || is_below(member_path, rule)
}

fn excludes(rule: &str, name: &str, member_path: &str) -> bool {
    rule == name || rule == member_path || is_below(member_path, rule)
}

/// Whether `path` lies strictly below `ancestor`
fn is_below(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isomorph_core::Visibility;

    fn person() -> std::sync::Arc<TypeDescriptor> {
        TypeDescriptor::builder("Person")
            .property("Name")
            .field("Age")
            .property("Address")
            .member(MemberDescriptor::property("Secret").with_visibility(Visibility::Private))
            .member(MemberDescriptor::property("Assembly").with_visibility(Visibility::Internal))
            .member(MemberDescriptor::property("Count").as_static())
            .member(MemberDescriptor::property("Item").as_indexer())
            .member(MemberDescriptor::property("Sink").write_only())
            .build()
    }

    fn names(members: &[&MemberDescriptor]) -> Vec<String> {
        members.iter().map(|m| m.name().to_string()).collect()
    }

    #[test]
    fn test_default_selection() {
        let options = EquivalencyOptions::default();
        let ty = person();
        let selected = MemberSelector::new(&options).select(&ty, &Path::root()).unwrap();
        assert_eq!(names(&selected), vec!["Name", "Age", "Address", "Assembly"]);
    }

    #[test]
    fn test_excluding_internal_and_kinds() {
        let options = EquivalencyOptions::builder()
            .excluding_internal_members()
            .excluding_fields()
            .build()
            .unwrap();
        let ty = person();
        let selected = MemberSelector::new(&options).select(&ty, &Path::root()).unwrap();
        assert_eq!(names(&selected), vec!["Name", "Address"]);
    }

    #[test]
    fn test_include_restricts() {
        let options = EquivalencyOptions::builder().including("Name").build().unwrap();
        let ty = person();
        let selected = MemberSelector::new(&options).select(&ty, &Path::root()).unwrap();
        assert_eq!(names(&selected), vec!["Name"]);
    }

    #[test]
    fn test_nested_include_keeps_ancestor() {
        let options = EquivalencyOptions::builder()
            .including("Address.Street")
            .build()
            .unwrap();
        let selector = MemberSelector::new(&options);
        let ty = person();
        assert_eq!(names(&selector.select(&ty, &Path::root()).unwrap()), vec!["Address"]);

        let address = TypeDescriptor::builder("Address")
            .property("Street")
            .property("City")
            .build();
        let at = Path::root().member("Address");
        assert_eq!(names(&selector.select(&address, &at).unwrap()), vec!["Street"]);
    }

    #[test]
    fn test_exclude_by_name_and_path() {
        let options = EquivalencyOptions::builder()
            .excluding("Age")
            .excluding("Orders.Total")
            .build()
            .unwrap();
        let selector = MemberSelector::new(&options);
        let ty = person();
        assert_eq!(
            names(&selector.select(&ty, &Path::root()).unwrap()),
            vec!["Name", "Address", "Assembly"]
        );

        let order = TypeDescriptor::builder("Order").property("Id").property("Total").build();
        let at = Path::root().member("Orders").index(0);
        assert_eq!(names(&selector.select(&order, &at).unwrap()), vec!["Id"]);
        assert_eq!(
            names(&selector.select(&order, &Path::root()).unwrap()),
            vec!["Id", "Total"]
        );
    }

    #[test]
    fn test_empty_selection_is_error() {
        let options = EquivalencyOptions::builder().excluding("Only").build().unwrap();
        let ty = TypeDescriptor::builder("Single").property("Only").build();
        let err = MemberSelector::new(&options)
            .select(&ty, &Path::root().member("Child"))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NoMembers {
                type_name: "Single".to_string(),
                path: "subject.Child".to_string(),
            }
        );
    }

    #[test]
    fn test_find_subject_member_skips_private() {
        let options = EquivalencyOptions::default();
        let ty = person();
        let selector = MemberSelector::new(&options);
        assert!(selector.find_subject_member(&ty, "Name").is_some());
        assert!(selector.find_subject_member(&ty, "Secret").is_none());
        assert!(selector.find_subject_member(&ty, "Missing").is_none());
        assert!(selector.find_subject_member(&ty, "Count").is_none());
        assert!(selector.find_subject_member(&ty, "Sink").is_some());
    }
}

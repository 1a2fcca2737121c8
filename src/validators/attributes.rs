//! XSD Attribute declarations, uses and groups
//!
//! A complex type's declared attributes are an [`AttributeSet`] of uses and
//! attribute-group references. Once groups are final, the set is flattened
//! into the effective list of [`AttributeUse`]s and at most one wildcard.

use crate::error::CompileError;
use crate::namespaces::QName;
use crate::validators::grammar::{AttributeGroupId, TypeId};
use crate::validators::wildcards::Wildcard;

/// The `use` attribute of a local attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUseKind {
    /// May be absent
    #[default]
    Optional,
    /// Must be present
    Required,
    /// Must be absent
    Prohibited,
}

impl AttributeUseKind {
    /// Parse from the `use` attribute value
    pub fn parse(value: &str) -> Result<Self, CompileError> {
        match value.trim() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            other => Err(CompileError::invalid(format!(
                "invalid attribute use '{}'",
                other
            ))),
        }
    }
}

/// A top-level `xs:attribute`
#[derive(Debug, Clone)]
pub struct AttributeDeclaration {
    /// Qualified name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
}

/// An attribute as used by a complex type or attribute group
#[derive(Debug, Clone)]
pub struct AttributeUse {
    /// Qualified name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// required / optional / prohibited
    pub use_kind: AttributeUseKind,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
}

impl AttributeUse {
    /// Check if the attribute must be present
    pub fn is_required(&self) -> bool {
        self.use_kind == AttributeUseKind::Required
    }

    /// Check if the attribute must be absent
    pub fn is_prohibited(&self) -> bool {
        self.use_kind == AttributeUseKind::Prohibited
    }
}

/// One entry of a declared attribute set
#[derive(Debug, Clone)]
pub enum AttributeItem {
    /// A local or referenced attribute
    Use(AttributeUse),
    /// An `xs:attributeGroup ref=".."`
    Group(AttributeGroupId),
}

/// Attributes as declared, before attribute groups are expanded
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    /// Uses and group references in declaration order
    pub items: Vec<AttributeItem>,
    /// `xs:anyAttribute`
    pub wildcard: Option<Wildcard>,
}

impl AttributeSet {
    /// Attribute groups referenced directly
    pub fn group_refs(&self) -> impl Iterator<Item = AttributeGroupId> + '_ {
        self.items.iter().filter_map(|item| match item {
            AttributeItem::Group(id) => Some(*id),
            AttributeItem::Use(_) => None,
        })
    }
}

/// A named top-level `xs:attributeGroup`
#[derive(Debug, Clone)]
pub struct AttributeGroupDefinition {
    /// Qualified name
    pub name: QName,
    /// Declared content
    pub attributes: AttributeSet,
    /// Flattened uses, filled in once referenced groups are final
    pub uses: Vec<AttributeUse>,
    /// Effective wildcard after expansion
    pub wildcard: Option<Wildcard>,
}

/// Merge `uses` into `target`; a later use of the same name replaces the
/// earlier one, keeping its position
pub fn merge_uses(target: &mut Vec<AttributeUse>, uses: impl IntoIterator<Item = AttributeUse>) {
    for attribute in uses {
        match target.iter_mut().find(|existing| existing.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => target.push(attribute),
        }
    }
}

/// Combine two optional attribute wildcards by intersecting namespaces
pub fn merge_wildcards(a: Option<Wildcard>, b: Option<Wildcard>) -> Option<Wildcard> {
    match (a, b) {
        (None, w) | (w, None) => w,
        (Some(a), Some(b)) => Some(Wildcard {
            namespaces: a.namespaces.intersect(&b.namespaces),
            process_contents: a.process_contents,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::wildcards::NamespaceConstraint;

    fn attr(name: &str, use_kind: AttributeUseKind) -> AttributeUse {
        AttributeUse {
            name: QName::local(name),
            type_id: TypeId(1),
            use_kind,
            default: None,
            fixed: None,
        }
    }

    #[test]
    fn test_parse_use() {
        assert_eq!(AttributeUseKind::parse("required").unwrap(), AttributeUseKind::Required);
        assert!(AttributeUseKind::parse("mandatory").is_err());
    }

    #[test]
    fn test_merge_uses_replaces_by_name() {
        let mut uses = vec![
            attr("a", AttributeUseKind::Optional),
            attr("b", AttributeUseKind::Optional),
        ];
        merge_uses(
            &mut uses,
            vec![attr("a", AttributeUseKind::Prohibited), attr("c", AttributeUseKind::Required)],
        );
        let names: Vec<&str> = uses.iter().map(|u| u.name.local_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(uses[0].is_prohibited());
        assert!(uses[2].is_required());
    }

    #[test]
    fn test_merge_wildcards() {
        let any = Wildcard::default();
        let local = Wildcard {
            namespaces: NamespaceConstraint::parse("##local", None).unwrap(),
            ..Wildcard::default()
        };
        assert_eq!(merge_wildcards(None, Some(any.clone())), Some(any.clone()));
        let merged = merge_wildcards(Some(any), Some(local)).unwrap();
        assert!(merged.admits(None));
        assert!(!merged.admits(Some("urn:x")));
    }
}

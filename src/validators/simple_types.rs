//! XSD Simple Types
//!
//! A simple type is a built-in, a restriction of another simple type with
//! facets, a list of an item type, or a union of member types.

use crate::namespaces::QName;
use crate::validators::builtins::BuiltinType;
use crate::validators::facets::Facets;
use crate::validators::grammar::TypeId;

/// Variety of a simple type definition
#[derive(Debug, Clone)]
pub enum SimpleType {
    /// A built-in datatype
    Builtin(&'static BuiltinType),
    /// Restriction of a base type by facets
    Restriction {
        /// Base type; for simple content restrictions this may name a
        /// complex type until the definition is finalized
        base: TypeId,
        /// Compiled facets of this step
        facets: Facets,
    },
    /// Whitespace-separated list of items
    List {
        /// Item type
        item: TypeId,
    },
    /// Union of member types, tried in order
    Union {
        /// Member types
        members: Vec<TypeId>,
    },
}

/// A named or anonymous simple type definition
#[derive(Debug, Clone)]
pub struct SimpleTypeDefinition {
    /// Name; `None` for anonymous types
    pub name: Option<QName>,
    /// Variety
    pub variety: SimpleType,
}

impl SimpleTypeDefinition {
    /// Create a simple type definition
    pub fn new(name: Option<QName>, variety: SimpleType) -> Self {
        Self { name, variety }
    }

    /// Base type for derivation checks
    pub fn base(&self) -> Option<TypeId> {
        match &self.variety {
            SimpleType::Restriction { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Types this definition must wait for before it can be finalized
    pub fn dependencies(&self) -> Vec<TypeId> {
        match &self.variety {
            SimpleType::Builtin(_) => Vec::new(),
            SimpleType::Restriction { base, .. } => vec![*base],
            SimpleType::List { item } => vec![*item],
            SimpleType::Union { members } => members.clone(),
        }
    }
}

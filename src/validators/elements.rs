//! XSD Element declarations

use crate::namespaces::QName;
use crate::validators::grammar::{ElementId, TypeId};

/// A global or local element declaration
#[derive(Debug, Clone)]
pub struct ElementDeclaration {
    /// Qualified name
    pub name: QName,
    /// Declared type; `None` until the type is resolved from the
    /// substitution group head or defaults to anyType
    pub type_id: Option<TypeId>,
    /// Declared at top level
    pub global: bool,
    /// `nillable="true"`
    pub nillable: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// Head of the substitution group this element belongs to
    pub substitution_head: Option<ElementId>,
    /// Elements that may substitute this one, transitively
    pub substitutes: Vec<ElementId>,
}

impl ElementDeclaration {
    /// Create a declaration with default settings
    pub fn new(name: QName, global: bool) -> Self {
        Self {
            name,
            type_id: None,
            global,
            nillable: false,
            is_abstract: false,
            default: None,
            fixed: None,
            substitution_head: None,
            substitutes: Vec::new(),
        }
    }

    /// Value constraint applied to empty content
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }
}

//! XSD Complex Types
//!
//! A complex type holds both its declared parts (as written in the schema)
//! and the effective content model and attribute uses computed once its
//! base type is final.

use crate::namespaces::QName;
use crate::validators::attributes::{AttributeSet, AttributeUse};
use crate::validators::grammar::TypeId;
use crate::validators::particles::Particle;
use crate::validators::wildcards::{ProcessContents, Wildcard};

/// Derivation method from the base type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Derivation {
    /// Restriction (also the implicit derivation from anyType)
    #[default]
    Restriction,
    /// Extension
    Extension,
}

/// Effective content of a complex type
#[derive(Debug, Clone)]
pub enum ContentType {
    /// No children and no text
    Empty,
    /// Text only, typed by a simple type
    Simple(TypeId),
    /// Element content described by a particle; text allowed when mixed
    Elements(Particle),
    /// Anything (anyType): children are validated laxly
    Any,
}

impl ContentType {
    /// Check if the content is element-only or mixed
    pub fn has_particle(&self) -> bool {
        matches!(self, ContentType::Elements(_))
    }
}

/// Content as declared in the schema document
#[derive(Debug, Clone)]
pub enum DeclaredContent {
    /// A content model (implicit or complexContent); `None` when the type
    /// declares no model group
    Complex(Option<Particle>),
    /// simpleContent extension: the value type comes from the base
    SimpleExtension,
    /// simpleContent restriction: anonymous simple type restricting the
    /// base type's value type
    SimpleRestriction(TypeId),
}

/// A named or anonymous complex type definition
#[derive(Debug, Clone)]
pub struct ComplexTypeDefinition {
    /// Name; `None` for anonymous types
    pub name: Option<QName>,
    /// Base type; `None` only for anyType itself
    pub base: Option<TypeId>,
    /// How the type derives from its base
    pub derivation: Derivation,
    /// `mixed="true"`
    pub mixed: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// Declared content
    pub declared: DeclaredContent,
    /// Declared attributes
    pub declared_attributes: AttributeSet,
    /// Effective content
    pub content: ContentType,
    /// Effective attribute uses
    pub attribute_uses: Vec<AttributeUse>,
    /// Effective attribute wildcard
    pub attribute_wildcard: Option<Wildcard>,
}

impl ComplexTypeDefinition {
    /// A definition with nothing declared yet
    pub fn new(name: Option<QName>) -> Self {
        Self {
            name,
            base: None,
            derivation: Derivation::Restriction,
            mixed: false,
            is_abstract: false,
            declared: DeclaredContent::Complex(None),
            declared_attributes: AttributeSet::default(),
            content: ContentType::Empty,
            attribute_uses: Vec::new(),
            attribute_wildcard: None,
        }
    }

    /// The ur-type: any attributes, any content, mixed
    pub fn any_type() -> Self {
        let lax = Wildcard {
            process_contents: ProcessContents::Lax,
            ..Wildcard::default()
        };
        Self {
            mixed: true,
            content: ContentType::Any,
            attribute_wildcard: Some(lax.clone()),
            declared_attributes: AttributeSet {
                items: Vec::new(),
                wildcard: Some(lax),
            },
            ..Self::new(Some(QName::xsd("anyType")))
        }
    }

    /// Look up an effective attribute use by name
    pub fn attribute_use(&self, name: &QName) -> Option<&AttributeUse> {
        self.attribute_uses.iter().find(|u| &u.name == name)
    }
}

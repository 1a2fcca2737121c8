//! Compiled schema grammar
//!
//! Components live in per-kind arenas and refer to each other through typed
//! ids, so recursive content models need no reference counting. Each kind
//! has its own symbol table keyed by qualified name. Built-in types are
//! registered first under the XSD namespace.
//!
//! A [`Grammar`] is immutable once compiled and may be shared between
//! threads.

use crate::error::{ValidationError, ValueResult};
use crate::namespaces::QName;
use crate::validators::attributes::{AttributeDeclaration, AttributeGroupDefinition};
use crate::validators::builtins::{
    BuiltinType, Primitive, XsdValue, BUILTIN_TYPES, XSD_ANY_SIMPLE_TYPE,
};
use crate::validators::complex_types::{ComplexTypeDefinition, ContentType};
use crate::validators::elements::ElementDeclaration;
use crate::validators::facets::WhiteSpace;
use crate::validators::groups::ModelGroupDefinition;
use crate::validators::simple_types::{SimpleType, SimpleTypeDefinition};
use indexmap::IndexMap;

macro_rules! component_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Arena index
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

component_id!(
    /// Index of a type definition
    TypeId
);
component_id!(
    /// Index of an element declaration
    ElementId
);
component_id!(
    /// Index of a top-level attribute declaration
    AttributeId
);
component_id!(
    /// Index of a named model group
    GroupId
);
component_id!(
    /// Index of a named attribute group
    AttributeGroupId
);

/// A simple or complex type definition
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    /// Simple type
    Simple(SimpleTypeDefinition),
    /// Complex type
    Complex(ComplexTypeDefinition),
}

impl TypeDefinition {
    /// Name of the type, if it is not anonymous
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDefinition::Simple(s) => s.name.as_ref(),
            TypeDefinition::Complex(c) => c.name.as_ref(),
        }
    }

    /// Check if this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeDefinition::Simple(_))
    }

    /// Simple type definition, if this is one
    pub fn as_simple(&self) -> Option<&SimpleTypeDefinition> {
        match self {
            TypeDefinition::Simple(s) => Some(s),
            TypeDefinition::Complex(_) => None,
        }
    }

    /// Complex type definition, if this is one
    pub fn as_complex(&self) -> Option<&ComplexTypeDefinition> {
        match self {
            TypeDefinition::Complex(c) => Some(c),
            TypeDefinition::Simple(_) => None,
        }
    }
}

/// The compiled, immutable form of a schema
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) target_namespace: Option<String>,
    pub(crate) types: Vec<TypeDefinition>,
    pub(crate) elements: Vec<ElementDeclaration>,
    pub(crate) attributes: Vec<AttributeDeclaration>,
    pub(crate) groups: Vec<ModelGroupDefinition>,
    pub(crate) attribute_groups: Vec<AttributeGroupDefinition>,
    pub(crate) type_table: IndexMap<QName, TypeId>,
    pub(crate) element_table: IndexMap<QName, ElementId>,
    pub(crate) attribute_table: IndexMap<QName, AttributeId>,
    pub(crate) group_table: IndexMap<QName, GroupId>,
    pub(crate) attribute_group_table: IndexMap<QName, AttributeGroupId>,
    builtin_count: usize,
}

impl Grammar {
    /// Create a grammar holding only the built-in types
    pub(crate) fn new(target_namespace: Option<String>) -> Self {
        let mut grammar = Self {
            target_namespace,
            types: Vec::new(),
            elements: Vec::new(),
            attributes: Vec::new(),
            groups: Vec::new(),
            attribute_groups: Vec::new(),
            type_table: IndexMap::new(),
            element_table: IndexMap::new(),
            attribute_table: IndexMap::new(),
            group_table: IndexMap::new(),
            attribute_group_table: IndexMap::new(),
            builtin_count: 0,
        };

        grammar.push_type(TypeDefinition::Complex(ComplexTypeDefinition::any_type()));
        for builtin in BUILTIN_TYPES {
            grammar.push_type(TypeDefinition::Simple(SimpleTypeDefinition::new(
                Some(QName::xsd(builtin.name)),
                SimpleType::Builtin(builtin),
            )));
        }
        grammar.builtin_count = grammar.types.len();
        grammar
    }

    /// Allocate a type, registering it by name when it has one
    pub(crate) fn push_type(&mut self, definition: TypeDefinition) -> TypeId {
        let id = TypeId(self.types.len());
        if let Some(name) = definition.name() {
            self.type_table.insert(name.clone(), id);
        }
        self.types.push(definition);
        id
    }

    /// Allocate an element declaration without registering it
    pub(crate) fn push_element(&mut self, declaration: ElementDeclaration) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(declaration);
        id
    }

    pub(crate) fn type_mut(&mut self, id: TypeId) -> &mut TypeDefinition {
        &mut self.types[id.0]
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> &mut ElementDeclaration {
        &mut self.elements[id.0]
    }

    /// Number of components declared by schema documents
    pub(crate) fn component_count(&self) -> usize {
        self.types.len() - self.builtin_count
            + self.elements.len()
            + self.attributes.len()
            + self.groups.len()
            + self.attribute_groups.len()
    }

    /// Check if a type id refers to a built-in type
    pub fn is_builtin(&self, id: TypeId) -> bool {
        id.0 < self.builtin_count
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Target namespace of the main schema document
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Names of the global element declarations, in declaration order
    pub fn element_names(&self) -> impl Iterator<Item = &QName> {
        self.element_table.keys()
    }

    /// Names of the named types declared by the schema, in declaration order
    pub fn type_names(&self) -> impl Iterator<Item = &QName> {
        self.type_table.keys().skip(self.builtin_count)
    }

    /// Number of global element declarations
    pub fn element_count(&self) -> usize {
        self.element_table.len()
    }

    /// Number of named types declared by the schema
    pub fn type_count(&self) -> usize {
        self.type_table.len() - self.builtin_count
    }

    /// Look up a global element declaration
    pub fn lookup_element(&self, name: &QName) -> Option<ElementId> {
        self.element_table.get(name).copied()
    }

    /// Look up a named type, built-ins included
    pub fn lookup_type(&self, name: &QName) -> Option<TypeId> {
        self.type_table.get(name).copied()
    }

    /// Look up a global attribute declaration
    pub fn lookup_attribute(&self, name: &QName) -> Option<&AttributeDeclaration> {
        self.attribute_table
            .get(name)
            .map(|id| &self.attributes[id.0])
    }

    /// Element declaration by id
    pub fn element(&self, id: ElementId) -> &ElementDeclaration {
        &self.elements[id.0]
    }

    /// Type definition by id
    pub fn type_definition(&self, id: TypeId) -> &TypeDefinition {
        &self.types[id.0]
    }

    /// Named model group by id
    pub fn group(&self, id: GroupId) -> &ModelGroupDefinition {
        &self.groups[id.0]
    }

    /// The ur-type
    pub fn any_type(&self) -> TypeId {
        TypeId(0)
    }

    /// The simple ur-type, registered right after anyType
    pub fn any_simple_type(&self) -> TypeId {
        TypeId(1)
    }

    /// Effective type of an element declaration
    pub fn element_type(&self, id: ElementId) -> TypeId {
        self.elements[id.0].type_id.unwrap_or(TypeId(0))
    }

    /// Display name of a type, for messages
    pub fn type_display_name(&self, id: TypeId) -> String {
        match self.types[id.0].name() {
            Some(name) => name.to_string(),
            None => "anonymous type".to_string(),
        }
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Direct base of a type; anyType has none
    pub fn base_of(&self, id: TypeId) -> Option<TypeId> {
        match &self.types[id.0] {
            TypeDefinition::Complex(c) => c.base,
            TypeDefinition::Simple(s) => match &s.variety {
                SimpleType::Builtin(builtin) => match builtin.base_type {
                    Some(base) => self.lookup_type(&QName::xsd(base)),
                    None => Some(self.any_type()),
                },
                SimpleType::Restriction { base, .. } => Some(*base),
                SimpleType::List { .. } | SimpleType::Union { .. } => {
                    self.lookup_type(&QName::xsd(XSD_ANY_SIMPLE_TYPE))
                }
            },
        }
    }

    /// Check if `derived` is `base` or derives from it by any chain of
    /// restrictions and extensions
    pub fn derives_from(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = Some(derived);
        let mut steps = 0;
        while let Some(id) = current {
            if id == base {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.base_of(id);
        }
        false
    }

    /// Check if a type is abstract
    pub fn is_abstract_type(&self, id: TypeId) -> bool {
        matches!(&self.types[id.0], TypeDefinition::Complex(c) if c.is_abstract)
    }

    /// Nearest built-in ancestor reached through simple restrictions
    pub fn builtin_of(&self, id: TypeId) -> Option<&'static BuiltinType> {
        let mut current = id;
        for _ in 0..=self.types.len() {
            match &self.types[current.0] {
                TypeDefinition::Simple(s) => match &s.variety {
                    SimpleType::Builtin(builtin) => return Some(builtin),
                    SimpleType::Restriction { base, .. } => current = *base,
                    _ => return None,
                },
                TypeDefinition::Complex(c) => match &c.content {
                    ContentType::Simple(st) => current = *st,
                    _ => return None,
                },
            }
        }
        None
    }

    /// Primitive deciding which facets a restriction of `id` may use
    pub fn primitive_of(&self, id: TypeId) -> Primitive {
        let mut current = id;
        for _ in 0..=self.types.len() {
            match &self.types[current.0] {
                TypeDefinition::Simple(s) => match &s.variety {
                    SimpleType::Builtin(builtin) => return builtin.primitive,
                    SimpleType::Restriction { base, .. } => current = *base,
                    SimpleType::List { .. } => return Primitive::List,
                    SimpleType::Union { .. } => return Primitive::AnySimple,
                },
                TypeDefinition::Complex(c) => match &c.content {
                    ContentType::Simple(st) => current = *st,
                    _ => return Primitive::AnySimple,
                },
            }
        }
        Primitive::AnySimple
    }

    /// Effective whiteSpace of a simple type
    pub fn white_space_of(&self, id: TypeId) -> WhiteSpace {
        match &self.types[id.0] {
            TypeDefinition::Simple(s) => match &s.variety {
                SimpleType::Builtin(builtin) => builtin.white_space,
                SimpleType::Restriction { base, facets } => facets
                    .white_space
                    .unwrap_or_else(|| self.white_space_of(*base)),
                SimpleType::List { .. } => WhiteSpace::Collapse,
                SimpleType::Union { .. } => WhiteSpace::Preserve,
            },
            TypeDefinition::Complex(c) => match &c.content {
                ContentType::Simple(st) => self.white_space_of(*st),
                _ => WhiteSpace::Preserve,
            },
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Validate a lexical value against a simple type (or the value type
    /// of a complex type with simple content)
    pub fn validate_value(&self, id: TypeId, raw: &str) -> ValueResult<XsdValue> {
        match &self.types[id.0] {
            TypeDefinition::Simple(s) => match &s.variety {
                SimpleType::Builtin(builtin) => builtin.validate(raw),
                SimpleType::Restriction { base, facets } => {
                    let normalized = self.white_space_of(id).normalize(raw);
                    let value = self.validate_value(*base, &normalized)?;
                    facets.validate(&normalized, &value)?;
                    Ok(value)
                }
                SimpleType::List { item } => {
                    let normalized = WhiteSpace::Collapse.normalize(raw);
                    let items = normalized
                        .split(' ')
                        .filter(|token| !token.is_empty())
                        .map(|token| self.validate_value(*item, token))
                        .collect::<ValueResult<Vec<_>>>()?;
                    Ok(XsdValue::List(items))
                }
                SimpleType::Union { members } => {
                    for member in members {
                        if let Ok(value) = self.validate_value(*member, raw) {
                            return Ok(value);
                        }
                    }
                    Err(ValidationError::new(format!(
                        "'{}' is not valid for any member type of {}",
                        raw,
                        self.type_display_name(id)
                    )))
                }
            },
            TypeDefinition::Complex(c) => match &c.content {
                ContentType::Simple(st) => self.validate_value(*st, raw),
                _ => Err(ValidationError::new(format!(
                    "{} does not have a simple value",
                    self.type_display_name(id)
                ))),
            },
        }
    }

    /// Check if a type is ID, IDREF or IDREFS (or a restriction of one)
    pub fn identity_kind(&self, id: TypeId) -> Option<&'static str> {
        match self.builtin_of(id)?.name {
            name @ ("ID" | "IDREF" | "IDREFS") => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtins::get_builtin_type;
    use crate::validators::facets::{FacetSpec, Facets};

    fn builtin_id(grammar: &Grammar, local_name: &str) -> Option<TypeId> {
        get_builtin_type(local_name)?;
        grammar.lookup_type(&QName::xsd(local_name))
    }

    #[test]
    fn test_builtins_registered() {
        let grammar = Grammar::new(None);
        assert!(grammar.lookup_type(&QName::xsd("anyType")).is_some());
        assert!(grammar.lookup_type(&QName::xsd("int")).is_some());
        assert_eq!(grammar.type_count(), 0);
        assert_eq!(grammar.element_count(), 0);
        assert_eq!(grammar.component_count(), 0);
        assert!(grammar.is_builtin(grammar.any_type()));
    }

    #[test]
    fn test_builtin_derivation() {
        let grammar = Grammar::new(None);
        let byte = builtin_id(&grammar, "byte").unwrap();
        let integer = builtin_id(&grammar, "integer").unwrap();
        let string = builtin_id(&grammar, "string").unwrap();
        assert!(grammar.derives_from(byte, integer));
        assert!(grammar.derives_from(byte, grammar.any_type()));
        assert!(!grammar.derives_from(byte, string));
        assert!(!grammar.derives_from(integer, byte));
    }

    #[test]
    fn test_restriction_value() {
        let mut grammar = Grammar::new(None);
        let int = builtin_id(&grammar, "int").unwrap();
        let facets = Facets::compile(
            &[FacetSpec::new("maxInclusive", "10")],
            Primitive::Decimal,
            |v| grammar.validate_value(int, v),
        )
        .unwrap();
        let small = grammar.push_type(TypeDefinition::Simple(SimpleTypeDefinition::new(
            Some(QName::local("small")),
            SimpleType::Restriction { base: int, facets },
        )));

        assert_eq!(grammar.validate_value(small, " 7 ").unwrap(), XsdValue::Integer(7));
        let err = grammar.validate_value(small, "11").unwrap_err();
        assert_eq!(err.facet.as_deref(), Some("maxInclusive"));
        assert!(grammar.validate_value(small, "x").is_err());
        assert!(grammar.derives_from(small, int));
        assert_eq!(grammar.type_names().count(), 1);
    }

    #[test]
    fn test_list_and_union_values() {
        let mut grammar = Grammar::new(None);
        let int = builtin_id(&grammar, "int").unwrap();
        let boolean = builtin_id(&grammar, "boolean").unwrap();
        let list = grammar.push_type(TypeDefinition::Simple(SimpleTypeDefinition::new(
            None,
            SimpleType::List { item: int },
        )));
        let union = grammar.push_type(TypeDefinition::Simple(SimpleTypeDefinition::new(
            None,
            SimpleType::Union {
                members: vec![int, boolean],
            },
        )));

        assert_eq!(
            grammar.validate_value(list, " 1  2\n3 ").unwrap().length(""),
            3
        );
        assert!(grammar.validate_value(list, "1 x").is_err());
        assert_eq!(grammar.validate_value(union, "true").unwrap(), XsdValue::Boolean(true));
        assert!(grammar.validate_value(union, "maybe").is_err());
        assert_eq!(grammar.primitive_of(list), Primitive::List);
    }

    #[test]
    fn test_identity_kind() {
        let grammar = Grammar::new(None);
        let id = builtin_id(&grammar, "ID").unwrap();
        let idrefs = builtin_id(&grammar, "IDREFS").unwrap();
        let string = builtin_id(&grammar, "string").unwrap();
        assert_eq!(grammar.identity_kind(id), Some("ID"));
        assert_eq!(grammar.identity_kind(idrefs), Some("IDREFS"));
        assert_eq!(grammar.identity_kind(string), None);
    }
}

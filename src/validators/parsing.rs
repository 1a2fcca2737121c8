//! XSD Document Parsing
//!
//! Turns schema documents into a [`Grammar`] in three passes:
//!
//! 1. load the main document and, transitively, every include and import
//!    (each location once);
//! 2. register every top-level component under its qualified name, so
//!    references may point forward or across documents;
//! 3. parse component bodies, resolving references against the tables.
//!
//! Derivation and group finalization happen afterwards in
//! [`builders`](super::builders).

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};

use super::attributes::{
    AttributeDeclaration, AttributeGroupDefinition, AttributeItem, AttributeSet, AttributeUse,
    AttributeUseKind,
};
use super::builders;
use super::complex_types::{ComplexTypeDefinition, DeclaredContent, Derivation};
use super::elements::ElementDeclaration;
use super::facets::{is_facet_name, FacetSpec, Facets};
use super::grammar::{
    AttributeGroupId, AttributeId, ElementId, Grammar, GroupId, TypeDefinition, TypeId,
};
use super::groups::{Compositor, ModelGroup, ModelGroupDefinition};
use super::particles::{parse_occurs, Particle, Term};
use super::simple_types::{SimpleType, SimpleTypeDefinition};
use super::wildcards::Wildcard;

use crate::documents::{Document, Element};
use crate::error::{CompileError, Error, ParseError};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::Location;
use crate::names::validate_ncname;
use crate::namespaces::{QName, XSD_NAMESPACE};

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const UNIQUE: &str = "unique";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const FORM: &str = "form";
    pub const NILLABLE: &str = "nillable";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const NAMESPACE: &str = "namespace";
    pub const PROCESS_CONTENTS: &str = "processContents";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
}

use xsd_attrs::*;
use xsd_elements::*;

/// Where a compiled schema comes from
#[derive(Debug, Clone, Copy)]
pub enum SchemaSource<'a> {
    /// A file path or `file:` URL
    Uri(&'a str),
    /// Schema text held in memory
    Text(&'a str),
    /// An already parsed document
    Document(&'a Document),
}

/// Options for schema compilation
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Resource limits
    pub limits: Limits,
    /// Location used to resolve relative includes and imports of in-memory
    /// sources; relative references resolve against the working directory
    /// when unset
    pub base_uri: Option<String>,
}

impl CompileOptions {
    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the base location for in-memory sources
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }
}

/// Form default for local elements and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Local names carry no namespace
    #[default]
    Unqualified,
    /// Local names are in the target namespace
    Qualified,
}

impl FormDefault {
    fn parse(value: Option<&str>) -> Result<Self, CompileError> {
        match value.map(str::trim) {
            None | Some("unqualified") => Ok(Self::Unqualified),
            Some("qualified") => Ok(Self::Qualified),
            Some(other) => Err(CompileError::invalid(format!(
                "invalid form value '{}'",
                other
            ))),
        }
    }
}

/// Compile a schema from any source
pub fn compile_schema(
    source: SchemaSource<'_>,
    options: &CompileOptions,
) -> Result<Grammar, CompileError> {
    let loader = Loader::new().with_limits(options.limits.clone());
    let base = match &options.base_uri {
        Some(uri) => Some(Location::parse(uri)?),
        None => None,
    };

    let (root, location) = match source {
        SchemaSource::Uri(uri) => {
            let location = Location::parse(uri)?;
            debug!(location = %location, "compiling schema");
            let text = loader.load(&location)?;
            (parse_schema_text(&text, &options.limits, Some(&location))?, Some(location))
        }
        SchemaSource::Text(text) => {
            debug!(bytes = text.len(), "compiling schema from text");
            (parse_schema_text(text, &options.limits, base.as_ref())?, base)
        }
        SchemaSource::Document(document) => {
            let root = document.root().cloned().ok_or(CompileError::EmptySource)?;
            (root, base)
        }
    };

    let grammar = SchemaCompiler::new(options.limits.clone(), loader).compile(root, location)?;
    info!(
        target_namespace = grammar.target_namespace().unwrap_or(""),
        elements = grammar.element_count(),
        types = grammar.type_count(),
        "schema compiled"
    );
    Ok(grammar)
}

fn parse_schema_text(
    text: &str,
    limits: &Limits,
    location: Option<&Location>,
) -> Result<Element, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::EmptySource);
    }
    let document = Document::parse_with_limits(text.as_bytes(), limits).map_err(|e| match e {
        Error::LimitExceeded(msg) => CompileError::LimitExceeded(msg),
        other => {
            let error = ParseError::new(other.to_string());
            CompileError::SyntaxError(match location {
                Some(location) => error.with_location(location.to_string()),
                None => error,
            })
        }
    })?;
    document.root.ok_or(CompileError::EmptySource)
}

fn xsd_children(element: &Element) -> impl Iterator<Item = &Element> {
    element
        .children
        .iter()
        .filter(|c| c.namespace() == Some(XSD_NAMESPACE))
}

fn target_namespace_of(root: &Element) -> Option<String> {
    root.get_attribute(TARGET_NAMESPACE)
        .filter(|ns| !ns.is_empty())
        .map(String::from)
}

fn parse_bool(element: &Element, attr: &str) -> Result<bool, CompileError> {
    match element.get_attribute(attr).map(str::trim) {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(CompileError::invalid(format!(
            "attribute '{}' must be a boolean, found '{}'",
            attr, other
        ))),
    }
}

fn required_attr<'e>(element: &'e Element, attr: &str) -> Result<&'e str, CompileError> {
    element.get_attribute(attr).ok_or_else(|| {
        CompileError::invalid(format!(
            "xs:{} requires a '{}' attribute",
            element.local_name(),
            attr
        ))
    })
}

/// The `name` attribute of a declaration or definition, which must be an NCName
fn component_name(element: &Element) -> Result<&str, CompileError> {
    let name = required_attr(element, NAME)?;
    validate_ncname(name).map_err(|err| match err {
        Error::Name(message) => CompileError::invalid(message),
        other => CompileError::from(other),
    })?;
    Ok(name)
}

fn collect_facets(restriction: &Element) -> Result<Vec<FacetSpec>, CompileError> {
    xsd_children(restriction)
        .filter(|c| is_facet_name(c.local_name()))
        .map(|c| Ok(FacetSpec::new(c.local_name(), required_attr(c, VALUE)?)))
        .collect()
}

/// Attach the component being built to an error that has no location yet
fn locate(err: CompileError, doc: &SchemaDocument, element: &Element) -> CompileError {
    let mut place = format!("xs:{}", element.local_name());
    if let Some(name) = element.get_attribute(NAME) {
        place.push_str(&format!(" '{}'", name));
    }
    if let Some(location) = &doc.location {
        place.push_str(&format!(" in {}", location));
    }
    match err {
        CompileError::InvalidSchema(e) if e.location.is_none() => {
            CompileError::InvalidSchema(e.with_location(place))
        }
        other => other,
    }
}

/// A loaded schema document and the settings its components inherit
struct SchemaDocument {
    root: Element,
    location: Option<Location>,
    target_namespace: Option<String>,
    /// Included without a target namespace into one that has one
    chameleon: bool,
    element_form: FormDefault,
    attribute_form: FormDefault,
}

/// How a pending document was reached
enum Inclusion {
    Main,
    Include(Option<String>),
    Import(Option<String>),
}

/// Pending schema work item for iterative processing
struct PendingSchemaWork {
    root: Element,
    location: Option<Location>,
    inclusion: Inclusion,
    depth: usize,
}

#[derive(Debug, Clone, Copy)]
enum Component {
    Element(ElementId),
    Type(TypeId),
    Attribute(AttributeId),
    Group(GroupId),
    AttributeGroup(AttributeGroupId),
}

/// A top-level schema child registered in pass 2
struct Registered {
    doc: usize,
    child: usize,
    component: Component,
}

/// Compiler state for one schema
pub(crate) struct SchemaCompiler {
    limits: Limits,
    loader: Loader,
    grammar: Grammar,
    pending_facets: HashMap<TypeId, Vec<FacetSpec>>,
    visited: HashSet<String>,
    nesting: usize,
}

impl SchemaCompiler {
    pub(crate) fn new(limits: Limits, loader: Loader) -> Self {
        Self {
            limits,
            loader,
            grammar: Grammar::new(None),
            pending_facets: HashMap::new(),
            visited: HashSet::new(),
            nesting: 0,
        }
    }

    pub(crate) fn compile(
        mut self,
        root: Element,
        location: Option<Location>,
    ) -> Result<Grammar, CompileError> {
        self.grammar.target_namespace = target_namespace_of(&root);
        let documents = self.load_documents(root, location)?;
        let registered = self.register(&documents)?;
        self.limits
            .check_schema_components(self.grammar.component_count())?;
        self.build(&documents, &registered)?;
        builders::finalize(&mut self.grammar, &mut self.pending_facets)?;
        Ok(self.grammar)
    }

    // =========================================================================
    // Pass 1: loading
    // =========================================================================

    fn load_documents(
        &mut self,
        root: Element,
        location: Option<Location>,
    ) -> Result<Vec<SchemaDocument>, CompileError> {
        let mut documents = Vec::new();
        let mut queue = VecDeque::new();
        if let Some(location) = &location {
            self.visited.insert(location.canonical_key());
        }
        queue.push_back(PendingSchemaWork {
            root,
            location,
            inclusion: Inclusion::Main,
            depth: 0,
        });

        while let Some(work) = queue.pop_front() {
            self.limits.check_schema_depth(work.depth)?;
            let root = work.root;
            let place = work
                .location
                .as_ref()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "<schema text>".to_string());

            if root.namespace() != Some(XSD_NAMESPACE) || root.local_name() != SCHEMA {
                return Err(CompileError::SyntaxError(
                    ParseError::new(format!(
                        "root element must be xs:schema, found '{}'",
                        root.qname
                    ))
                    .with_location(place),
                ));
            }

            let declared = target_namespace_of(&root);
            let (target_namespace, chameleon) = match &work.inclusion {
                Inclusion::Main => (declared, false),
                Inclusion::Include(includer) => match declared {
                    Some(ns) if includer.as_deref() != Some(ns.as_str()) => {
                        return Err(CompileError::InvalidSchema(
                            ParseError::new(format!(
                                "included schema has target namespace '{}' but the including schema has {}",
                                ns,
                                includer.as_deref().map_or("none".to_string(), |n| format!("'{}'", n))
                            ))
                            .with_location(place),
                        ));
                    }
                    Some(ns) => (Some(ns), false),
                    None => (includer.clone(), includer.is_some()),
                },
                Inclusion::Import(expected) => {
                    if &declared != expected {
                        return Err(CompileError::InvalidSchema(
                            ParseError::new(format!(
                                "imported schema has target namespace {:?}, expected {:?}",
                                declared, expected
                            ))
                            .with_location(place),
                        ));
                    }
                    (declared, false)
                }
            };

            for child in xsd_children(&root) {
                match child.local_name() {
                    INCLUDE => {
                        let reference = required_attr(child, SCHEMA_LOCATION)?;
                        if let Some((next, next_location)) =
                            self.load_referenced(work.location.as_ref(), reference)?
                        {
                            queue.push_back(PendingSchemaWork {
                                root: next,
                                location: Some(next_location),
                                inclusion: Inclusion::Include(target_namespace.clone()),
                                depth: work.depth + 1,
                            });
                        }
                    }
                    IMPORT => {
                        let namespace = child
                            .get_attribute(NAMESPACE)
                            .filter(|ns| !ns.is_empty())
                            .map(String::from);
                        if namespace == target_namespace {
                            return Err(CompileError::invalid(
                                "xs:import must not import the target namespace of the importing schema",
                            ));
                        }
                        let Some(reference) = child.get_attribute(SCHEMA_LOCATION) else {
                            debug!(namespace = ?namespace, "import without schemaLocation skipped");
                            continue;
                        };
                        match self.load_referenced(work.location.as_ref(), reference) {
                            Ok(Some((next, next_location))) => queue.push_back(PendingSchemaWork {
                                root: next,
                                location: Some(next_location),
                                inclusion: Inclusion::Import(namespace),
                                depth: work.depth + 1,
                            }),
                            Ok(None) => {}
                            Err(CompileError::Resource(msg)) => {
                                warn!(namespace = ?namespace, reason = %msg, "skipping import that could not be loaded");
                            }
                            Err(other) => return Err(other),
                        }
                    }
                    REDEFINE => {
                        return Err(CompileError::InvalidSchema(
                            ParseError::new("xs:redefine is not supported").with_location(place),
                        ));
                    }
                    _ => {}
                }
            }

            let element_form = FormDefault::parse(root.get_attribute(ELEMENT_FORM_DEFAULT))?;
            let attribute_form = FormDefault::parse(root.get_attribute(ATTRIBUTE_FORM_DEFAULT))?;
            documents.push(SchemaDocument {
                root,
                location: work.location,
                target_namespace,
                chameleon,
                element_form,
                attribute_form,
            });
        }

        debug!(documents = documents.len(), "schema documents loaded");
        Ok(documents)
    }

    /// Load an included or imported document unless it was loaded already
    fn load_referenced(
        &mut self,
        base: Option<&Location>,
        reference: &str,
    ) -> Result<Option<(Element, Location)>, CompileError> {
        let location = match base {
            Some(base) => base.join(reference.trim())?,
            None => Location::parse(reference.trim())?,
        };
        if !self.visited.insert(location.canonical_key()) {
            debug!(location = %location, "schema document already loaded");
            return Ok(None);
        }
        debug!(location = %location, "loading referenced schema");
        let text = self.loader.load(&location)?;
        let root = parse_schema_text(&text, &self.limits, Some(&location))?;
        Ok(Some((root, location)))
    }

    // =========================================================================
    // Pass 2: registration
    // =========================================================================

    fn register(&mut self, documents: &[SchemaDocument]) -> Result<Vec<Registered>, CompileError> {
        let mut registered = Vec::new();

        for (doc_index, doc) in documents.iter().enumerate() {
            for (child_index, child) in doc.root.children.iter().enumerate() {
                if child.namespace() != Some(XSD_NAMESPACE) {
                    continue;
                }
                let kind = child.local_name();
                if !matches!(
                    kind,
                    ELEMENT | COMPLEX_TYPE | SIMPLE_TYPE | ATTRIBUTE | GROUP | ATTRIBUTE_GROUP
                ) {
                    continue;
                }

                let name = component_name(child).map_err(|e| locate(e, doc, child))?;
                let qname = QName::new(doc.target_namespace.clone(), name);
                let duplicate = || CompileError::DuplicateComponent(format!("{} {}", kind, qname));

                let component = match kind {
                    ELEMENT => {
                        if self.grammar.element_table.contains_key(&qname) {
                            return Err(duplicate());
                        }
                        let id = self
                            .grammar
                            .push_element(ElementDeclaration::new(qname.clone(), true));
                        self.grammar.element_table.insert(qname, id);
                        Component::Element(id)
                    }
                    COMPLEX_TYPE | SIMPLE_TYPE => {
                        if self.grammar.type_table.contains_key(&qname) {
                            return Err(duplicate());
                        }
                        let placeholder = if kind == COMPLEX_TYPE {
                            TypeDefinition::Complex(ComplexTypeDefinition::new(Some(qname)))
                        } else {
                            TypeDefinition::Simple(SimpleTypeDefinition::new(
                                Some(qname),
                                self.placeholder_simple(),
                            ))
                        };
                        Component::Type(self.grammar.push_type(placeholder))
                    }
                    ATTRIBUTE => {
                        if self.grammar.attribute_table.contains_key(&qname) {
                            return Err(duplicate());
                        }
                        let id = AttributeId(self.grammar.attributes.len());
                        let type_id = self.grammar.any_simple_type();
                        self.grammar.attributes.push(AttributeDeclaration {
                            name: qname.clone(),
                            type_id,
                            default: None,
                            fixed: None,
                        });
                        self.grammar.attribute_table.insert(qname, id);
                        Component::Attribute(id)
                    }
                    GROUP => {
                        if self.grammar.group_table.contains_key(&qname) {
                            return Err(duplicate());
                        }
                        let id = GroupId(self.grammar.groups.len());
                        self.grammar.groups.push(ModelGroupDefinition {
                            name: qname.clone(),
                            group: ModelGroup::default(),
                        });
                        self.grammar.group_table.insert(qname, id);
                        Component::Group(id)
                    }
                    _ => {
                        if self.grammar.attribute_group_table.contains_key(&qname) {
                            return Err(duplicate());
                        }
                        let id = AttributeGroupId(self.grammar.attribute_groups.len());
                        self.grammar.attribute_groups.push(AttributeGroupDefinition {
                            name: qname.clone(),
                            attributes: AttributeSet::default(),
                            uses: Vec::new(),
                            wildcard: None,
                        });
                        self.grammar.attribute_group_table.insert(qname, id);
                        Component::AttributeGroup(id)
                    }
                };

                registered.push(Registered {
                    doc: doc_index,
                    child: child_index,
                    component,
                });
            }
        }

        debug!(components = registered.len(), "top-level components registered");
        Ok(registered)
    }

    fn placeholder_simple(&self) -> SimpleType {
        SimpleType::Restriction {
            base: self.grammar.any_simple_type(),
            facets: Facets::default(),
        }
    }

    // =========================================================================
    // Pass 3: component bodies
    // =========================================================================

    fn build(
        &mut self,
        documents: &[SchemaDocument],
        registered: &[Registered],
    ) -> Result<(), CompileError> {
        // Attribute references copy the declaration, so globals come first
        let (attributes, others): (Vec<&Registered>, Vec<&Registered>) = registered
            .iter()
            .partition(|r| matches!(r.component, Component::Attribute(_)));

        for item in attributes.into_iter().chain(others) {
            let doc = &documents[item.doc];
            let element = &doc.root.children[item.child];
            let result = match item.component {
                Component::Attribute(id) => self.build_global_attribute(doc, element, id),
                Component::Element(id) => self.fill_element(doc, element, id),
                Component::Type(id) => match element.local_name() {
                    SIMPLE_TYPE => self.build_simple_type(doc, element, id),
                    _ => self.build_complex_type(doc, element, id),
                },
                Component::Group(id) => self.build_group(doc, element, id),
                Component::AttributeGroup(id) => self.build_attribute_group(doc, element, id),
            };
            result.map_err(|e| locate(e, doc, element))?;
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.nesting += 1;
        self.limits.check_schema_depth(self.nesting)?;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    // -------------------------------------------------------------------------
    // References
    // -------------------------------------------------------------------------

    fn reference_name(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<QName, CompileError> {
        let qname = element.resolve_qname(value).map_err(|_| {
            CompileError::UnresolvedReference(format!(
                "'{}': namespace prefix is not declared",
                value
            ))
        })?;
        if qname.namespace.is_none() && doc.chameleon {
            return Ok(QName::new(doc.target_namespace.clone(), qname.local_name));
        }
        Ok(qname)
    }

    fn resolve_type(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<TypeId, CompileError> {
        let name = self.reference_name(doc, element, value)?;
        self.grammar
            .lookup_type(&name)
            .ok_or_else(|| CompileError::UnresolvedReference(format!("type '{}'", name)))
    }

    fn resolve_element(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<ElementId, CompileError> {
        let name = self.reference_name(doc, element, value)?;
        self.grammar
            .lookup_element(&name)
            .ok_or_else(|| CompileError::UnresolvedReference(format!("element '{}'", name)))
    }

    fn resolve_attribute(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<AttributeId, CompileError> {
        let name = self.reference_name(doc, element, value)?;
        self.grammar
            .attribute_table
            .get(&name)
            .copied()
            .ok_or_else(|| CompileError::UnresolvedReference(format!("attribute '{}'", name)))
    }

    fn resolve_group(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<GroupId, CompileError> {
        let name = self.reference_name(doc, element, value)?;
        self.grammar
            .group_table
            .get(&name)
            .copied()
            .ok_or_else(|| CompileError::UnresolvedReference(format!("group '{}'", name)))
    }

    fn resolve_attribute_group(
        &self,
        doc: &SchemaDocument,
        element: &Element,
        value: &str,
    ) -> Result<AttributeGroupId, CompileError> {
        let name = self.reference_name(doc, element, value)?;
        self.grammar
            .attribute_group_table
            .get(&name)
            .copied()
            .ok_or_else(|| {
                CompileError::UnresolvedReference(format!("attribute group '{}'", name))
            })
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    fn fill_element(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: ElementId,
    ) -> Result<(), CompileError> {
        let nillable = parse_bool(element, NILLABLE)?;
        let is_abstract = parse_bool(element, ABSTRACT)?;
        let default = element.get_attribute(DEFAULT).map(String::from);
        let fixed = element.get_attribute(FIXED).map(String::from);
        if default.is_some() && fixed.is_some() {
            return Err(CompileError::invalid(
                "an element cannot have both 'default' and 'fixed'",
            ));
        }

        let inline = xsd_children(element)
            .find(|c| matches!(c.local_name(), SIMPLE_TYPE | COMPLEX_TYPE));
        let type_id = match (element.get_attribute(TYPE), inline) {
            (Some(_), Some(_)) => {
                return Err(CompileError::invalid(
                    "an element cannot have both a 'type' attribute and an anonymous type",
                ))
            }
            (Some(name), None) => Some(self.resolve_type(doc, element, name)?),
            (None, Some(definition)) => Some(self.build_anonymous_type(doc, definition)?),
            (None, None) => None,
        };

        let global = self.grammar.element(id).global;
        let substitution_head = match element.get_attribute(SUBSTITUTION_GROUP) {
            Some(name) if global => Some(self.resolve_element(doc, element, name)?),
            _ => None,
        };

        for constraint in xsd_children(element)
            .filter(|c| matches!(c.local_name(), UNIQUE | KEY | KEYREF))
        {
            debug!(
                constraint = constraint.local_name(),
                element = %self.grammar.element(id).name,
                "identity constraint not enforced"
            );
        }

        let declaration = self.grammar.element_mut(id);
        declaration.type_id = type_id;
        declaration.nillable = nillable;
        declaration.is_abstract = is_abstract;
        declaration.default = default;
        declaration.fixed = fixed;
        declaration.substitution_head = substitution_head;
        Ok(())
    }

    fn build_local_element(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
    ) -> Result<ElementId, CompileError> {
        if let Some(reference) = element.get_attribute(REF) {
            if element.get_attribute(NAME).is_some() {
                return Err(CompileError::invalid(
                    "an element cannot have both 'ref' and 'name'",
                ));
            }
            return self.resolve_element(doc, element, reference);
        }

        let name = component_name(element)?;
        let form = match element.get_attribute(FORM) {
            Some(value) => FormDefault::parse(Some(value))?,
            None => doc.element_form,
        };
        let qname = match form {
            FormDefault::Qualified => QName::new(doc.target_namespace.clone(), name),
            FormDefault::Unqualified => QName::local(name),
        };
        let id = self.grammar.push_element(ElementDeclaration::new(qname, false));
        self.fill_element(doc, element, id)?;
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn build_anonymous_type(
        &mut self,
        doc: &SchemaDocument,
        definition: &Element,
    ) -> Result<TypeId, CompileError> {
        self.enter()?;
        let id = if definition.local_name() == SIMPLE_TYPE {
            let id = self.grammar.push_type(TypeDefinition::Simple(SimpleTypeDefinition::new(
                None,
                self.placeholder_simple(),
            )));
            self.build_simple_type(doc, definition, id)?;
            id
        } else {
            let id = self
                .grammar
                .push_type(TypeDefinition::Complex(ComplexTypeDefinition::new(None)));
            self.build_complex_type(doc, definition, id)?;
            id
        };
        self.leave();
        Ok(id)
    }

    /// The `base` attribute or the anonymous simple type of a restriction
    fn restriction_base(
        &mut self,
        doc: &SchemaDocument,
        restriction: &Element,
    ) -> Result<TypeId, CompileError> {
        let inline = xsd_children(restriction).find(|c| c.local_name() == SIMPLE_TYPE);
        match (restriction.get_attribute(BASE), inline) {
            (Some(name), None) => self.resolve_type(doc, restriction, name),
            (None, Some(definition)) => self.build_anonymous_type(doc, definition),
            (Some(_), Some(_)) => Err(CompileError::invalid(
                "xs:restriction cannot have both a 'base' attribute and an anonymous simpleType",
            )),
            (None, None) => Err(CompileError::invalid(
                "xs:restriction requires a 'base' attribute or an anonymous simpleType",
            )),
        }
    }

    fn build_simple_type(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: TypeId,
    ) -> Result<(), CompileError> {
        let name = self.grammar.type_definition(id).name().cloned();
        let derivation = xsd_children(element)
            .find(|c| c.local_name() != ANNOTATION)
            .ok_or_else(|| {
                CompileError::invalid("xs:simpleType requires a restriction, list or union")
            })?;

        let variety = match derivation.local_name() {
            RESTRICTION => {
                let base = self.restriction_base(doc, derivation)?;
                if !self.grammar.type_definition(base).is_simple() {
                    return Err(CompileError::invalid(format!(
                        "base type {} of a simple type must be a simple type",
                        self.grammar.type_display_name(base)
                    )));
                }
                let specs = collect_facets(derivation)?;
                if !specs.is_empty() {
                    self.pending_facets.insert(id, specs);
                }
                SimpleType::Restriction {
                    base,
                    facets: Facets::default(),
                }
            }
            LIST => {
                let inline = xsd_children(derivation).find(|c| c.local_name() == SIMPLE_TYPE);
                let item = match (derivation.get_attribute(ITEM_TYPE), inline) {
                    (Some(name), None) => self.resolve_type(doc, derivation, name)?,
                    (None, Some(definition)) => self.build_anonymous_type(doc, definition)?,
                    _ => {
                        return Err(CompileError::invalid(
                            "xs:list requires exactly one of 'itemType' or an anonymous simpleType",
                        ))
                    }
                };
                SimpleType::List { item }
            }
            UNION => {
                let mut members = Vec::new();
                if let Some(names) = derivation.get_attribute(MEMBER_TYPES) {
                    for name in names.split_whitespace() {
                        members.push(self.resolve_type(doc, derivation, name)?);
                    }
                }
                for definition in xsd_children(derivation).filter(|c| c.local_name() == SIMPLE_TYPE)
                {
                    members.push(self.build_anonymous_type(doc, definition)?);
                }
                if members.is_empty() {
                    return Err(CompileError::invalid("xs:union has no member types"));
                }
                SimpleType::Union { members }
            }
            other => {
                return Err(CompileError::invalid(format!(
                    "unexpected xs:{} in xs:simpleType",
                    other
                )))
            }
        };

        *self.grammar.type_mut(id) =
            TypeDefinition::Simple(SimpleTypeDefinition::new(name, variety));
        Ok(())
    }

    fn build_complex_type(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: TypeId,
    ) -> Result<(), CompileError> {
        let name = self.grammar.type_definition(id).name().cloned();
        let mut definition = ComplexTypeDefinition::new(name);
        definition.base = Some(self.grammar.any_type());
        definition.mixed = parse_bool(element, MIXED)?;
        definition.is_abstract = parse_bool(element, ABSTRACT)?;

        for child in xsd_children(element) {
            match child.local_name() {
                ANNOTATION => {}
                SIMPLE_CONTENT => self.build_simple_content(doc, child, &mut definition)?,
                COMPLEX_CONTENT => self.build_complex_content(doc, child, &mut definition)?,
                SEQUENCE | CHOICE | ALL | GROUP => {
                    definition.declared =
                        DeclaredContent::Complex(Some(self.build_particle(doc, child)?));
                }
                ATTRIBUTE | ATTRIBUTE_GROUP | ANY_ATTRIBUTE => {
                    self.build_attribute_item(doc, child, &mut definition.declared_attributes)?
                }
                other => debug!(child = other, "unsupported xs:complexType child skipped"),
            }
        }

        *self.grammar.type_mut(id) = TypeDefinition::Complex(definition);
        Ok(())
    }

    fn derivation_of<'e>(content: &'e Element) -> Result<&'e Element, CompileError> {
        xsd_children(content)
            .find(|c| c.local_name() != ANNOTATION)
            .ok_or_else(|| {
                CompileError::invalid(format!(
                    "xs:{} requires a restriction or extension",
                    content.local_name()
                ))
            })
    }

    fn build_simple_content(
        &mut self,
        doc: &SchemaDocument,
        content: &Element,
        definition: &mut ComplexTypeDefinition,
    ) -> Result<(), CompileError> {
        let derivation = Self::derivation_of(content)?;
        let base = self.resolve_type(doc, derivation, required_attr(derivation, BASE)?)?;
        definition.base = Some(base);

        match derivation.local_name() {
            EXTENSION => {
                definition.derivation = Derivation::Extension;
                definition.declared = DeclaredContent::SimpleExtension;
            }
            RESTRICTION => {
                definition.derivation = Derivation::Restriction;
                let value_base = match xsd_children(derivation).find(|c| c.local_name() == SIMPLE_TYPE)
                {
                    Some(inline) => self.build_anonymous_type(doc, inline)?,
                    None => base,
                };
                let specs = collect_facets(derivation)?;
                let value_type = self.grammar.push_type(TypeDefinition::Simple(
                    SimpleTypeDefinition::new(
                        None,
                        SimpleType::Restriction {
                            base: value_base,
                            facets: Facets::default(),
                        },
                    ),
                ));
                if !specs.is_empty() {
                    self.pending_facets.insert(value_type, specs);
                }
                definition.declared = DeclaredContent::SimpleRestriction(value_type);
            }
            other => {
                return Err(CompileError::invalid(format!(
                    "unexpected xs:{} in xs:simpleContent",
                    other
                )))
            }
        }

        for child in xsd_children(derivation) {
            if matches!(child.local_name(), ATTRIBUTE | ATTRIBUTE_GROUP | ANY_ATTRIBUTE) {
                self.build_attribute_item(doc, child, &mut definition.declared_attributes)?;
            }
        }
        Ok(())
    }

    fn build_complex_content(
        &mut self,
        doc: &SchemaDocument,
        content: &Element,
        definition: &mut ComplexTypeDefinition,
    ) -> Result<(), CompileError> {
        if content.get_attribute(MIXED).is_some() {
            definition.mixed = parse_bool(content, MIXED)?;
        }
        let derivation = Self::derivation_of(content)?;
        let base = self.resolve_type(doc, derivation, required_attr(derivation, BASE)?)?;
        if self.grammar.type_definition(base).is_simple() {
            return Err(CompileError::invalid(format!(
                "base type {} of complex content must be a complex type",
                self.grammar.type_display_name(base)
            )));
        }
        definition.base = Some(base);
        definition.derivation = match derivation.local_name() {
            EXTENSION => Derivation::Extension,
            RESTRICTION => Derivation::Restriction,
            other => {
                return Err(CompileError::invalid(format!(
                    "unexpected xs:{} in xs:complexContent",
                    other
                )))
            }
        };

        for child in xsd_children(derivation) {
            match child.local_name() {
                SEQUENCE | CHOICE | ALL | GROUP => {
                    definition.declared =
                        DeclaredContent::Complex(Some(self.build_particle(doc, child)?));
                }
                ATTRIBUTE | ATTRIBUTE_GROUP | ANY_ATTRIBUTE => {
                    self.build_attribute_item(doc, child, &mut definition.declared_attributes)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Content models
    // -------------------------------------------------------------------------

    fn build_particle(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
    ) -> Result<Particle, CompileError> {
        let occurs = parse_occurs(
            element.get_attribute(MIN_OCCURS),
            element.get_attribute(MAX_OCCURS),
        )?;
        self.enter()?;
        let term = match element.local_name() {
            ELEMENT => Term::Element(self.build_local_element(doc, element)?),
            GROUP => {
                let reference = required_attr(element, REF)?;
                Term::GroupRef(self.resolve_group(doc, element, reference)?)
            }
            ANY => Term::Any(Wildcard::parse(
                element.get_attribute(NAMESPACE),
                element.get_attribute(PROCESS_CONTENTS),
                doc.target_namespace.as_deref(),
            )?),
            SEQUENCE | CHOICE | ALL => Term::Group(self.build_model_group(doc, element)?),
            other => {
                return Err(CompileError::invalid(format!(
                    "unexpected xs:{} in a content model",
                    other
                )))
            }
        };
        self.leave();
        Ok(Particle::new(term, occurs))
    }

    fn build_model_group(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
    ) -> Result<ModelGroup, CompileError> {
        let compositor = Compositor::from_tag(element.local_name()).ok_or_else(|| {
            CompileError::invalid(format!("xs:{} is not a model group", element.local_name()))
        })?;

        let mut particles = Vec::new();
        for child in xsd_children(element) {
            if child.local_name() == ANNOTATION {
                continue;
            }
            if compositor == Compositor::All && child.local_name() != ELEMENT {
                return Err(CompileError::invalid(format!(
                    "xs:all may only contain xs:element, found xs:{}",
                    child.local_name()
                )));
            }
            let particle = self.build_particle(doc, child)?;
            if compositor == Compositor::All && particle.occurs.max.map_or(true, |max| max > 1) {
                return Err(CompileError::invalid(
                    "elements of xs:all may occur at most once",
                ));
            }
            particles.push(particle);
        }
        Ok(ModelGroup::new(compositor, particles))
    }

    fn build_group(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: GroupId,
    ) -> Result<(), CompileError> {
        let body = xsd_children(element)
            .find(|c| c.local_name() != ANNOTATION)
            .ok_or_else(|| CompileError::invalid("xs:group requires a sequence, choice or all"))?;
        let group = self.build_model_group(doc, body)?;
        self.grammar.groups[id.0].group = group;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    fn build_attribute_item(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        set: &mut AttributeSet,
    ) -> Result<(), CompileError> {
        match element.local_name() {
            ATTRIBUTE => {
                let attribute = self.build_attribute_use(doc, element)?;
                set.items.push(AttributeItem::Use(attribute));
            }
            ATTRIBUTE_GROUP => {
                let reference = required_attr(element, REF)?;
                let id = self.resolve_attribute_group(doc, element, reference)?;
                set.items.push(AttributeItem::Group(id));
            }
            ANY_ATTRIBUTE => {
                set.wildcard = Some(Wildcard::parse(
                    element.get_attribute(NAMESPACE),
                    element.get_attribute(PROCESS_CONTENTS),
                    doc.target_namespace.as_deref(),
                )?);
            }
            _ => {}
        }
        Ok(())
    }

    /// Value type of an attribute declaration or local attribute
    fn attribute_type(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
    ) -> Result<TypeId, CompileError> {
        let inline = xsd_children(element).find(|c| c.local_name() == SIMPLE_TYPE);
        let type_id = match (element.get_attribute(TYPE), inline) {
            (Some(_), Some(_)) => {
                return Err(CompileError::invalid(
                    "an attribute cannot have both a 'type' attribute and an anonymous simpleType",
                ))
            }
            (Some(name), None) => self.resolve_type(doc, element, name)?,
            (None, Some(definition)) => self.build_anonymous_type(doc, definition)?,
            (None, None) => self.grammar.any_simple_type(),
        };
        if !self.grammar.type_definition(type_id).is_simple() {
            return Err(CompileError::invalid(format!(
                "attribute type {} must be a simple type",
                self.grammar.type_display_name(type_id)
            )));
        }
        Ok(type_id)
    }

    fn build_attribute_use(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
    ) -> Result<AttributeUse, CompileError> {
        let use_kind = match element.get_attribute(USE) {
            Some(value) => AttributeUseKind::parse(value)?,
            None => AttributeUseKind::Optional,
        };
        let default = element.get_attribute(DEFAULT).map(String::from);
        let fixed = element.get_attribute(FIXED).map(String::from);
        if default.is_some() && fixed.is_some() {
            return Err(CompileError::invalid(
                "an attribute cannot have both 'default' and 'fixed'",
            ));
        }
        if default.is_some() && use_kind != AttributeUseKind::Optional {
            return Err(CompileError::invalid(
                "an attribute with a default value must be optional",
            ));
        }

        if let Some(reference) = element.get_attribute(REF) {
            let id = self.resolve_attribute(doc, element, reference)?;
            let declaration = &self.grammar.attributes[id.0];
            return Ok(AttributeUse {
                name: declaration.name.clone(),
                type_id: declaration.type_id,
                use_kind,
                default: default.or_else(|| declaration.default.clone()),
                fixed: fixed.or_else(|| declaration.fixed.clone()),
            });
        }

        let name = component_name(element)?;
        let form = match element.get_attribute(FORM) {
            Some(value) => FormDefault::parse(Some(value))?,
            None => doc.attribute_form,
        };
        let qname = match form {
            FormDefault::Qualified => QName::new(doc.target_namespace.clone(), name),
            FormDefault::Unqualified => QName::local(name),
        };
        let type_id = self.attribute_type(doc, element)?;

        Ok(AttributeUse {
            name: qname,
            type_id,
            use_kind,
            default,
            fixed,
        })
    }

    fn build_global_attribute(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: AttributeId,
    ) -> Result<(), CompileError> {
        let type_id = self.attribute_type(doc, element)?;
        let default = element.get_attribute(DEFAULT).map(String::from);
        let fixed = element.get_attribute(FIXED).map(String::from);
        if default.is_some() && fixed.is_some() {
            return Err(CompileError::invalid(
                "an attribute cannot have both 'default' and 'fixed'",
            ));
        }
        let declaration = &mut self.grammar.attributes[id.0];
        declaration.type_id = type_id;
        declaration.default = default;
        declaration.fixed = fixed;
        Ok(())
    }

    fn build_attribute_group(
        &mut self,
        doc: &SchemaDocument,
        element: &Element,
        id: AttributeGroupId,
    ) -> Result<(), CompileError> {
        let mut set = AttributeSet::default();
        for child in xsd_children(element) {
            self.build_attribute_item(doc, child, &mut set)?;
        }
        self.grammar.attribute_groups[id.0].attributes = set;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::complex_types::ContentType;
    use std::io::Write;
    use tempfile::TempDir;

    fn compile_text(xsd: &str) -> Result<Grammar, CompileError> {
        compile_schema(SchemaSource::Text(xsd), &CompileOptions::default())
    }

    const XS: &str = r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#;

    #[test]
    fn test_registers_top_level_components() {
        let xsd = format!(
            r#"<xs:schema {XS} targetNamespace="urn:t" xmlns:t="urn:t">
                <xs:element name="root" type="t:RootType"/>
                <xs:complexType name="RootType">
                    <xs:sequence><xs:element name="item" type="xs:string"/></xs:sequence>
                </xs:complexType>
                <xs:simpleType name="Code">
                    <xs:restriction base="xs:string"><xs:length value="3"/></xs:restriction>
                </xs:simpleType>
            </xs:schema>"#
        );
        let grammar = compile_text(&xsd).unwrap();
        assert_eq!(grammar.target_namespace(), Some("urn:t"));
        let elements: Vec<String> = grammar.element_names().map(|n| n.to_string()).collect();
        assert_eq!(elements, vec!["{urn:t}root"]);
        let types: Vec<String> = grammar.type_names().map(|n| n.to_string()).collect();
        assert_eq!(types, vec!["{urn:t}RootType", "{urn:t}Code"]);
    }

    #[test]
    fn test_forward_reference() {
        let xsd = format!(
            r#"<xs:schema {XS}>
                <xs:element name="a" type="Later"/>
                <xs:simpleType name="Later">
                    <xs:restriction base="xs:int"/>
                </xs:simpleType>
            </xs:schema>"#
        );
        let grammar = compile_text(&xsd).unwrap();
        let a = grammar.lookup_element(&QName::local("a")).unwrap();
        let later = grammar.lookup_type(&QName::local("Later")).unwrap();
        assert_eq!(grammar.element_type(a), later);
    }

    #[test]
    fn test_local_element_forms() {
        let xsd = format!(
            r#"<xs:schema {XS} targetNamespace="urn:t" elementFormDefault="qualified">
                <xs:element name="a">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="q" type="xs:string"/>
                            <xs:element name="u" type="xs:string" form="unqualified"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#
        );
        let grammar = compile_text(&xsd).unwrap();
        let a = grammar.lookup_element(&QName::namespaced("urn:t", "a")).unwrap();
        let ty = grammar.type_definition(grammar.element_type(a)).as_complex().unwrap();
        let ContentType::Elements(particle) = &ty.content else {
            panic!("expected element content");
        };
        let Term::Group(group) = &particle.term else {
            panic!("expected a sequence");
        };
        let names: Vec<String> = group
            .particles
            .iter()
            .map(|p| match &p.term {
                Term::Element(id) => grammar.element(*id).name.to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(names, vec!["{urn:t}q", "u"]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(compile_text("").unwrap_err(), CompileError::EmptySource);
        assert_eq!(compile_text("   \n ").unwrap_err(), CompileError::EmptySource);
        assert!(matches!(
            compile_text("<xs:schema").unwrap_err(),
            CompileError::SyntaxError(_)
        ));
        assert!(matches!(
            compile_text("<schema/>").unwrap_err(),
            CompileError::SyntaxError(_)
        ));

        let unresolved = format!(r#"<xs:schema {XS}><xs:element name="a" type="Missing"/></xs:schema>"#);
        assert!(matches!(
            compile_text(&unresolved).unwrap_err(),
            CompileError::UnresolvedReference(_)
        ));

        let duplicate = format!(
            r#"<xs:schema {XS}><xs:element name="a"/><xs:element name="a"/></xs:schema>"#
        );
        assert!(matches!(
            compile_text(&duplicate).unwrap_err(),
            CompileError::DuplicateComponent(_)
        ));

        let bad_occurs = format!(
            r#"<xs:schema {XS}><xs:element name="a"><xs:complexType><xs:sequence>
                <xs:element name="b" minOccurs="3" maxOccurs="2"/>
            </xs:sequence></xs:complexType></xs:element></xs:schema>"#
        );
        assert!(matches!(
            compile_text(&bad_occurs).unwrap_err(),
            CompileError::InvalidSchema(_)
        ));

        let redefine = format!(r#"<xs:schema {XS}><xs:redefine schemaLocation="x.xsd"/></xs:schema>"#);
        assert!(matches!(
            compile_text(&redefine).unwrap_err(),
            CompileError::InvalidSchema(_)
        ));
    }

    #[test]
    fn test_invalid_schema_carries_location() {
        let xsd = format!(
            r#"<xs:schema {XS}><xs:element name="a" type="xs:int" fixed="1" default="2"/></xs:schema>"#
        );
        let CompileError::InvalidSchema(err) = compile_text(&xsd).unwrap_err() else {
            panic!("expected InvalidSchema");
        };
        assert_eq!(err.location.as_deref(), Some("xs:element 'a'"));
    }

    #[test]
    fn test_component_names_must_be_ncnames() {
        let global = format!(r#"<xs:schema {XS}><xs:element name="1st"/></xs:schema>"#);
        let CompileError::InvalidSchema(err) = compile_text(&global).unwrap_err() else {
            panic!("expected InvalidSchema");
        };
        assert_eq!(err.message, "'1st' is not a valid NCName");

        let local = format!(
            r#"<xs:schema {XS}><xs:element name="a"><xs:complexType>
                <xs:attribute name="x:y"/>
            </xs:complexType></xs:element></xs:schema>"#
        );
        let CompileError::InvalidSchema(err) = compile_text(&local).unwrap_err() else {
            panic!("expected InvalidSchema");
        };
        assert_eq!(err.message, "'x:y' is not a valid NCName");
    }

    #[test]
    fn test_chameleon_include() {
        let dir = TempDir::new().unwrap();
        let included = dir.path().join("common.xsd");
        let mut file = std::fs::File::create(&included).unwrap();
        write!(
            file,
            r#"<xs:schema {XS}>
                <xs:simpleType name="Code"><xs:restriction base="xs:string"/></xs:simpleType>
            </xs:schema>"#
        )
        .unwrap();

        let main = dir.path().join("main.xsd");
        let mut file = std::fs::File::create(&main).unwrap();
        write!(
            file,
            r#"<xs:schema {XS} targetNamespace="urn:t" xmlns:t="urn:t">
                <xs:include schemaLocation="common.xsd"/>
                <xs:include schemaLocation="./common.xsd"/>
                <xs:element name="code" type="t:Code"/>
            </xs:schema>"#
        )
        .unwrap();

        let grammar = compile_schema(
            SchemaSource::Uri(main.to_str().unwrap()),
            &CompileOptions::default(),
        )
        .unwrap();
        assert!(grammar.lookup_type(&QName::namespaced("urn:t", "Code")).is_some());
    }

    #[test]
    fn test_missing_include_is_fatal_but_missing_import_is_not() {
        let include = format!(r#"<xs:schema {XS}><xs:include schemaLocation="/no/such/file.xsd"/></xs:schema>"#);
        assert!(matches!(
            compile_text(&include).unwrap_err(),
            CompileError::Resource(_)
        ));

        let import = format!(
            r#"<xs:schema {XS}>
                <xs:import namespace="urn:other" schemaLocation="/no/such/file.xsd"/>
                <xs:element name="a"/>
            </xs:schema>"#
        );
        assert!(compile_text(&import).is_ok());
    }

    #[test]
    fn test_component_limit() {
        let xsd = format!(
            r#"<xs:schema {XS}><xs:element name="a"/><xs:element name="b"/></xs:schema>"#
        );
        let mut limits = Limits::default();
        limits.max_schema_components = 1;
        let err = compile_schema(
            SchemaSource::Text(&xsd),
            &CompileOptions::default().with_limits(limits),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::LimitExceeded(_)));
    }
}

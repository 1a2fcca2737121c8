//! Component finalization
//!
//! Once every component body is parsed, derived parts are computed in
//! dependency order: facets are compiled against their (now final) base,
//! complex types inherit content and attributes, attribute groups are
//! flattened, element types fall back along substitution groups, and
//! default and fixed values are checked.
//!
//! The dependency graph also detects cycles: a type reaching itself through
//! base, item or member references is a cyclic derivation, and a named
//! model or attribute group reaching itself is a circular group.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use super::attributes::{merge_uses, merge_wildcards, AttributeItem, AttributeSet, AttributeUse};
use super::builtins::Primitive;
use super::complex_types::{ComplexTypeDefinition, ContentType, DeclaredContent, Derivation};
use super::facets::{FacetSpec, Facets};
use super::grammar::{AttributeGroupId, ElementId, Grammar, GroupId, TypeDefinition, TypeId};
use super::groups::{Compositor, ModelGroup};
use super::particles::{Particle, Term};
use super::simple_types::{SimpleType, SimpleTypeDefinition};
use super::wildcards::Wildcard;
use crate::error::CompileError;

/// A node of the component dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Node {
    Type(TypeId),
    Group(GroupId),
    AttributeGroup(AttributeGroupId),
}

/// Compute every derived part of a freshly parsed grammar
pub(crate) fn finalize(
    grammar: &mut Grammar,
    pending_facets: &mut HashMap<TypeId, Vec<FacetSpec>>,
) -> Result<(), CompileError> {
    for node in dependency_order(grammar)? {
        match node {
            Node::Type(id) if !grammar.is_builtin(id) => {
                let name = grammar.type_display_name(id);
                finalize_type(grammar, id, pending_facets).map_err(|e| match e {
                    CompileError::InvalidSchema(err) if err.location.is_none() => {
                        CompileError::InvalidSchema(err.with_location(format!("type {}", name)))
                    }
                    other => other,
                })?;
            }
            Node::AttributeGroup(id) => {
                let set = grammar.attribute_groups[id.0].attributes.clone();
                let (uses, wildcard) = expand_attribute_set(grammar, &set);
                let group = &mut grammar.attribute_groups[id.0];
                group.uses = uses;
                group.wildcard = wildcard;
            }
            Node::Type(_) | Node::Group(_) => {}
        }
    }

    resolve_element_types(grammar)?;
    compute_substitutes(grammar)?;
    check_value_constraints(grammar)?;

    debug!(
        types = grammar.types.len(),
        elements = grammar.elements.len(),
        groups = grammar.groups.len(),
        "grammar finalized"
    );
    Ok(())
}

/// Order components so each comes after everything it depends on
fn dependency_order(grammar: &Grammar) -> Result<Vec<Node>, CompileError> {
    let mut graph: DiGraphMap<Node, ()> = DiGraphMap::new();

    for (index, definition) in grammar.types.iter().enumerate() {
        let id = TypeId(index);
        if grammar.is_builtin(id) {
            continue;
        }
        let node = graph.add_node(Node::Type(id));
        match definition {
            TypeDefinition::Simple(simple) => {
                for dependency in simple.dependencies() {
                    graph.add_edge(node, Node::Type(dependency), ());
                }
            }
            TypeDefinition::Complex(complex) => {
                if let Some(base) = complex.base {
                    graph.add_edge(node, Node::Type(base), ());
                }
                match &complex.declared {
                    DeclaredContent::Complex(Some(particle)) => {
                        for group in particle.group_refs() {
                            graph.add_edge(node, Node::Group(group), ());
                        }
                    }
                    DeclaredContent::SimpleRestriction(value_type) => {
                        graph.add_edge(node, Node::Type(*value_type), ());
                    }
                    _ => {}
                }
                for group in complex.declared_attributes.group_refs() {
                    graph.add_edge(node, Node::AttributeGroup(group), ());
                }
            }
        }
    }

    for (index, definition) in grammar.groups.iter().enumerate() {
        let node = graph.add_node(Node::Group(GroupId(index)));
        for particle in &definition.group.particles {
            for group in particle.group_refs() {
                graph.add_edge(node, Node::Group(group), ());
            }
        }
    }

    for (index, definition) in grammar.attribute_groups.iter().enumerate() {
        let node = graph.add_node(Node::AttributeGroup(AttributeGroupId(index)));
        for group in definition.attributes.group_refs() {
            graph.add_edge(node, Node::AttributeGroup(group), ());
        }
    }

    let mut order = toposort(&graph, None).map_err(|cycle| match cycle.node_id() {
        Node::Type(id) => CompileError::CyclicDerivation(grammar.type_display_name(id)),
        Node::Group(id) => CompileError::CircularGroup(grammar.groups[id.0].name.to_string()),
        Node::AttributeGroup(id) => {
            CompileError::CircularGroup(grammar.attribute_groups[id.0].name.to_string())
        }
    })?;
    // Edges point at dependencies
    order.reverse();
    Ok(order)
}

fn finalize_type(
    grammar: &mut Grammar,
    id: TypeId,
    pending_facets: &mut HashMap<TypeId, Vec<FacetSpec>>,
) -> Result<(), CompileError> {
    match grammar.type_definition(id).clone() {
        TypeDefinition::Simple(simple) => finalize_simple(grammar, id, simple, pending_facets),
        TypeDefinition::Complex(complex) => finalize_complex(grammar, id, complex),
    }
}

fn finalize_simple(
    grammar: &mut Grammar,
    id: TypeId,
    simple: SimpleTypeDefinition,
    pending_facets: &mut HashMap<TypeId, Vec<FacetSpec>>,
) -> Result<(), CompileError> {
    match simple.variety {
        SimpleType::Restriction { base, .. } => {
            // simpleContent restrictions name the complex base here
            let base = match grammar.type_definition(base) {
                TypeDefinition::Simple(_) => base,
                TypeDefinition::Complex(complex) => match complex.content {
                    ContentType::Simple(value_type) => value_type,
                    _ => {
                        return Err(CompileError::invalid(format!(
                            "base type {} does not have simple content",
                            grammar.type_display_name(base)
                        )))
                    }
                },
            };

            let specs = pending_facets.remove(&id).unwrap_or_default();
            let facets = Facets::compile(&specs, grammar.primitive_of(base), |value| {
                grammar.validate_value(base, value)
            })?;
            if let Some(white_space) = facets.white_space {
                let inherited = grammar.white_space_of(base);
                if white_space < inherited {
                    return Err(CompileError::invalid(format!(
                        "whiteSpace '{}' is less restrictive than the base type's '{}'",
                        white_space, inherited
                    )));
                }
            }

            *grammar.type_mut(id) = TypeDefinition::Simple(SimpleTypeDefinition::new(
                simple.name,
                SimpleType::Restriction { base, facets },
            ));
        }
        SimpleType::List { item } => {
            if !grammar.type_definition(item).is_simple() {
                return Err(CompileError::invalid("list item type must be a simple type"));
            }
            if grammar.primitive_of(item) == Primitive::List {
                return Err(CompileError::invalid("list item type must not itself be a list"));
            }
        }
        SimpleType::Union { members } => {
            if let Some(member) = members
                .iter()
                .find(|m| !grammar.type_definition(**m).is_simple())
            {
                return Err(CompileError::invalid(format!(
                    "union member {} must be a simple type",
                    grammar.type_display_name(*member)
                )));
            }
        }
        SimpleType::Builtin(_) => {}
    }
    Ok(())
}

/// Content of a type from its own particle alone
fn own_content(declared: &Option<Particle>, mixed: bool) -> ContentType {
    match declared {
        Some(particle) => ContentType::Elements(particle.clone()),
        None if mixed => ContentType::Elements(Particle::once(Term::Group(ModelGroup::new(
            Compositor::Sequence,
            Vec::new(),
        )))),
        None => ContentType::Empty,
    }
}

fn finalize_complex(
    grammar: &mut Grammar,
    id: TypeId,
    complex: ComplexTypeDefinition,
) -> Result<(), CompileError> {
    let base = complex.base.unwrap_or_else(|| grammar.any_type());
    let (base_content, base_mixed, base_uses, base_wildcard) = match grammar.type_definition(base)
    {
        TypeDefinition::Simple(_) => (ContentType::Simple(base), false, Vec::new(), None),
        TypeDefinition::Complex(b) => (
            b.content.clone(),
            b.mixed,
            b.attribute_uses.clone(),
            b.attribute_wildcard.clone(),
        ),
    };

    let mut mixed = complex.mixed;
    let content = match (&complex.declared, complex.derivation) {
        (DeclaredContent::SimpleExtension, _) => match base_content {
            ContentType::Simple(value_type) => ContentType::Simple(value_type),
            _ => {
                return Err(CompileError::invalid(format!(
                    "simpleContent extension of {} requires a simple type or simple content",
                    grammar.type_display_name(base)
                )))
            }
        },
        (DeclaredContent::SimpleRestriction(value_type), _) => match base_content {
            ContentType::Simple(_) => ContentType::Simple(*value_type),
            _ => {
                return Err(CompileError::invalid(format!(
                    "simpleContent restriction of {} requires a base with simple content",
                    grammar.type_display_name(base)
                )))
            }
        },
        (DeclaredContent::Complex(declared), Derivation::Extension) => match base_content {
            ContentType::Simple(value_type) => match declared {
                None => ContentType::Simple(value_type),
                Some(_) => {
                    return Err(CompileError::invalid(format!(
                        "cannot add element content to {}, which has simple content",
                        grammar.type_display_name(base)
                    )))
                }
            },
            ContentType::Elements(base_particle) => {
                mixed = mixed || base_mixed;
                match declared {
                    Some(particle) => ContentType::Elements(Particle::once(Term::Group(
                        ModelGroup::new(
                            Compositor::Sequence,
                            vec![base_particle, particle.clone()],
                        ),
                    ))),
                    None => ContentType::Elements(base_particle),
                }
            }
            ContentType::Empty | ContentType::Any => own_content(declared, mixed),
        },
        (DeclaredContent::Complex(declared), Derivation::Restriction) => {
            own_content(declared, mixed)
        }
    };

    let (own_uses, own_wildcard) = expand_attribute_set(grammar, &complex.declared_attributes);
    let mut uses = base_uses;
    merge_uses(&mut uses, own_uses);
    let wildcard = match complex.derivation {
        Derivation::Extension => own_wildcard.or(base_wildcard),
        Derivation::Restriction => own_wildcard,
    };

    if let TypeDefinition::Complex(target) = grammar.type_mut(id) {
        target.content = content;
        target.mixed = mixed;
        target.attribute_uses = uses;
        target.attribute_wildcard = wildcard;
    }
    Ok(())
}

/// Flatten declared attributes and referenced groups into uses and a
/// wildcard; referenced groups must already be expanded
fn expand_attribute_set(
    grammar: &Grammar,
    set: &AttributeSet,
) -> (Vec<AttributeUse>, Option<Wildcard>) {
    let mut uses = Vec::new();
    let mut group_wildcard = None;
    for item in &set.items {
        match item {
            AttributeItem::Use(attribute) => merge_uses(&mut uses, [attribute.clone()]),
            AttributeItem::Group(id) => {
                let group = &grammar.attribute_groups[id.0];
                merge_uses(&mut uses, group.uses.iter().cloned());
                group_wildcard = merge_wildcards(group_wildcard, group.wildcard.clone());
            }
        }
    }
    (uses, merge_wildcards(set.wildcard.clone(), group_wildcard))
}

/// Elements without a type take their substitution head's, else anyType
fn resolve_element_types(grammar: &mut Grammar) -> Result<(), CompileError> {
    for index in 0..grammar.elements.len() {
        if grammar.elements[index].type_id.is_some() {
            continue;
        }
        let mut resolved = None;
        let mut head = grammar.elements[index].substitution_head;
        let mut steps = 0;
        while let Some(h) = head {
            if let Some(type_id) = grammar.elements[h.0].type_id {
                resolved = Some(type_id);
                break;
            }
            steps += 1;
            if steps > grammar.elements.len() {
                return Err(CompileError::CyclicDerivation(format!(
                    "substitution group of element {}",
                    grammar.elements[index].name
                )));
            }
            head = grammar.elements[h.0].substitution_head;
        }
        let any_type = grammar.any_type();
        grammar.elements[index].type_id = Some(resolved.unwrap_or(any_type));
    }
    Ok(())
}

/// Record every element under each of its (transitive) substitution heads
fn compute_substitutes(grammar: &mut Grammar) -> Result<(), CompileError> {
    let count = grammar.elements.len();
    let mut substitutes: Vec<Vec<ElementId>> = vec![Vec::new(); count];

    for index in 0..count {
        let member = ElementId(index);
        let Some(direct_head) = grammar.elements[index].substitution_head else {
            continue;
        };
        if !grammar.derives_from(grammar.element_type(member), grammar.element_type(direct_head)) {
            return Err(CompileError::invalid(format!(
                "type of element {} does not derive from the type of its substitution group head {}",
                grammar.elements[index].name, grammar.elements[direct_head.0].name
            )));
        }

        let mut seen = HashSet::from([member]);
        let mut head = Some(direct_head);
        while let Some(h) = head {
            if !seen.insert(h) {
                return Err(CompileError::CyclicDerivation(format!(
                    "substitution group of element {}",
                    grammar.elements[index].name
                )));
            }
            substitutes[h.0].push(member);
            head = grammar.elements[h.0].substitution_head;
        }
    }

    for (declaration, members) in grammar.elements.iter_mut().zip(substitutes) {
        declaration.substitutes = members;
    }
    Ok(())
}

/// Default and fixed values must be valid for the declared type
fn check_value_constraints(grammar: &Grammar) -> Result<(), CompileError> {
    for element in &grammar.elements {
        let Some(value) = element.value_constraint() else {
            continue;
        };
        let type_id = element.type_id.unwrap_or_else(|| grammar.any_type());
        let checked = match grammar.type_definition(type_id) {
            TypeDefinition::Simple(_) => true,
            TypeDefinition::Complex(complex) => match &complex.content {
                ContentType::Simple(_) => true,
                ContentType::Any => false,
                ContentType::Elements(_) if complex.mixed => false,
                _ => {
                    return Err(CompileError::invalid(format!(
                        "element {} has a value constraint but its type does not allow text",
                        element.name
                    )))
                }
            },
        };
        if checked {
            grammar.validate_value(type_id, value).map_err(|e| {
                CompileError::invalid(format!(
                    "value constraint '{}' of element {} is invalid: {}",
                    value, element.name, e
                ))
            })?;
        }
    }

    let declared = grammar
        .attributes
        .iter()
        .map(|a| (&a.name, a.type_id, a.default.as_deref().or(a.fixed.as_deref())));
    let used = grammar
        .types
        .iter()
        .filter_map(TypeDefinition::as_complex)
        .flat_map(|c| c.attribute_uses.iter())
        .map(|u| (&u.name, u.type_id, u.default.as_deref().or(u.fixed.as_deref())));

    for (name, type_id, value) in declared.chain(used) {
        if let Some(value) = value {
            grammar.validate_value(type_id, value).map_err(|e| {
                CompileError::invalid(format!(
                    "value constraint '{}' of attribute {} is invalid: {}",
                    value, name, e
                ))
            })?;
        }
    }
    Ok(())
}

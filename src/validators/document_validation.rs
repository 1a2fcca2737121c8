//! Document validation
//!
//! Depth-first walk of a document against a compiled grammar. Each element
//! is checked against its declaration and type; its children are matched
//! against the content model and then visited with the declarations they
//! were bound to. Violations are reported and the walk continues, so one
//! pass surfaces every recoverable problem.

use std::collections::HashMap;

use tracing::trace;

use super::builtins::XsdValue;
use super::complex_types::{ComplexTypeDefinition, ContentType};
use super::elements::ElementDeclaration;
use super::facets::WhiteSpace;
use super::grammar::{ElementId, Grammar, TypeDefinition, TypeId};
use super::models::{match_content, Binding};
use super::validation::ValidationContext;
use super::wildcards::ProcessContents;
use crate::diagnostics::Diagnostic;
use crate::documents::{Document, Element};
use crate::namespaces::{QName, XSI_NAMESPACE};

/// `xsi:` attribute local names
mod xsi_attrs {
    pub const TYPE: &str = "type";
    pub const NIL: &str = "nil";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const NO_NAMESPACE_SCHEMA_LOCATION: &str = "noNamespaceSchemaLocation";
}

/// Validate a whole document
pub(crate) fn validate_document(ctx: &mut ValidationContext<'_>, grammar: &Grammar, document: &Document) {
    let Some(root) = document.root() else {
        ctx.report(Diagnostic::error("document has no root element"));
        return;
    };
    trace!(root = %root.qname, "validating document");

    ctx.enter(root.local_name().to_string());
    match grammar.lookup_element(&root.qname) {
        Some(id) => validate_element(ctx, grammar, root, id),
        None => ctx.error(format!("no declaration found for root element {}", root.qname)),
    }
    ctx.leave();
}

/// Path segments of an element's children: the local name, indexed when
/// siblings share the name
fn child_segments(element: &Element) -> Vec<String> {
    let mut totals: HashMap<&QName, usize> = HashMap::new();
    for child in &element.children {
        *totals.entry(&child.qname).or_default() += 1;
    }
    let mut seen: HashMap<&QName, usize> = HashMap::new();
    element
        .children
        .iter()
        .map(|child| {
            let ordinal = seen.entry(&child.qname).or_default();
            *ordinal += 1;
            if totals.get(&child.qname).copied().unwrap_or(0) > 1 {
                format!("{}[{}]", child.local_name(), ordinal)
            } else {
                child.local_name().to_string()
            }
        })
        .collect()
}

fn xsi(local_name: &str) -> QName {
    QName::namespaced(XSI_NAMESPACE, local_name)
}

/// Validate an element against a declaration
fn validate_element(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    element: &Element,
    id: ElementId,
) {
    let declaration = grammar.element(id);
    if declaration.is_abstract {
        ctx.error(format!(
            "element {} is abstract and cannot appear in a document",
            declaration.name
        ));
    }

    let mut type_id = grammar.element_type(id);
    if let Some(value) = element.get_attribute_qname(&xsi(xsi_attrs::TYPE)) {
        match element.resolve_qname(value) {
            Ok(name) => match grammar.lookup_type(&name) {
                Some(actual) if grammar.derives_from(actual, type_id) => type_id = actual,
                Some(actual) => ctx.error(format!(
                    "xsi:type {} does not derive from the declared type {}",
                    grammar.type_display_name(actual),
                    grammar.type_display_name(type_id)
                )),
                None => ctx.error(format!("xsi:type names an unknown type {}", name)),
            },
            Err(_) => ctx.error(format!("xsi:type value '{}' cannot be resolved", value)),
        }
    }

    let nilled = match element.get_attribute_qname(&xsi(xsi_attrs::NIL)).map(str::trim) {
        None | Some("false") | Some("0") => false,
        Some("true") | Some("1") => true,
        Some(other) => {
            ctx.error(format!("xsi:nil value '{}' is not a boolean", other));
            false
        }
    };
    if nilled {
        if !declaration.nillable {
            ctx.error(format!("element {} is not nillable", declaration.name));
        } else {
            if element.has_text() || !element.children.is_empty() {
                ctx.error(format!("nilled element {} must be empty", declaration.name));
            }
            if declaration.fixed.is_some() {
                ctx.error(format!(
                    "element {} has a fixed value and cannot be nilled",
                    declaration.name
                ));
            }
            if let TypeDefinition::Complex(complex) = grammar.type_definition(type_id) {
                validate_attributes(ctx, grammar, element, complex);
            }
            return;
        }
    }

    validate_typed(ctx, grammar, element, type_id, Some(declaration));
}

/// Validate an element against a type
fn validate_typed(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    element: &Element,
    type_id: TypeId,
    declaration: Option<&ElementDeclaration>,
) {
    if grammar.is_abstract_type(type_id) {
        ctx.error(format!(
            "type {} is abstract; use xsi:type to select a derived type",
            grammar.type_display_name(type_id)
        ));
    }

    match grammar.type_definition(type_id) {
        TypeDefinition::Simple(_) => {
            for qname in element.attributes.keys() {
                if qname.namespace.as_deref() != Some(XSI_NAMESPACE) {
                    let location = ctx.attribute_location(&qname.local_name);
                    ctx.error_at(&location, format!("attribute {} is not allowed", qname));
                }
            }
            if !element.children.is_empty() {
                ctx.error(format!(
                    "element {} has a simple type and cannot contain elements",
                    element.qname
                ));
            } else {
                check_element_value(ctx, grammar, element, type_id, declaration);
            }
        }
        TypeDefinition::Complex(complex) => {
            validate_attributes(ctx, grammar, element, complex);
            match &complex.content {
                ContentType::Any => validate_lax_children(ctx, grammar, element),
                ContentType::Empty => {
                    if !element.children.is_empty() || element.has_text() {
                        ctx.error(format!("element {} must be empty", element.qname));
                    }
                }
                ContentType::Simple(_) => {
                    if !element.children.is_empty() {
                        ctx.error(format!(
                            "element {} has simple content and cannot contain elements",
                            element.qname
                        ));
                    } else {
                        check_element_value(ctx, grammar, element, type_id, declaration);
                    }
                }
                ContentType::Elements(particle) => {
                    if !complex.mixed && element.has_text() {
                        ctx.error(format!(
                            "element {} cannot contain text, only elements",
                            element.qname
                        ));
                    }
                    if complex.mixed && element.children.is_empty() {
                        check_mixed_fixed(ctx, element, declaration);
                    }

                    let names: Vec<&QName> = element.children.iter().map(|c| &c.qname).collect();
                    let result =
                        match_content(grammar, particle, &names, ctx.limits().max_match_steps);
                    if !result.matched {
                        if result.errors.is_empty() {
                            ctx.error(format!(
                                "content of element {} does not match its content model",
                                element.qname
                            ));
                        }
                        for message in result.errors {
                            ctx.error(message);
                        }
                    }
                    validate_children(ctx, grammar, element, &result.bindings);
                }
            }
        }
    }
}

/// Text of a mixed element with a fixed value must equal it
fn check_mixed_fixed(
    ctx: &mut ValidationContext<'_>,
    element: &Element,
    declaration: Option<&ElementDeclaration>,
) {
    if let Some(fixed) = declaration.and_then(|d| d.fixed.as_deref()) {
        if !element.text.is_empty() && element.text != fixed {
            ctx.error(format!(
                "value '{}' of element {} does not match the fixed value '{}'",
                element.text, element.qname, fixed
            ));
        }
    }
}

/// Check the text of a simple-typed element or one with simple content
fn check_element_value(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    element: &Element,
    type_id: TypeId,
    declaration: Option<&ElementDeclaration>,
) {
    let value = match declaration.and_then(ElementDeclaration::value_constraint) {
        Some(constraint) if element.text.is_empty() => constraint,
        _ => element.text.as_str(),
    };

    match grammar.validate_value(type_id, value) {
        Ok(actual) => {
            if let Some(fixed) = declaration.and_then(|d| d.fixed.as_deref()) {
                if !same_value(grammar, type_id, &actual, fixed) {
                    ctx.error(format!(
                        "value '{}' of element {} does not match the fixed value '{}'",
                        value.trim(),
                        element.qname,
                        fixed
                    ));
                }
            }
            let location = ctx.location();
            record_identity(ctx, grammar, type_id, value, &location);
        }
        Err(e) => ctx.error(format!("element {}: {}", element.qname, e)),
    }
}

fn same_value(grammar: &Grammar, type_id: TypeId, actual: &XsdValue, fixed: &str) -> bool {
    grammar
        .validate_value(type_id, fixed)
        .map_or(false, |expected| &expected == actual)
}

/// Register ID and IDREF(S) values
fn record_identity(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    type_id: TypeId,
    value: &str,
    location: &str,
) {
    match grammar.identity_kind(type_id) {
        Some("ID") => ctx.register_id(&WhiteSpace::Collapse.normalize(value), location),
        Some(_) => {
            for reference in value.split_whitespace() {
                ctx.register_idref(reference, location);
            }
        }
        None => {}
    }
}

fn validate_attributes(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    element: &Element,
    complex: &ComplexTypeDefinition,
) {
    for (qname, value) in &element.attributes {
        let location = ctx.attribute_location(&qname.local_name);

        if qname.namespace.as_deref() == Some(XSI_NAMESPACE) {
            match qname.local_name.as_str() {
                xsi_attrs::TYPE | xsi_attrs::NIL | xsi_attrs::NO_NAMESPACE_SCHEMA_LOCATION => {}
                xsi_attrs::SCHEMA_LOCATION => ctx.warning_at(
                    &location,
                    "xsi:schemaLocation hint ignored; validating against the compiled grammar",
                ),
                _ => ctx.error_at(&location, format!("unknown attribute {}", qname)),
            }
            continue;
        }

        match complex.attribute_use(qname) {
            Some(attribute) if attribute.is_prohibited() => {
                ctx.error_at(&location, format!("attribute {} is prohibited", qname));
            }
            Some(attribute) => check_attribute_value(
                ctx,
                grammar,
                &location,
                qname,
                attribute.type_id,
                attribute.fixed.as_deref(),
                value,
            ),
            None => match &complex.attribute_wildcard {
                Some(wildcard) if wildcard.admits(qname.namespace.as_deref()) => {
                    match (wildcard.process_contents, grammar.lookup_attribute(qname)) {
                        (ProcessContents::Skip, _) => {}
                        (_, Some(declaration)) => check_attribute_value(
                            ctx,
                            grammar,
                            &location,
                            qname,
                            declaration.type_id,
                            declaration.fixed.as_deref(),
                            value,
                        ),
                        (ProcessContents::Strict, None) => ctx.error_at(
                            &location,
                            format!("no declaration found for attribute {}", qname),
                        ),
                        (ProcessContents::Lax, None) => {}
                    }
                }
                _ => ctx.error_at(&location, format!("attribute {} is not allowed", qname)),
            },
        }
    }

    for attribute in &complex.attribute_uses {
        if attribute.is_required() && element.get_attribute_qname(&attribute.name).is_none() {
            ctx.error(format!("missing required attribute {}", attribute.name));
        }
    }
}

fn check_attribute_value(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    location: &str,
    name: &QName,
    type_id: TypeId,
    fixed: Option<&str>,
    value: &str,
) {
    match grammar.validate_value(type_id, value) {
        Ok(actual) => {
            if let Some(fixed) = fixed {
                if !same_value(grammar, type_id, &actual, fixed) {
                    ctx.error_at(
                        location,
                        format!(
                            "value '{}' of attribute {} does not match the fixed value '{}'",
                            value, name, fixed
                        ),
                    );
                }
            }
            record_identity(ctx, grammar, type_id, value, location);
        }
        Err(e) => ctx.error_at(location, format!("attribute {}: {}", name, e)),
    }
}

/// Visit children with the declarations the content model bound them to
fn validate_children(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    element: &Element,
    bindings: &[Option<Binding>],
) {
    let segments = child_segments(element);
    for ((child, binding), segment) in element.children.iter().zip(bindings).zip(segments) {
        let Some(binding) = binding else {
            continue;
        };
        ctx.enter(segment);
        if ctx.depth() > ctx.limits().max_xml_depth {
            ctx.warning("maximum nesting depth exceeded; content not validated");
        } else {
            match binding {
                Binding::Element(id) => validate_element(ctx, grammar, child, *id),
                Binding::Wildcard(process_contents) => {
                    validate_wildcard_child(ctx, grammar, child, *process_contents)
                }
            }
        }
        ctx.leave();
    }
}

fn validate_wildcard_child(
    ctx: &mut ValidationContext<'_>,
    grammar: &Grammar,
    child: &Element,
    process_contents: ProcessContents,
) {
    match (process_contents, grammar.lookup_element(&child.qname)) {
        (ProcessContents::Skip, _) => {}
        (_, Some(id)) => validate_element(ctx, grammar, child, id),
        (ProcessContents::Strict, None) => ctx.error(format!(
            "no declaration found for element {} matched by a strict wildcard",
            child.qname
        )),
        (ProcessContents::Lax, None) => {
            ctx.warning(format!(
                "no declaration found for element {}; content not validated",
                child.qname
            ));
            validate_lax_children(ctx, grammar, child);
        }
    }
}

/// anyType content: children with a global declaration are validated,
/// the rest are walked
fn validate_lax_children(ctx: &mut ValidationContext<'_>, grammar: &Grammar, element: &Element) {
    let segments = child_segments(element);
    for (child, segment) in element.children.iter().zip(segments) {
        ctx.enter(segment);
        if ctx.depth() > ctx.limits().max_xml_depth {
            ctx.warning("maximum nesting depth exceeded; content not validated");
        } else {
            match grammar.lookup_element(&child.qname) {
                Some(id) => validate_element(ctx, grammar, child, id),
                None => validate_lax_children(ctx, grammar, child),
            }
        }
        ctx.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::parsing::{compile_schema, CompileOptions, SchemaSource};
    use crate::validators::validation::ValidationOptions;
    use pretty_assertions::assert_eq;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="order">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="item" maxOccurs="unbounded">
                <xs:complexType>
                  <xs:simpleContent>
                    <xs:extension base="xs:positiveInteger">
                      <xs:attribute name="sku" type="xs:ID" use="required"/>
                    </xs:extension>
                  </xs:simpleContent>
                </xs:complexType>
              </xs:element>
              <xs:element name="note" type="xs:string" minOccurs="0" nillable="true"/>
            </xs:sequence>
            <xs:attribute name="ref" type="xs:IDREF"/>
          </xs:complexType>
        </xs:element>
      </xs:schema>"#;

    fn check(xml: &str) -> Vec<String> {
        let grammar = compile_schema(SchemaSource::Text(XSD), &CompileOptions::default()).unwrap();
        let document = Document::from_string(xml).unwrap();
        let mut sink: Vec<Diagnostic> = Vec::new();
        ValidationContext::new(&mut sink, ValidationOptions::default()).run(&grammar, &document);
        sink.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_valid_document() {
        let diagnostics = check(
            r#"<order ref="b"><item sku="a">1</item><item sku="b">2</item><note>hi</note></order>"#,
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_locations_index_repeated_siblings() {
        let diagnostics = check(r#"<order><item sku="a">1</item><item sku="b">zero</item></order>"#);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("/order/item[2]: error: element item:"));
    }

    #[test]
    fn test_attribute_errors_in_document_order() {
        let diagnostics = check(
            r#"<order bogus="1"><item>1</item><item sku="x" sku2="y">2</item></order>"#,
        );
        assert_eq!(
            diagnostics,
            vec![
                "/order/@bogus: error: attribute bogus is not allowed",
                "/order/item[1]: error: missing required attribute sku",
                "/order/item[2]/@sku2: error: attribute sku2 is not allowed",
            ]
        );
    }

    #[test]
    fn test_ids() {
        let diagnostics = check(
            r#"<order ref="missing"><item sku="a">1</item><item sku="a">2</item></order>"#,
        );
        assert_eq!(
            diagnostics,
            vec![
                "/order/item[2]/@sku: error: duplicate ID value 'a'",
                "/order/@ref: error: IDREF 'missing' does not match any ID in the document",
            ]
        );
    }

    #[test]
    fn test_nil() {
        let xsi = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;
        let ok = check(&format!(
            r#"<order {xsi}><item sku="a">1</item><note xsi:nil="true"/></order>"#
        ));
        assert!(ok.is_empty(), "{:?}", ok);

        let not_empty = check(&format!(
            r#"<order {xsi}><item sku="a">1</item><note xsi:nil="true">text</note></order>"#
        ));
        assert_eq!(not_empty, vec!["/order/note: error: nilled element note must be empty"]);

        let not_nillable = check(&format!(
            r#"<order {xsi}><item sku="a" xsi:nil="true">1</item></order>"#
        ));
        assert_eq!(not_nillable, vec!["/order/item: error: element item is not nillable"]);
    }

    #[test]
    fn test_no_root_declaration() {
        assert_eq!(
            check("<invoice/>"),
            vec!["/invoice: error: no declaration found for root element invoice"]
        );
    }

    #[test]
    fn test_child_segments() {
        let document = Document::from_string("<r><a/><b/><a/></r>").unwrap();
        let root = document.root().unwrap();
        assert_eq!(child_segments(root), vec!["a[1]", "b", "a[2]"]);
    }
}

//! XML document model
//!
//! A small read-only element tree: the input the validator walks, and the
//! form schema sources take before compilation. Names are resolved to
//! `(namespace, local-name)` pairs while parsing, and every element keeps
//! the namespace bindings in scope at that point so that QName-valued
//! content (`type="xs:int"`, `xsi:type="t:Foo"`) can be resolved later.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes in document order (namespace declarations excluded)
    pub attributes: IndexMap<QName, String>,
    /// Concatenated character data of this element (not of its descendants)
    pub text: String,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace bindings in scope for this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            text: String::new(),
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes.get(qname).map(|s| s.as_str())
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, qname: QName, value: impl Into<String>) {
        self.attributes.insert(qname, value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data
    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Whether the element carries any non-whitespace character data
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Resolve a QName-valued string in this element's namespace scope
    pub fn resolve_qname(&self, value: &str) -> Result<QName> {
        self.namespaces.resolve(value.trim())
    }
}

/// XML Document representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document around an existing root element
    pub fn with_root(root: Element) -> Self {
        Self { root: Some(root) }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Self::parse(&bytes)
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);
        reader.expand_empty_elements(false);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();
        let root_scope = NamespaceContext::new();

        loop {
            let position = reader.buffer_position();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let scope = element_stack
                        .last()
                        .map(|parent| &parent.namespaces)
                        .unwrap_or(&root_scope);
                    let element = Self::parse_element(&e, scope, limits)?;
                    if element_stack.is_empty() && doc.root.is_some() {
                        return Err(Self::position_error(position, "multiple root elements"));
                    }
                    element_stack.push(element);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let scope = element_stack
                        .last()
                        .map(|parent| &parent.namespaces)
                        .unwrap_or(&root_scope);
                    let element = Self::parse_element(&e, scope, limits)?;
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else if doc.root.is_some() {
                        return Err(Self::position_error(position, "multiple root elements"));
                    } else {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Self::position_error(position, &format!("bad text: {}", e)))?;
                    match element_stack.last_mut() {
                        Some(current) => current.push_text(&text),
                        None if !text.trim().is_empty() => {
                            return Err(Self::position_error(
                                position,
                                "character data outside the root element",
                            ))
                        }
                        None => {}
                    }
                }
                Ok(Event::CData(e)) => {
                    let raw = e.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| Self::position_error(position, &format!("bad CDATA: {}", e)))?;
                    if let Some(current) = element_stack.last_mut() {
                        current.push_text(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Declarations, comments, processing instructions, doctype
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "unexpected end of document: element '{}' is not closed",
                open.local_name()
            )));
        }

        Ok(doc)
    }

    fn position_error(position: usize, message: &str) -> Error {
        Error::Xml(format!("Error parsing XML at position {}: {}", position, message))
    }

    /// Parse element from BytesStart event, resolving names against `scope`
    fn parse_element(
        start: &BytesStart,
        scope: &NamespaceContext,
        limits: &Limits,
    ) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut namespaces = scope.clone();
        let mut raw_attributes = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }
        limits.check_attributes(raw_attributes.len())?;

        let qname = namespaces.resolve(&name)?;
        let mut element = Element::new(qname);

        for (attr_name, attr_value) in raw_attributes {
            let attr_qname = namespaces.resolve_attribute(&attr_name)?;
            if element.attributes.contains_key(&attr_qname) {
                return Err(Error::Xml(format!(
                    "duplicate attribute '{}' on element '{}'",
                    attr_name, name
                )));
            }
            element.attributes.insert(attr_qname, attr_value);
        }
        element.namespaces = namespaces;

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::XSI_NAMESPACE;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.root.is_none());
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text, "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="a &amp; b"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("a & b"));
        let names: Vec<_> = root.attributes.keys().map(|q| q.local_name.as_str()).collect();
        assert_eq!(names, vec!["attr1", "attr2"]);
    }

    #[test]
    fn test_namespaces_are_resolved() {
        let xml = r#"<root xmlns="http://example.com" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true" local="1">
            <inner xmlns:p="urn:p"><p:leaf/></inner>
        </root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.qname, QName::namespaced("http://example.com", "root"));
        assert_eq!(
            root.get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "nil")),
            Some("true")
        );
        assert_eq!(root.get_attribute("local"), Some("1"));

        let inner = &root.children[0];
        assert_eq!(inner.namespace(), Some("http://example.com"));
        assert_eq!(inner.children[0].qname, QName::namespaced("urn:p", "leaf"));
        assert_eq!(
            inner.resolve_qname("p:Type").unwrap(),
            QName::namespaced("urn:p", "Type")
        );
    }

    #[test]
    fn test_unknown_prefix_is_error() {
        assert!(Document::from_string("<p:root/>").is_err());
    }

    #[test]
    fn test_text_and_cdata_are_concatenated() {
        let doc = Document::from_string("<a>one <![CDATA[<two>]]> three</a>").unwrap();
        assert_eq!(doc.root.unwrap().text, "one <two> three");
    }

    #[test]
    fn test_malformed_xml() {
        assert!(Document::from_string("<a><b></a>").is_err());
        assert!(Document::from_string("<a>").is_err());
        assert!(Document::from_string("<a/><b/>").is_err());
        assert!(Document::from_string("<a x='1' x='2'/>").is_err());
    }

    #[test]
    fn test_empty_input_has_no_root() {
        let doc = Document::from_string("   ").unwrap();
        assert!(doc.root().is_none());
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_xml_depth: 2,
            ..Limits::default()
        };
        assert!(Document::parse_with_limits(b"<a><b/></a>", &limits).is_ok());
        let err = Document::parse_with_limits(b"<a><b><c/></b></a>", &limits);
        assert!(matches!(err, Err(Error::LimitExceeded(_))));
        let err = Document::parse_with_limits(b"<a><b><c></c></b></a>", &limits);
        assert!(matches!(err, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_find_children() {
        let xml = r#"<root><child1/><child2/><child1/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.find_children("child1").len(), 2);
    }
}

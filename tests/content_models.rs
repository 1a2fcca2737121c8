//! Content models, instance attributes, substitution groups and wildcards

use pretty_assertions::assert_eq;
use xsd_engine::{compile_from_text, Document, Grammar};

const NS_SCHEMA: &str = r###"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:shop" targetNamespace="urn:shop" elementFormDefault="qualified">

    <xs:element name="shop">
        <xs:complexType>
            <xs:sequence>
                <xs:element ref="tns:product" minOccurs="1" maxOccurs="3"/>
                <xs:choice minOccurs="0">
                    <xs:element name="open" type="xs:boolean"/>
                    <xs:element name="closed" type="xs:date"/>
                </xs:choice>
                <xs:element name="address" type="tns:Address" nillable="true" minOccurs="0"/>
                <xs:any namespace="##other" processContents="lax" minOccurs="0" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>

    <xs:element name="product" type="tns:Product" abstract="true"/>
    <xs:element name="book" type="tns:Book" substitutionGroup="tns:product"/>
    <xs:element name="pen" substitutionGroup="tns:product"/>

    <xs:complexType name="Product">
        <xs:all>
            <xs:element name="name" type="xs:string"/>
            <xs:element name="price" type="tns:Price" minOccurs="0"/>
        </xs:all>
    </xs:complexType>

    <xs:complexType name="Book">
        <xs:complexContent>
            <xs:extension base="tns:Product">
                <xs:attribute name="isbn" type="xs:string" use="required"/>
            </xs:extension>
        </xs:complexContent>
    </xs:complexType>

    <xs:simpleType name="Price">
        <xs:restriction base="xs:decimal">
            <xs:minInclusive value="0"/>
            <xs:fractionDigits value="2"/>
        </xs:restriction>
    </xs:simpleType>

    <xs:complexType name="Address">
        <xs:sequence>
            <xs:element name="city" type="xs:string"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="PostalAddress">
        <xs:complexContent>
            <xs:extension base="tns:Address">
                <xs:sequence>
                    <xs:element name="zip" type="xs:string"/>
                </xs:sequence>
            </xs:extension>
        </xs:complexContent>
    </xs:complexType>
</xs:schema>"###;

fn grammar() -> Grammar {
    compile_from_text(NS_SCHEMA).expect("schema should compile")
}

fn messages(xml: &str) -> Vec<String> {
    let document = Document::from_string(xml).expect("document should parse");
    grammar()
        .validate(&document)
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// A substitution group member with the content its inherited type requires
const PEN: &str = "<pen><name>p</name></pen>";

fn shop(body: &str) -> String {
    format!(
        r#"<shop xmlns="urn:shop" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">{}</shop>"#,
        body
    )
}

#[test]
fn test_valid_shop() {
    let xml = shop(
        r#"<book isbn="1-2"><price>9.50</price><name>Dune</name></book>
           <pen><name>pen</name></pen>
           <open>true</open>
           <address><city>Oslo</city></address>"#,
    );
    let diagnostics = messages(&xml);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_abstract_head_is_rejected() {
    let diagnostics = messages(&shop("<product><name>x</name></product>"));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("is abstract"), "{:?}", diagnostics);
}

#[test]
fn test_occurrence_upper_bound() {
    let pens = PEN.repeat(4);
    let diagnostics = messages(&shop(&pens));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("/shop: error: unexpected element"));
}

#[test]
fn test_choice_branches_exclusive() {
    let diagnostics = messages(&shop(
        &format!("{PEN}<open>false</open><closed>2024-01-01</closed>"),
    ));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("unexpected element"), "{:?}", diagnostics);

    let bad_date = messages(&shop(&format!("{PEN}<closed>tomorrow</closed>")));
    assert_eq!(bad_date.len(), 1);
    assert!(bad_date[0].starts_with("/shop/closed: error:"), "{:?}", bad_date);
}

#[test]
fn test_all_group_order_free_but_complete() {
    assert!(messages(&shop(r#"<book isbn="1"><name>n</name></book>"#)).is_empty());

    let diagnostics = messages(&shop(r#"<book isbn="1"><price>1</price></book>"#));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("missing required element"), "{:?}", diagnostics);
}

#[test]
fn test_facets_on_derived_simple_type() {
    let diagnostics = messages(&shop(
        r#"<book isbn="1"><name>n</name><price>-1.999</price></book>"#,
    ));
    assert!(!diagnostics.is_empty());
    assert!(diagnostics
        .iter()
        .all(|d| d.starts_with("/shop/book/price: error:")));
}

#[test]
fn test_xsi_type_selects_derived_type() {
    let ok = messages(&shop(
        &format!(r#"{PEN}<address xsi:type="PostalAddress"><city>Oslo</city><zip>0150</zip></address>"#),
    ));
    assert!(ok.is_empty(), "{:?}", ok);

    let missing_zip = messages(&shop(
        &format!(r#"{PEN}<address xsi:type="PostalAddress"><city>Oslo</city></address>"#),
    ));
    assert_eq!(missing_zip.len(), 1);
    assert!(missing_zip[0].contains("missing required element"));

    let unrelated = messages(&shop(&format!(
        r#"{PEN}<address xsi:type="Price"><city>Oslo</city></address>"#
    )));
    assert!(unrelated[0].contains("does not derive from"), "{:?}", unrelated);
}

#[test]
fn test_xsi_nil() {
    assert!(messages(&shop(&format!(r#"{PEN}<address xsi:nil="true"/>"#))).is_empty());

    let with_content = messages(&shop(
        &format!(r#"{PEN}<address xsi:nil="true"><city>x</city></address>"#),
    ));
    assert_eq!(with_content.len(), 1);
    assert!(with_content[0].contains("must be empty"));

    let not_nillable = messages(&shop(r#"<pen xsi:nil="true"><name>p</name></pen>"#));
    assert_eq!(not_nillable.len(), 1);
    assert!(not_nillable[0].contains("is not nillable"));
}

#[test]
fn test_lax_wildcard() {
    let declared_elsewhere = messages(&shop(
        &format!(r#"{PEN}<x:extra xmlns:x="urn:other"><x:deep/></x:extra>"#),
    ));
    assert_eq!(declared_elsewhere.len(), 1);
    assert!(declared_elsewhere[0].contains(": warning: no declaration found"));

    // ##other excludes the target namespace
    let same_ns = messages(&shop(&format!("{PEN}<stray/>")));
    assert_eq!(same_ns.len(), 1);
    assert!(same_ns[0].contains("error: unexpected element"), "{:?}", same_ns);
}

#[test]
fn test_missing_required_attribute_on_extension() {
    let diagnostics = messages(&shop("<book><name>n</name></book>"));
    assert_eq!(diagnostics, vec!["/shop/book: error: missing required attribute isbn"]);
}

#[test]
fn test_ids_and_idrefs() {
    let grammar = compile_from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="graph">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="node" maxOccurs="unbounded">
                            <xs:complexType>
                                <xs:attribute name="id" type="xs:ID" use="required"/>
                                <xs:attribute name="links" type="xs:IDREFS"/>
                            </xs:complexType>
                        </xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let ok = Document::from_string(r#"<graph><node id="a" links="b"/><node id="b" links="a b"/></graph>"#)
        .unwrap();
    assert!(grammar.validate(&ok).valid);

    let broken = Document::from_string(r#"<graph><node id="a" links="c"/><node id="a"/></graph>"#)
        .unwrap();
    let rendered: Vec<String> = grammar
        .validate(&broken)
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec![
            "/graph/node[2]/@id: error: duplicate ID value 'a'",
            "/graph/node[1]/@links: error: IDREF 'c' does not match any ID in the document",
        ]
    );
}

#[test]
fn test_long_list_of_siblings() {
    let grammar = compile_from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="log">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="line" type="xs:int" maxOccurs="unbounded"/>
                        <xs:choice minOccurs="0" maxOccurs="unbounded">
                            <xs:element name="warn" type="xs:string"/>
                            <xs:element name="info" type="xs:string"/>
                        </xs:choice>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let lines = "<line>1</line>".repeat(50_000);
    let events = "<warn>w</warn><info>i</info>".repeat(25_000);

    let valid = Document::from_string(&format!("<log>{}{}</log>", lines, events)).unwrap();
    let report = grammar.validate(&valid);
    assert!(report.valid, "{:?}", report.diagnostics.first());

    let invalid = Document::from_string(&format!("<log>{}<line>x</line></log>", lines)).unwrap();
    let rendered: Vec<String> = grammar
        .validate(&invalid)
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].starts_with("/log/line[50001]: error:"), "{:?}", rendered);
}

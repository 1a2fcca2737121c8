//! Property tests: validation is deterministic and reports in document order

use proptest::prelude::*;
use xsd_engine::{compile_from_text, Document, Grammar};

const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="list">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="entry" minOccurs="0" maxOccurs="unbounded">
                    <xs:complexType>
                        <xs:simpleContent>
                            <xs:extension base="xs:byte">
                                <xs:attribute name="n" type="xs:unsignedByte" use="required"/>
                            </xs:extension>
                        </xs:simpleContent>
                    </xs:complexType>
                </xs:element>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

fn grammar() -> Grammar {
    compile_from_text(SCHEMA).unwrap()
}

fn document(entries: &[(i32, i32)]) -> String {
    let body: String = entries
        .iter()
        .map(|(n, v)| format!(r#"<entry n="{}">{}</entry>"#, n, v))
        .collect();
    format!("<list>{}</list>", body)
}

/// Index of the `entry` a location points into, if any
fn entry_index(location: &str) -> usize {
    location
        .split("entry[")
        .nth(1)
        .and_then(|rest| rest.split(']').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}

proptest! {
    #[test]
    fn validation_is_idempotent(entries in prop::collection::vec((-300i32..300, -300i32..300), 0..12)) {
        let grammar = grammar();
        let doc = Document::from_string(&document(&entries)).unwrap();
        let first = grammar.validate(&doc);
        let second = grammar.validate(&doc);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn validity_matches_value_ranges(entries in prop::collection::vec((-300i32..300, -300i32..300), 0..12)) {
        let grammar = grammar();
        let doc = Document::from_string(&document(&entries)).unwrap();
        let expected = entries
            .iter()
            .all(|(n, v)| (0..=255).contains(n) && (-128..=127).contains(v));
        prop_assert_eq!(grammar.validate(&doc).valid, expected);
    }

    #[test]
    fn diagnostics_follow_document_order(entries in prop::collection::vec((-300i32..300, -300i32..300), 2..12)) {
        let grammar = grammar();
        let doc = Document::from_string(&document(&entries)).unwrap();
        let report = grammar.validate(&doc);
        let indices: Vec<usize> = report
            .diagnostics
            .iter()
            .filter_map(|d| d.location.as_deref())
            .map(entry_index)
            .collect();
        prop_assert!(indices.windows(2).all(|w| w[0] <= w[1]), "{:?}", indices);
    }
}

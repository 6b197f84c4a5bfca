//! Integration tests over realistic documents: catalog-style lookups,
//! typed access, mutation followed by re-serialization.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use xmlarbor::error::{StructuralErrorKind, ValueError};
use xmlarbor::serial::{serialize, serialize_with_options, SerializeOptions};
use xmlarbor::Document;

const BOOKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog>
	<book id="bk101" available="TRUE">
		<author>Gambardella, Matthew</author>
		<title>XML Developer's Guide</title>
		<genre>Computer</genre>
		<price>44.95</price>
		<publish_date>2000-10-01</publish_date>
	</book>
	<book id="bk102" available="no">
		<author>Ralls, Kim</author>
		<title>Midnight Rain</title>
		<genre>Fantasy</genre>
		<price>5.95</price>
		<publish_date>2000-12-16</publish_date>
	</book>
	<book id="bk103">
		<author>Corets, Eva</author>
		<title>Maeve Ascendant</title>
		<genre>Fantasy</genre>
		<price>5.95</price>
		<publish_date>2000-11-17</publish_date>
	</book>
</catalog>"#;

fn books() -> Document {
    Document::parse_str(BOOKS).unwrap_or_else(|e| panic!("parse failed: {e}"))
}

// --- Lookup ---

#[test]
fn test_path_lookup_follows_first_book() {
    let doc = books();
    let root = doc.root_element().unwrap();

    let price = doc.element_by_name(root, "book/price").unwrap();
    assert_eq!(doc.text(price).as_deref(), Some("44.95"));
    assert_eq!(doc.elements_by_name(root, "book/price").len(), 1);
    assert_eq!(doc.elements_by_name(root, "book").len(), 3);
    assert!(doc.has_element_with_name(root, "/book/genre/"));
    assert!(!doc.has_element_with_name(root, "book/isbn"));
}

#[test]
fn test_id_lookup_from_root_and_from_subtree() {
    let doc = books();
    let root = doc.root_element().unwrap();

    let bk103 = doc.element_by_id(root, "bk103").unwrap();
    let author = doc.element_by_name(bk103, "author").unwrap();
    assert_eq!(doc.text(author).as_deref(), Some("Corets, Eva"));

    let bk101 = doc.element_by_id(root, "bk101").unwrap();
    assert_eq!(doc.element_by_id(bk101, "bk103"), None);
    assert!(doc.has_element_with_id(root, "bk102"));
    assert!(!doc.has_element_with_id(root, "bk999"));
}

#[test]
fn test_layout_whitespace_is_not_content() {
    let doc = books();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.children(root).len(), 3);
    assert!(doc.text_nodes(root).next().is_none());
    assert_eq!(doc.text(root), None);
}

// --- Typed access ---

#[test]
fn test_typed_text_and_attributes() {
    let doc = books();
    let root = doc.root_element().unwrap();
    let bk101 = doc.element_by_id(root, "bk101").unwrap();
    let bk102 = doc.element_by_id(root, "bk102").unwrap();
    let bk103 = doc.element_by_id(root, "bk103").unwrap();
    let price = doc.element_by_name(bk101, "price").unwrap();

    assert_eq!(doc.text_as::<f64>(price), Ok(44.95));
    assert_eq!(doc.text_as::<i32>(price), Ok(44));
    assert_eq!(doc.attribute_as::<bool>(bk101, "available"), Ok(true));
    assert_eq!(doc.attribute_as::<bool>(bk102, "available"), Ok(false));
    assert_eq!(doc.attribute_as::<bool>(bk103, "available"), Ok(false));
    assert_eq!(
        doc.attribute_as::<f64>(bk103, "available"),
        Err(ValueError::Missing)
    );

    let title = doc.element_by_name(bk101, "title").unwrap();
    assert!(matches!(
        doc.text_as::<u32>(title),
        Err(ValueError::Malformed { target: "u32", .. })
    ));
}

// --- Mutation ---

#[test]
fn test_reparent_book_to_end() {
    let mut doc = books();
    let root = doc.root_element().unwrap();
    let bk101 = doc.element_by_id(root, "bk101").unwrap();

    doc.append_child(root, bk101).unwrap();

    let ids: Vec<_> = doc
        .elements_by_name(root, "book")
        .iter()
        .map(|&b| doc.element_id(b).unwrap())
        .collect();
    assert_eq!(ids, vec!["bk102", "bk103", "bk101"]);
    let price = doc.element_by_name(root, "book/price").unwrap();
    assert_eq!(doc.text(price).as_deref(), Some("5.95"));
    doc.verify_indices(root).unwrap();
}

#[test]
fn test_remove_and_reinsert_updates_serialization() {
    let mut doc = books();
    let root = doc.root_element().unwrap();
    let before = serialize(&doc);

    let bk102 = doc.element_by_id(root, "bk102").unwrap();
    doc.remove_child(root, bk102).unwrap();
    assert_eq!(doc.element_by_id(root, "bk102"), None);
    assert!(!serialize(&doc).contains("Midnight Rain"));

    let bk103 = doc.element_by_id(root, "bk103").unwrap();
    doc.remove_child(root, bk103).unwrap();
    doc.append_child(root, bk102).unwrap();
    doc.append_child(root, bk103).unwrap();
    assert_eq!(serialize(&doc), before);
}

#[test]
fn test_render_tracks_edits() {
    let mut doc = books();
    let root = doc.root_element().unwrap();
    let bk101 = doc.element_by_id(root, "bk101").unwrap();
    let genre = doc.element_by_name(bk101, "genre").unwrap();

    let original = doc.render(root).unwrap().to_string();
    let text = doc.children(genre)[0];
    doc.set_text(text, Some("Reference".to_string())).unwrap();

    let edited = doc.render(root).unwrap().to_string();
    assert_ne!(original, edited);
    assert!(edited.contains("<genre>Reference</genre>"));
    assert!(serialize(&doc).ends_with(&edited));
}

#[test]
fn test_duplicate_id_last_attached_wins_with_warning() {
    let mut doc = books();
    let root = doc.root_element().unwrap();
    let bk101 = doc.element_by_id(root, "bk101").unwrap();
    assert!(doc.diagnostics().is_empty());

    let dup = doc
        .create_element_with("book", Some("bk101"), [("edition", "2")])
        .unwrap();
    doc.append_child(root, dup).unwrap();

    assert_eq!(doc.element_by_id(root, "bk101"), Some(dup));
    assert_eq!(doc.diagnostics().len(), 1);

    doc.detach(dup).unwrap();
    assert_eq!(doc.element_by_id(root, "bk101"), Some(bk101));
}

// --- Hand-built documents ---

#[test]
fn test_hand_built_document_serializes_canonically() {
    let mut doc = Document::new();
    let root = doc.create_element("currencies").unwrap();
    doc.set_root_element(root).unwrap();

    let chf = doc
        .create_element_with("currency", Some("ccy1"), std::iter::empty::<(&str, &str)>())
        .unwrap();
    let name = doc.create_element("name").unwrap();
    let text = doc.create_text("Swiss Franc");
    let conversion = doc
        .create_element_with("conversion", None, [("USD", "1.10"), ("EUR", "0.83")])
        .unwrap();
    doc.append_child(name, text).unwrap();
    doc.append_child(chf, name).unwrap();
    doc.append_child(chf, conversion).unwrap();
    doc.append_child(root, chf).unwrap();

    assert_eq!(
        serialize_with_options(&doc, &SerializeOptions::default().declaration(false)),
        "<currencies>\n\
         \t<currency id=\"ccy1\">\n\
         \t\t<name>Swiss Franc</name>\n\
         \t\t<conversion EUR=\"0.83\" USD=\"1.10\"/>\n\
         \t</currency>\n\
         </currencies>"
    );

    let copy = Document::parse_str(&serialize(&doc)).unwrap();
    assert_eq!(copy, doc);
    let copy_root = copy.root_element().unwrap();
    let ccy1 = copy.element_by_id(copy_root, "ccy1").unwrap();
    let rates = copy.element_by_name(ccy1, "conversion").unwrap();
    assert_eq!(copy.attribute(rates, "EUR"), Some("0.83"));
}

#[test]
fn test_documents_compare_by_content() {
    let a = Document::parse_str("<r><x k='1'/><y>t</y></r>").unwrap();
    let b = Document::parse_str("<r><y>t</y><x k='1'/></r>").unwrap();
    let c = Document::parse_str("<r><y>t</y><x k='2'/></r>").unwrap();
    let d = Document::parse_str(r#"<?xml version="1.1"?><r><x k='1'/><y>t</y></r>"#).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

#[test]
fn test_position_paths_survive_roundtrip() {
    let doc = books();
    let root = doc.root_element().unwrap();
    let bk102 = doc.element_by_id(root, "bk102").unwrap();
    let title = doc.element_by_name(bk102, "title").unwrap();

    let path = doc.position_path(root, title).unwrap();
    assert_eq!(path, vec![1, 1]);

    let copy = Document::parse_str(&serialize(&doc)).unwrap();
    let copy_root = copy.root_element().unwrap();
    let found = copy.node_at_position(copy_root, &path).unwrap();
    assert_eq!(copy.text(found).as_deref(), Some("Midnight Rain"));
}

// --- Errors ---

#[test]
fn test_structural_errors_surface_kind_and_location() {
    let err = Document::parse_str("<a></a>\n<b></b>").unwrap_err();
    assert_eq!(
        err.structural.as_ref().map(|s| s.kind),
        Some(StructuralErrorKind::MultipleRoots)
    );
    assert_eq!(err.location.line, 2);

    let err = Document::parse_str("<a><b></a>").unwrap_err();
    assert!(err.to_string().starts_with("parse error at 1:"));
}

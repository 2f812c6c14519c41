//! Field, index and attribute access

use crate::fixtures::{CATALOG, DC, REPEATED};
use pretty_assertions::assert_eq;
use simplexml::{load_string, XmlError};

#[test]
fn field_addresses_first_match_and_index_walks_siblings() {
    let root = load_string(REPEATED).unwrap();
    let a = root.get_field("a").unwrap();

    assert_eq!(a.to_string(), "hi");
    assert_eq!(a.attribute("x").unwrap().to_string(), "1");
    assert_eq!(a.get_index(1).unwrap().to_string(), "lo");
    assert_eq!(a.count(), 2);
    assert!(a.get_index(2).is_none());
    assert!(root.get_field("missing").is_none());
}

#[test]
fn add_child_then_read_back() {
    let root = load_string("<r/>").unwrap();
    root.add_child("x", Some("v"), None).unwrap();
    assert_eq!(root.get_field("x").unwrap().to_string(), "v");
}

#[test]
fn set_field_creates_then_replaces() {
    let root = load_string("<r/>").unwrap();
    root.set_field("title", "first").unwrap();
    root.set_field("title", "second").unwrap();

    let title = root.get_field("title").unwrap();
    assert_eq!(title.count(), 1);
    assert_eq!(title.to_string(), "second");
}

#[test]
fn invalid_names_are_rejected_without_changes() {
    let root = load_string("<r/>").unwrap();
    for bad in ["", "1x", "a b"] {
        assert!(matches!(
            root.add_child(bad, None, None),
            Err(XmlError::InvalidName(_))
        ));
        assert!(matches!(
            root.set_field(bad, "v"),
            Err(XmlError::InvalidName(_))
        ));
    }
    assert_eq!(root.count(), 0);
}

#[test]
fn catalog_navigation() {
    let root = load_string(CATALOG).unwrap();
    assert_eq!(root.name(), "catalog");
    assert_eq!(root.count(), 3);

    let books = root.get_field("book").unwrap();
    assert_eq!(books.count(), 2);

    let second = books.get_index(1).unwrap();
    assert_eq!(second.attribute("id").unwrap().to_string(), "b2");
    assert_eq!(second.get_field("price").unwrap().to_string(), "25");
    assert_eq!(second.get_field("title").unwrap().to_string(), "XML");

    let ids: Vec<String> = books
        .iter()
        .filter_map(|b| b.attribute("id"))
        .map(|id| id.to_string())
        .collect();
    assert_eq!(ids, vec!["b1", "b2"]);

    // Whitespace between elements is not text
    assert_eq!(root.to_string(), "");
}

#[test]
fn index_access_sets_attributes() {
    let root = load_string(REPEATED).unwrap();
    let a = root.get_field("a").unwrap();
    a.set_index("x", 10).unwrap();
    a.set_index("y", "new").unwrap();

    assert_eq!(a.attribute("x").unwrap().to_string(), "10");
    assert_eq!(a.attribute("y").unwrap().to_string(), "new");
    // Still no child named x
    assert!(a.get_field("x").is_none());
}

#[test]
fn children_partition_by_namespace() {
    let root = load_string(CATALOG).unwrap();
    let book = root.get_field("book").unwrap().get_index(1).unwrap();

    let total = book.children(None, false).unwrap().count();
    let in_dc = book.children(Some(DC), false).unwrap().count();
    let outside_dc = book
        .children(None, false)
        .unwrap()
        .iter()
        .filter(|child| !child.get_namespaces(false).has_uri(DC))
        .count();

    assert_eq!(total, 3);
    assert_eq!(in_dc, 1);
    assert_eq!(in_dc + outside_dc, total);
}

#[test]
fn remove_field_makes_views_stale() {
    let root = load_string(CATALOG).unwrap();
    let second = root.get_field("book").unwrap().get_index(1).unwrap();

    assert_eq!(root.remove_field("book"), 2);
    assert_eq!(root.count(), 1);
    assert!(root.get_field("book").is_none());

    assert_eq!(second.name(), "");
    assert!(second.get_field("price").is_none());
    assert!(second.attribute("id").is_none());
    assert!(second.attributes(None, false).is_none());
    assert!(matches!(
        second.add_child("x", None, None),
        Err(XmlError::NotFound(_))
    ));
}

#[test]
fn remove_attribute() {
    let root = load_string(r#"<r a="1" b="2"/>"#).unwrap();
    assert!(root.remove_attribute("a"));
    assert!(!root.remove_attribute("a"));
    assert_eq!(root.attributes(None, false).unwrap().count(), 1);
}

#[test]
fn attribute_list_rejects_children() {
    let root = load_string(r#"<r a="1"/>"#).unwrap();
    let attrs = root.attributes(None, false).unwrap();
    assert!(matches!(
        attrs.add_child("x", None, None),
        Err(XmlError::NotSupported(_))
    ));
}

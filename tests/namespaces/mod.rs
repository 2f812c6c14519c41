//! Namespace-aware projections and enumeration

use crate::fixtures::{CATALOG, DC, EXTRA};
use pretty_assertions::assert_eq;
use simplexml::{load_string, XmlError};

#[test]
fn namespaced_attribute_add_and_get() {
    let root = load_string("<r/>").unwrap();
    root.add_attribute("plain", Some("p"), None).unwrap();
    root.add_attribute("dc:creator", Some("me"), Some(DC)).unwrap();

    let plain = root.attributes(None, false).unwrap();
    assert_eq!(plain.get_field("plain").unwrap().to_string(), "p");

    let by_uri = root.attributes(Some(DC), false).unwrap();
    assert_eq!(by_uri.count(), 1);
    assert_eq!(by_uri.get_field("creator").unwrap().to_string(), "me");

    let by_prefix = root.attributes(Some("dc"), true).unwrap();
    assert_eq!(by_prefix.get_field("creator").unwrap().to_string(), "me");

    assert_eq!(
        root.as_xml().unwrap(),
        format!(
            "<?xml version=\"1.0\"?>\n<r xmlns:dc=\"{}\" plain=\"p\" dc:creator=\"me\"/>\n",
            DC
        )
    );
}

#[test]
fn namespaced_attribute_without_prefix_fails() {
    let root = load_string(r#"<r a="1"/>"#).unwrap();
    let before = root.as_xml();

    assert!(matches!(
        root.add_attribute("b", Some("v"), Some(DC)),
        Err(XmlError::NamespaceRequiresPrefix(_))
    ));
    assert_eq!(root.attributes(None, false).unwrap().count(), 1);
    assert_eq!(root.as_xml(), before);

    // An empty namespace counts as none
    root.add_attribute("b", Some("v"), Some("")).unwrap();
    assert_eq!(root.attribute("b").unwrap().to_string(), "v");
}

#[test]
fn index_access_addresses_no_namespace_attributes() {
    let root = load_string(r#"<r xmlns:p="urn:p" p:x="ns"/>"#).unwrap();
    assert!(root.attribute("x").is_none());
    assert!(!root.remove_attribute("x"));

    root.set_index("x", "plain").unwrap();
    assert_eq!(
        root.as_xml().unwrap(),
        "<?xml version=\"1.0\"?>\n<r xmlns:p=\"urn:p\" p:x=\"ns\" x=\"plain\"/>\n"
    );
    assert_eq!(root.attribute("x").unwrap().to_string(), "plain");

    let namespaced = root.attributes(Some("urn:p"), false).unwrap();
    assert_eq!(namespaced.get_field("x").unwrap().to_string(), "ns");
}

#[test]
fn undeclared_prefix_is_rejected() {
    let root = load_string("<r/>").unwrap();
    assert!(matches!(root.set_index("q:x", "v"), Err(XmlError::InvalidName(_))));
    assert!(matches!(
        root.add_attribute("q:x", Some("v"), None),
        Err(XmlError::InvalidName(_))
    ));
    assert!(matches!(
        root.add_child("q:c", None, None),
        Err(XmlError::InvalidName(_))
    ));
    assert_eq!(root.as_xml().unwrap(), "<?xml version=\"1.0\"?>\n<r/>\n");
}

#[test]
fn used_namespaces() {
    let root = load_string(CATALOG).unwrap();
    assert!(root.get_namespaces(false).is_empty());

    let used = root.get_namespaces(true);
    let used: Vec<(&str, &str)> = used.iter().collect();
    assert_eq!(used, vec![("dc", DC), ("x", EXTRA)]);
}

#[test]
fn declared_namespaces() {
    let root = load_string(CATALOG).unwrap();
    let declared = root.get_doc_namespaces(false, true);
    assert_eq!(declared.get_uri("dc"), Some(DC));
    assert_eq!(declared.get_uri("x"), Some(EXTRA));

    let book = root.get_field("book").unwrap();
    assert!(book.get_doc_namespaces(true, false).is_empty());
    assert_eq!(book.get_doc_namespaces(false, true).len(), 2);
}

#[test]
fn recursive_namespaces_are_a_superset() {
    let docs = [
        CATALOG,
        r#"<a:r xmlns:a="urn:a"><b:c xmlns:b="urn:b" a:k="1"><d xmlns="urn:d"/></b:c></a:r>"#,
    ];
    for xml in docs {
        let root = load_string(xml).unwrap();
        for (flat, deep) in [
            (root.get_namespaces(false), root.get_namespaces(true)),
            (
                root.get_doc_namespaces(false, false),
                root.get_doc_namespaces(true, false),
            ),
        ] {
            for (prefix, uri) in &flat {
                assert_eq!(deep.get_uri(prefix), Some(uri));
            }
            assert!(deep.len() >= flat.len());
        }
    }
}

#[test]
fn default_namespace_children() {
    let root = load_string(r#"<r xmlns="urn:d"><a/><b xmlns=""/></r>"#).unwrap();
    assert_eq!(root.children(Some("urn:d"), false).unwrap().count(), 1);
    assert_eq!(root.children(None, false).unwrap().count(), 2);

    let used = root.get_namespaces(false);
    assert_eq!(used.get_uri(""), Some("urn:d"));
}

#[test]
fn add_child_in_namespace() {
    let root = load_string("<r/>").unwrap();
    let item = root.add_child("n:item", Some("1"), Some("urn:n")).unwrap();
    assert_eq!(item.name(), "item");
    assert_eq!(root.children(Some("urn:n"), false).unwrap().count(), 1);
    assert_eq!(
        root.as_xml().unwrap(),
        "<?xml version=\"1.0\"?>\n<r><n:item xmlns:n=\"urn:n\">1</n:item></r>\n"
    );
}

#[test]
fn filtered_children_field_access() {
    let root = load_string(CATALOG).unwrap();
    let book = root.get_field("book").unwrap().get_index(1).unwrap();

    let extra = book.children(Some("x"), true).unwrap();
    assert_eq!(extra.count(), 1);
    assert_eq!(extra.get_field("note").unwrap().to_string(), "cheap");
    assert!(extra.get_field("price").is_none());
}

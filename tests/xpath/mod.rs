//! Path queries

use crate::fixtures::{CATALOG, NESTED_ITEMS};
use pretty_assertions::assert_eq;
use simplexml::load_string;

#[test]
fn descendant_query_in_document_order() {
    let root = load_string(NESTED_ITEMS).unwrap();
    let items = root.xpath("//item").unwrap();
    assert_eq!(items.len(), 2);

    // Nested item comes first
    let parents: Vec<String> = items
        .iter()
        .map(|item| item.xpath("..").unwrap()[0].name())
        .collect();
    assert_eq!(parents, vec!["a", "root"]);
}

#[test]
fn invalid_and_empty_queries() {
    let root = load_string(NESTED_ITEMS).unwrap();
    assert!(root.xpath("nonsense[[").is_none());
    assert_eq!(root.xpath("//missing").map(|m| m.len()), Some(0));
    assert_eq!(
        root.xpath("//item[99999999999999999999]").map(|m| m.len()),
        Some(0)
    );
}

#[test]
fn predicates() {
    let root = load_string(CATALOG).unwrap();

    let price = root.xpath("//book[@id='b2']/price").unwrap();
    assert_eq!(price.len(), 1);
    assert_eq!(price[0].to_string(), "25");

    let last = root.xpath("/catalog/book[last()]/@id").unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].to_string(), "b2");

    let by_child = root.xpath("book[price='30']/@id").unwrap();
    assert_eq!(by_child[0].to_string(), "b1");

    let with_lang = root.xpath("book[@dc:lang]").unwrap();
    assert_eq!(with_lang.len(), 1);

    assert_eq!(root.xpath("//book[1]").unwrap().len(), 1);
    assert_eq!(root.xpath("*").unwrap().len(), 3);
}

#[test]
fn namespaced_queries() {
    let root = load_string(CATALOG).unwrap();

    let titles: Vec<String> = root
        .xpath("//dc:title")
        .unwrap()
        .iter()
        .map(|t| t.to_string())
        .collect();
    assert_eq!(titles, vec!["Rust", "XML"]);

    // Unprefixed tests only match elements without a namespace
    assert!(root.xpath("//title").unwrap().is_empty());
    assert_eq!(root.xpath("//x:*").unwrap().len(), 1);
    assert!(root.xpath("//undeclared:title").unwrap().is_empty());
}

#[test]
fn relative_queries_from_a_child() {
    let root = load_string(CATALOG).unwrap();
    let book = root.get_field("book").unwrap();

    let price = book.xpath("price").unwrap();
    assert_eq!(price[0].to_string(), "30");

    let magazine = book.xpath("../magazine/@id").unwrap();
    assert_eq!(magazine[0].to_string(), "m1");
    assert_eq!(magazine[0].name(), "id");
}

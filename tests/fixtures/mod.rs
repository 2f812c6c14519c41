//! Shared XML documents

pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const EXTRA: &str = "urn:extra";

pub const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:x="urn:extra">
  <book id="b1" dc:lang="en">
    <dc:title>Rust</dc:title>
    <price>30</price>
  </book>
  <book id="b2">
    <dc:title>XML</dc:title>
    <price>25</price>
    <x:note>cheap</x:note>
  </book>
  <magazine id="m1"/>
</catalog>"#;

pub const NESTED_ITEMS: &str = "<root><a><item/></a><item/></root>";

pub const REPEATED: &str = r#"<r><a x="1">hi</a><a x="2">lo</a></r>"#;

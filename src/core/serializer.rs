//! XML serializer
//!
//! Renders elements, element lists and attribute lists back to XML text.
//! Output is a `String`; conversion to a byte encoding happens later, in
//! [`crate::core::encoding`].

use crate::core::document::Tree;
use crate::core::error::{XmlError, XmlResult};
use crate::core::node::{Attribute, NodeId};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serializer for XML subtrees
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    encoding: Option<String>,
}

impl XmlSerializer {
    /// Create a new XML serializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `label` as the document encoding instead of the parsed one
    pub fn with_encoding(mut self, label: &str) -> Self {
        self.encoding = Some(label.to_string());
        self
    }

    /// Serialize one element and its subtree
    ///
    /// When `id` is the document element, the XML declaration is emitted
    /// first, each followed by a newline.
    pub fn serialize_element(&self, tree: &Tree, id: NodeId) -> XmlResult<String> {
        let mut writer = Writer::new(Vec::new());

        let is_document = id == tree.root;
        if is_document {
            let version = tree.version.as_deref().unwrap_or("1.0");
            let encoding = self.encoding.as_deref().or(tree.encoding.as_deref());
            let decl = BytesDecl::new(version, encoding, None);
            writer.write_event(Event::Decl(decl))?;
            writer.get_mut().push(b'\n');
        }

        self.write_element(&mut writer, tree, id)?;

        if is_document {
            writer.get_mut().push(b'\n');
        }
        Self::into_string(writer)
    }

    /// Serialize several elements back to back, in the given order
    pub fn serialize_elements(&self, tree: &Tree, ids: &[NodeId]) -> XmlResult<String> {
        let mut writer = Writer::new(Vec::new());
        for id in ids {
            self.write_element(&mut writer, tree, *id)?;
        }
        Self::into_string(writer)
    }

    /// Serialize attributes as space separated `name="value"` pairs
    pub fn serialize_attributes<'a, I>(&self, attributes: I) -> String
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        attributes
            .into_iter()
            .map(|a| format!("{}=\"{}\"", a.qualified_name(), escape(a.value.as_str())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, tree: &Tree, id: NodeId) -> XmlResult<()> {
        let element = tree
            .element(id)
            .ok_or_else(|| XmlError::NotFound("element was removed from the document".to_string()))?;

        let qname = element.qualified_name();
        let mut start = BytesStart::new(qname.as_str());
        for decl in &element.namespaces {
            start.push_attribute((decl.attribute_name().as_str(), decl.uri.as_str()));
        }
        for attr in &element.attributes {
            start.push_attribute((attr.qualified_name().as_str(), attr.value.as_str()));
        }

        // Childless, textless elements are self-closing
        if element.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = element.text.as_deref().filter(|t| !t.is_empty()) {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &element.children {
            self.write_element(writer, tree, *child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(qname.as_str())))?;
        Ok(())
    }

    fn into_string(writer: Writer<Vec<u8>>) -> XmlResult<String> {
        String::from_utf8(writer.into_inner())
            .map_err(|e| XmlError::Encoding(format!("UTF-8 encoding error: {}", e)))
    }
}

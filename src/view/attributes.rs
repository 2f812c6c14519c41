//! Attribute views

use super::element::{removed, ElementView};
use super::{attribute_matches, NamespaceFilter, NodeView, View};
use crate::core::document::Document;
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::{split_qname, NamespaceMap};
use crate::core::node::{Attribute, NodeId};
use crate::core::serializer::XmlSerializer;
use crate::types::XmlValue;

/// Attributes of one element, optionally restricted to a namespace
#[derive(Debug, Clone)]
pub struct AttributeListView {
    doc: Document,
    node: NodeId,
    filter: NamespaceFilter,
}

impl AttributeListView {
    /// Attributes of `node` passing `filter`
    pub fn new(doc: Document, node: NodeId, filter: NamespaceFilter) -> Self {
        Self { doc, node, filter }
    }

    /// Snapshot of the matching attributes, in declaration order
    pub fn matching(&self) -> Vec<Attribute> {
        self.doc.read_with(|tree| {
            tree.element(self.node)
                .map(|e| {
                    e.attributes
                        .iter()
                        .filter(|a| {
                            self.filter
                                .matches(a.prefix.as_deref(), a.namespace.as_deref())
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    fn owner(&self) -> ElementView {
        ElementView::new(self.doc.clone(), self.node)
    }

    fn view_of(&self, attribute: &Attribute) -> View {
        View::Attribute(AttributeView::new(
            self.doc.clone(),
            self.node,
            attribute.name.clone(),
            attribute.namespace.clone(),
        ))
    }

    fn find(&self, name: &str) -> Option<Attribute> {
        self.matching()
            .into_iter()
            .find(|a| attribute_matches(a, name))
    }
}

impl NodeView for AttributeListView {
    fn node_name(&self) -> String {
        self.matching()
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default()
    }

    fn get_field(&self, name: &str) -> Option<View> {
        self.find(name).map(|a| self.view_of(&a))
    }

    fn set_field(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        let value = value.to_string();

        if let Some(existing) = self.find(name) {
            return self.doc.write_with(|tree| {
                let element = tree.element_mut(self.node).ok_or_else(removed)?;
                element.set_attribute(Attribute { value, ..existing });
                Ok(())
            });
        }

        // New attributes are created in the filtered namespace
        let (prefix, local) = split_qname(name);
        let owner = self.owner();
        match (&self.filter, prefix) {
            (_, Some(_)) | (NamespaceFilter::Any, None) => {
                owner.insert_attribute(name, Some(&value), None)
            }
            (NamespaceFilter::Uri(uri), None) => {
                let bound = self.doc.read_with(|tree| {
                    tree.in_scope_namespaces(self.node)
                        .get_prefix(uri)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                });
                match bound {
                    Some(p) => owner.insert_attribute(
                        &format!("{}:{}", p, local),
                        Some(&value),
                        Some(uri.as_str()),
                    ),
                    None => Err(XmlError::NamespaceRequiresPrefix(name.to_string())),
                }
            }
            (NamespaceFilter::Prefix(p), None) => {
                owner.insert_attribute(&format!("{}:{}", p, local), Some(&value), None)
            }
        }
    }

    fn get_index(&self, index: usize) -> Option<View> {
        self.matching().get(index).map(|a| self.view_of(a))
    }

    fn get_attribute(&self, name: &str) -> Option<View> {
        self.get_field(name)
    }

    fn set_index(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        self.set_field(name, value)
    }

    fn count(&self) -> usize {
        self.matching().len()
    }

    fn add_child(&self, name: &str, _: Option<&str>, _: Option<&str>) -> XmlResult<View> {
        Err(XmlError::NotSupported(format!(
            "cannot add element '{}' to an attribute list",
            name
        )))
    }

    fn add_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        self.owner().insert_attribute(name, value, namespace)
    }

    fn attributes(&self, filter: NamespaceFilter) -> Option<View> {
        self.owner().attributes(filter)
    }

    fn children(&self, filter: NamespaceFilter) -> Option<View> {
        self.owner().children(filter)
    }

    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        self.owner().namespaces(recursive, from_root, used_only)
    }

    fn write_xml(&self, buffer: &mut String) -> XmlResult<()> {
        let attributes = self.matching();
        buffer.push_str(&XmlSerializer::new().serialize_attributes(&attributes));
        Ok(())
    }

    fn encoding(&self) -> String {
        self.doc.encoding()
    }

    fn xpath(&self, expression: &str) -> Option<Vec<View>> {
        self.owner().xpath(expression)
    }

    fn text(&self) -> String {
        self.matching()
            .into_iter()
            .next()
            .map(|a| a.value)
            .unwrap_or_default()
    }

    fn remove_field(&self, name: &str) -> usize {
        let targets: Vec<Attribute> = self
            .matching()
            .into_iter()
            .filter(|a| attribute_matches(a, name))
            .collect();
        self.doc.write_with(|tree| {
            let Some(element) = tree.element_mut(self.node) else {
                return 0;
            };
            targets
                .iter()
                .filter(|a| element.remove_attribute(&a.name, a.namespace.as_deref()))
                .count()
        })
    }

    fn remove_attribute(&self, name: &str) -> bool {
        self.remove_field(name) > 0
    }
}

/// A single attribute
///
/// Terminal: it has no fields and no children of its own.
#[derive(Debug, Clone)]
pub struct AttributeView {
    doc: Document,
    node: NodeId,
    name: String,
    namespace: Option<String>,
}

impl AttributeView {
    /// View onto the attribute `name` in `namespace` of `node`
    pub fn new(doc: Document, node: NodeId, name: String, namespace: Option<String>) -> Self {
        Self {
            doc,
            node,
            name,
            namespace,
        }
    }

    /// Namespace URI of the attribute
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Current state of the attribute, `None` once removed
    pub fn attribute(&self) -> Option<Attribute> {
        self.doc.read_with(|tree| {
            tree.element(self.node)?
                .attribute(&self.name, self.namespace.as_deref())
                .cloned()
        })
    }

    fn terminal(&self, what: &str) -> XmlError {
        XmlError::NotSupported(format!("attribute '{}' has no {}", self.name, what))
    }
}

impl NodeView for AttributeView {
    fn node_name(&self) -> String {
        self.name.clone()
    }

    fn get_field(&self, _: &str) -> Option<View> {
        None
    }

    fn set_field(&self, _: &str, _: &XmlValue) -> XmlResult<()> {
        Err(self.terminal("child elements"))
    }

    fn get_index(&self, index: usize) -> Option<View> {
        (index == 0 && self.attribute().is_some()).then(|| View::Attribute(self.clone()))
    }

    fn get_attribute(&self, _: &str) -> Option<View> {
        None
    }

    fn set_index(&self, _: &str, _: &XmlValue) -> XmlResult<()> {
        Err(self.terminal("attributes"))
    }

    fn count(&self) -> usize {
        usize::from(self.attribute().is_some())
    }

    fn add_child(&self, _: &str, _: Option<&str>, _: Option<&str>) -> XmlResult<View> {
        Err(self.terminal("child elements"))
    }

    fn add_attribute(&self, _: &str, _: Option<&str>, _: Option<&str>) -> XmlResult<()> {
        Err(self.terminal("attributes"))
    }

    fn attributes(&self, _: NamespaceFilter) -> Option<View> {
        None
    }

    fn children(&self, _: NamespaceFilter) -> Option<View> {
        None
    }

    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        if !used_only {
            return ElementView::new(self.doc.clone(), self.node).namespaces(
                recursive, from_root, false,
            );
        }
        let mut map = NamespaceMap::new();
        if let Some(Attribute {
            prefix: Some(prefix),
            namespace: Some(uri),
            ..
        }) = self.attribute()
        {
            map.insert_if_absent(&prefix, &uri);
        }
        map
    }

    fn write_xml(&self, buffer: &mut String) -> XmlResult<()> {
        let attribute = self.attribute().ok_or_else(removed)?;
        buffer.push_str(&XmlSerializer::new().serialize_attributes([&attribute]));
        Ok(())
    }

    fn encoding(&self) -> String {
        self.doc.encoding()
    }

    fn xpath(&self, expression: &str) -> Option<Vec<View>> {
        ElementView::new(self.doc.clone(), self.node).xpath(expression)
    }

    fn text(&self) -> String {
        self.attribute().map(|a| a.value).unwrap_or_default()
    }

    fn remove_field(&self, _: &str) -> usize {
        0
    }

    fn remove_attribute(&self, _: &str) -> bool {
        false
    }
}

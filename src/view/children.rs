//! Child element collections
//!
//! A [`ChildrenView`] is the result of field access (`parent.a` names the
//! `a` children of `parent`) and of explicit child projection. Element-like
//! reads address the first match, positional access walks the matches and
//! serialization renders all of them.

use super::element::{removed, ElementView};
use super::{NamespaceFilter, NodeView, View};
use crate::core::document::Document;
use crate::core::error::XmlResult;
use crate::core::namespace::{split_qname, NamespaceMap};
use crate::core::node::NodeId;
use crate::core::serializer::XmlSerializer;
use crate::core::xpath;
use crate::types::XmlValue;

/// Children of an element, optionally restricted by name and namespace
#[derive(Debug, Clone)]
pub struct ChildrenView {
    doc: Document,
    parent: NodeId,
    filter: NamespaceFilter,
    name: Option<String>,
}

impl ChildrenView {
    /// All children of `parent` passing `filter`
    pub fn new(doc: Document, parent: NodeId, filter: NamespaceFilter) -> Self {
        Self {
            doc,
            parent,
            filter,
            name: None,
        }
    }

    /// Children of `parent` with local name `name` passing `filter`
    pub fn named(doc: Document, parent: NodeId, filter: NamespaceFilter, name: &str) -> Self {
        Self {
            doc,
            parent,
            filter,
            name: Some(name.to_string()),
        }
    }

    /// Active namespace filter
    pub fn filter(&self) -> &NamespaceFilter {
        &self.filter
    }

    /// Handles of the matching children, in document order
    pub fn matching(&self) -> Vec<NodeId> {
        self.doc.read_with(|tree| {
            let Some(parent) = tree.element(self.parent) else {
                return Vec::new();
            };
            parent
                .children
                .iter()
                .copied()
                .filter(|id| {
                    tree.element(*id).is_some_and(|e| {
                        self.name.as_deref().map_or(true, |n| e.name == n)
                            && self
                                .filter
                                .matches(e.prefix.as_deref(), e.namespace.as_deref())
                    })
                })
                .collect()
        })
    }

    /// First matching child
    pub fn first(&self) -> Option<ElementView> {
        self.matching()
            .first()
            .map(|id| ElementView::new(self.doc.clone(), *id))
    }

    // Field access and appends go through the parent for an unnamed
    // collection and through the first match for a named one
    fn field_owner(&self) -> Option<ElementView> {
        match self.name {
            Some(_) => self.first(),
            None => self
                .doc
                .read_with(|tree| tree.arena.contains(self.parent))
                .then(|| ElementView::new(self.doc.clone(), self.parent)),
        }
    }

    // Name and namespace a new child takes from the active filter when the
    // caller gave no namespace
    fn child_binding(
        &self,
        owner: NodeId,
        name: &str,
        namespace: Option<&str>,
    ) -> (String, Option<String>) {
        if let Some(uri) = namespace.filter(|uri| !uri.is_empty()) {
            return (name.to_string(), Some(uri.to_string()));
        }
        let (prefix, local) = split_qname(name);
        if prefix.is_some() {
            return (name.to_string(), None);
        }

        match &self.filter {
            NamespaceFilter::Any => (name.to_string(), None),
            NamespaceFilter::Uri(uri) => {
                let bound = self.doc.read_with(|tree| {
                    tree.in_scope_namespaces(owner)
                        .get_prefix(uri)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                });
                match bound {
                    Some(p) => (format!("{}:{}", p, local), Some(uri.clone())),
                    None => (local.to_string(), Some(uri.clone())),
                }
            }
            NamespaceFilter::Prefix(p) => {
                let uri = self
                    .doc
                    .read_with(|tree| tree.resolve_prefix(owner, Some(p)));
                match uri {
                    Some(uri) => (format!("{}:{}", p, local), Some(uri)),
                    None => (local.to_string(), None),
                }
            }
        }
    }
}

impl NodeView for ChildrenView {
    fn node_name(&self) -> String {
        self.first().map(|e| e.node_name()).unwrap_or_default()
    }

    fn get_field(&self, name: &str) -> Option<View> {
        let owner = self.field_owner()?;
        let (_, local) = split_qname(name);
        let view = ChildrenView::named(self.doc.clone(), owner.node(), self.filter.clone(), local);
        (view.count() > 0).then_some(View::Children(view))
    }

    fn set_field(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        self.field_owner().ok_or_else(removed)?.set_field(name, value)
    }

    fn get_index(&self, index: usize) -> Option<View> {
        self.matching()
            .get(index)
            .map(|id| View::Element(ElementView::new(self.doc.clone(), *id)))
    }

    fn get_attribute(&self, name: &str) -> Option<View> {
        self.first()?.get_attribute(name)
    }

    fn set_index(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        self.first().ok_or_else(removed)?.set_index(name, value)
    }

    fn count(&self) -> usize {
        self.matching().len()
    }

    fn add_child(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<View> {
        let owner = self.field_owner().ok_or_else(removed)?;
        let (name, namespace) = self.child_binding(owner.node(), name, namespace);
        owner
            .append_child(&name, value, namespace.as_deref())
            .map(View::Element)
    }

    fn add_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        self.first()
            .ok_or_else(removed)?
            .insert_attribute(name, value, namespace)
    }

    fn attributes(&self, filter: NamespaceFilter) -> Option<View> {
        self.first()?.attributes(filter)
    }

    fn children(&self, filter: NamespaceFilter) -> Option<View> {
        self.first()?.children(filter)
    }

    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        self.first()
            .map(|e| e.namespaces(recursive, from_root, used_only))
            .unwrap_or_default()
    }

    fn write_xml(&self, buffer: &mut String) -> XmlResult<()> {
        let ids = self.matching();
        let xml = self
            .doc
            .read_with(|tree| XmlSerializer::new().serialize_elements(tree, &ids))?;
        buffer.push_str(&xml);
        Ok(())
    }

    fn encoding(&self) -> String {
        self.doc.encoding()
    }

    fn xpath(&self, expression: &str) -> Option<Vec<View>> {
        match self.first() {
            Some(first) => first.xpath(expression),
            None => xpath::parse_query(expression).ok().map(|_| Vec::new()),
        }
    }

    fn text(&self) -> String {
        self.first().map(|e| e.text()).unwrap_or_default()
    }

    fn remove_field(&self, name: &str) -> usize {
        self.field_owner()
            .map(|owner| owner.remove_field(name))
            .unwrap_or(0)
    }

    fn remove_attribute(&self, name: &str) -> bool {
        self.first().is_some_and(|e| e.remove_attribute(name))
    }
}

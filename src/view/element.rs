//! Single element view

use super::{
    index_matches, AttributeListView, AttributeView, ChildrenView, NamespaceFilter, NodeView, View,
};
use crate::core::document::{Document, Tree};
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::{split_qname, validate_name, NamespaceMap};
use crate::core::node::{Attribute, Element, NodeId};
use crate::core::serializer::XmlSerializer;
use crate::core::xpath::{self, QueryMatch};
use crate::types::XmlValue;

pub(crate) fn removed() -> XmlError {
    XmlError::NotFound("element was removed from the document".to_string())
}

// Namespace bound to `prefix` at `node`; a prefixed name needs one
fn bound_prefix(tree: &Tree, node: NodeId, prefix: &str, name: &str) -> XmlResult<String> {
    tree.resolve_prefix(node, Some(prefix))
        .ok_or_else(|| XmlError::InvalidName(name.to_string()))
}

/// Turn query results into views on `doc`
pub(crate) fn views_from_matches(doc: &Document, matches: Vec<QueryMatch>) -> Vec<View> {
    matches
        .into_iter()
        .map(|m| match m {
            QueryMatch::Element(id) => View::Element(ElementView::new(doc.clone(), id)),
            QueryMatch::Attribute {
                element,
                name,
                namespace,
            } => View::Attribute(AttributeView::new(doc.clone(), element, name, namespace)),
        })
        .collect()
}

/// View onto exactly one element
#[derive(Debug, Clone)]
pub struct ElementView {
    doc: Document,
    node: NodeId,
}

impl ElementView {
    /// Create a view onto `node` of `doc`
    pub fn new(doc: Document, node: NodeId) -> Self {
        Self { doc, node }
    }

    /// Document this view belongs to
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Handle of the viewed element
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether the element is still part of the document
    pub fn exists(&self) -> bool {
        self.doc.read_with(|tree| tree.arena.contains(self.node))
    }

    /// Qualified name of the element, empty when removed
    pub fn qualified_name(&self) -> String {
        self.doc.read_with(|tree| {
            tree.element(self.node)
                .map(Element::qualified_name)
                .unwrap_or_default()
        })
    }

    /// Append a child element
    ///
    /// With a namespace, the child is bound to it (declaring the binding on
    /// the child when it is not already in scope). Without one, a prefixed
    /// name resolves its prefix in scope and an unprefixed name inherits the
    /// parent's namespace.
    pub fn append_child(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<ElementView> {
        validate_name(name)?;
        let namespace = namespace.filter(|uri| !uri.is_empty());
        let (prefix, local) = split_qname(name);

        let id = self.doc.write_with(|tree| {
            let parent = tree.element(self.node).ok_or_else(removed)?;
            let mut child = Element::new(local);
            child.text = value.map(str::to_string);

            match (namespace, prefix) {
                (Some(uri), _) => {
                    child.prefix = prefix.map(str::to_string);
                    child.namespace = Some(uri.to_string());
                    if tree.resolve_prefix(self.node, prefix).as_deref() != Some(uri) {
                        child.declare_namespace(prefix, uri);
                    }
                }
                (None, Some(p)) => {
                    child.prefix = Some(p.to_string());
                    child.namespace = Some(bound_prefix(tree, self.node, p, name)?);
                }
                (None, None) => {
                    child.prefix = parent.prefix.clone();
                    child.namespace = parent.namespace.clone();
                }
            }

            tree.arena.append_child(self.node, child).ok_or_else(removed)
        })?;

        Ok(ElementView::new(self.doc.clone(), id))
    }

    /// Add or replace an attribute
    pub fn insert_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        let namespace = namespace.filter(|uri| !uri.is_empty());
        let (prefix, local) = split_qname(name);
        if namespace.is_some() && prefix.is_none() {
            return Err(XmlError::NamespaceRequiresPrefix(name.to_string()));
        }
        validate_name(name)?;
        let value = value.unwrap_or_default();

        self.doc.write_with(|tree| {
            let (attribute, declare) = match (namespace, prefix) {
                (Some(uri), Some(p)) => {
                    let declare = tree.resolve_prefix(self.node, Some(p)).as_deref() != Some(uri);
                    (Attribute::namespaced(p, local, uri, value), declare)
                }
                (None, Some(p)) => {
                    let mut attribute = Attribute::new(local, value);
                    attribute.prefix = Some(p.to_string());
                    attribute.namespace = Some(bound_prefix(tree, self.node, p, name)?);
                    (attribute, false)
                }
                _ => (Attribute::new(local, value), false),
            };

            let element = tree.element_mut(self.node).ok_or_else(removed)?;
            if declare {
                if let Some(uri) = attribute.namespace.as_deref() {
                    element.declare_namespace(attribute.prefix.as_deref(), uri);
                }
            }
            element.set_attribute(attribute);
            Ok(())
        })
    }

    /// Collect namespace bindings
    ///
    /// `from_root` starts at the document element instead of this one and
    /// `recursive` descends into the whole subtree. With `used_only`, the
    /// namespaces actually used by element and attribute names are listed;
    /// otherwise the `xmlns` declarations are. The first binding seen for
    /// a prefix wins.
    pub fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        self.doc.read_with(|tree| {
            let mut map = NamespaceMap::new();
            if !tree.arena.contains(self.node) {
                return map;
            }

            let start = if from_root { tree.root } else { self.node };
            let nodes = if recursive {
                tree.arena.subtree(start)
            } else {
                vec![start]
            };

            for element in nodes.into_iter().filter_map(|id| tree.element(id)) {
                if used_only {
                    if let Some(uri) = element.namespace.as_deref() {
                        map.insert_if_absent(element.prefix.as_deref().unwrap_or(""), uri);
                    }
                    for attr in &element.attributes {
                        if let (Some(prefix), Some(uri)) = (&attr.prefix, &attr.namespace) {
                            map.insert_if_absent(prefix, uri);
                        }
                    }
                } else {
                    for decl in &element.namespaces {
                        map.insert_if_absent(decl.prefix.as_deref().unwrap_or(""), &decl.uri);
                    }
                }
            }
            map
        })
    }
}

impl NodeView for ElementView {
    fn node_name(&self) -> String {
        self.doc.read_with(|tree| {
            tree.element(self.node)
                .map(|e| e.name.clone())
                .unwrap_or_default()
        })
    }

    fn get_field(&self, name: &str) -> Option<View> {
        let (_, local) = split_qname(name);
        let found = self
            .doc
            .read_with(|tree| !tree.children_named(self.node, local).is_empty());
        found.then(|| {
            View::Children(ChildrenView::named(
                self.doc.clone(),
                self.node,
                NamespaceFilter::Any,
                local,
            ))
        })
    }

    fn set_field(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        validate_name(name)?;
        let (_, local) = split_qname(name);
        let text = value.to_string();

        let existing = self
            .doc
            .read_with(|tree| tree.children_named(self.node, local).first().copied());
        match existing {
            // Only the text is replaced; children stay
            Some(child) => self.doc.write_with(|tree| {
                let element = tree.element_mut(child).ok_or_else(removed)?;
                element.text = Some(text);
                Ok(())
            }),
            None => self.append_child(name, Some(&text), None).map(|_| ()),
        }
    }

    fn get_index(&self, index: usize) -> Option<View> {
        let id = self.doc.read_with(|tree| {
            let element = tree.element(self.node)?;
            match element.parent {
                Some(parent) => tree.children_named(parent, &element.name).get(index).copied(),
                None => (index == 0).then_some(self.node),
            }
        })?;
        Some(View::Element(ElementView::new(self.doc.clone(), id)))
    }

    fn get_attribute(&self, name: &str) -> Option<View> {
        self.doc.read_with(|tree| {
            let element = tree.element(self.node)?;
            let attr = element
                .attributes
                .iter()
                .find(|a| index_matches(a, name))?;
            Some(View::Attribute(AttributeView::new(
                self.doc.clone(),
                self.node,
                attr.name.clone(),
                attr.namespace.clone(),
            )))
        })
    }

    fn set_index(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        validate_name(name)?;
        let (prefix, local) = split_qname(name);
        let value = value.to_string();

        self.doc.write_with(|tree| {
            let existing = tree
                .element(self.node)
                .ok_or_else(removed)?
                .attributes
                .iter()
                .position(|a| index_matches(a, name));
            let namespace = match (existing, prefix) {
                (None, Some(p)) => Some(bound_prefix(tree, self.node, p, name)?),
                _ => None,
            };

            let element = tree.element_mut(self.node).ok_or_else(removed)?;
            match existing {
                Some(pos) => element.attributes[pos].value = value,
                None => element.attributes.push(Attribute {
                    name: local.to_string(),
                    prefix: prefix.map(str::to_string),
                    namespace,
                    value,
                }),
            }
            Ok(())
        })
    }

    fn count(&self) -> usize {
        self.doc.read_with(|tree| {
            tree.element(self.node)
                .map(|e| e.children.len())
                .unwrap_or(0)
        })
    }

    fn add_child(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<View> {
        self.append_child(name, value, namespace).map(View::Element)
    }

    fn add_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        self.insert_attribute(name, value, namespace)
    }

    fn attributes(&self, filter: NamespaceFilter) -> Option<View> {
        self.exists().then(|| {
            View::Attributes(AttributeListView::new(self.doc.clone(), self.node, filter))
        })
    }

    fn children(&self, filter: NamespaceFilter) -> Option<View> {
        self.exists()
            .then(|| View::Children(ChildrenView::new(self.doc.clone(), self.node, filter)))
    }

    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        ElementView::namespaces(self, recursive, from_root, used_only)
    }

    fn write_xml(&self, buffer: &mut String) -> XmlResult<()> {
        let xml = self
            .doc
            .read_with(|tree| XmlSerializer::new().serialize_element(tree, self.node))?;
        buffer.push_str(&xml);
        Ok(())
    }

    fn write_xml_as(&self, buffer: &mut String, encoding: &str) -> XmlResult<()> {
        let serializer = XmlSerializer::new().with_encoding(encoding);
        let xml = self
            .doc
            .read_with(|tree| serializer.serialize_element(tree, self.node))?;
        buffer.push_str(&xml);
        Ok(())
    }

    fn encoding(&self) -> String {
        self.doc.encoding()
    }

    fn xpath(&self, expression: &str) -> Option<Vec<View>> {
        match self
            .doc
            .read_with(|tree| xpath::select(tree, self.node, expression))
        {
            Ok(matches) => Some(views_from_matches(&self.doc, matches)),
            Err(err) => {
                tracing::warn!(expression, error = %err, "invalid path expression");
                None
            }
        }
    }

    fn text(&self) -> String {
        self.doc.read_with(|tree| tree.text(self.node))
    }

    fn remove_field(&self, name: &str) -> usize {
        let (_, local) = split_qname(name);
        self.doc.write_with(|tree| {
            let ids = tree.children_named(self.node, local);
            ids.into_iter().filter(|id| tree.arena.remove(*id)).count()
        })
    }

    fn remove_attribute(&self, name: &str) -> bool {
        self.doc.write_with(|tree| {
            let Some(element) = tree.element_mut(self.node) else {
                return false;
            };
            match element
                .attributes
                .iter()
                .position(|a| index_matches(a, name))
            {
                Some(pos) => {
                    element.attributes.remove(pos);
                    true
                }
                None => false,
            }
        })
    }
}

//! XML node storage
//!
//! This module defines the element model and the arena that owns it:
//! - Element: a named, attributed node with ordered children and own text
//! - Attribute: a (possibly namespaced) name/value pair
//! - Arena: slot storage addressed by generation-checked NodeIds
//!
//! Removing a node bumps the generation of its slot, so any NodeId still
//! held by a view simply stops resolving.

/// Handle to an element stored in an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index of this handle
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// An attribute on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name
    pub name: String,
    /// Prefix used in the serialized name, if any
    pub prefix: Option<String>,
    /// Namespace URI the prefix resolved to
    pub namespace: Option<String>,
    /// Attribute value (unescaped)
    pub value: String,
}

impl Attribute {
    /// Create a new attribute with no namespace
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            namespace: None,
            value: value.into(),
        }
    }

    /// Create a new namespaced attribute
    pub fn namespaced(
        prefix: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: Some(prefix.into()),
            namespace: Some(namespace.into()),
            value: value.into(),
        }
    }

    /// Name as written in markup (`prefix:name` or `name`)
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

/// A namespace binding declared on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Bound prefix, `None` for the default namespace
    pub prefix: Option<String>,
    /// Namespace URI
    pub uri: String,
}

impl NamespaceDecl {
    /// Create a new declaration
    pub fn new(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.into(),
        }
    }

    /// Attribute name carrying this declaration (`xmlns` or `xmlns:prefix`)
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        }
    }
}

/// An element node
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Local name
    pub name: String,
    /// Prefix used in the serialized name, if any
    pub prefix: Option<String>,
    /// Namespace URI of the element
    pub namespace: Option<String>,
    /// Namespace declarations made on this element
    pub namespaces: Vec<NamespaceDecl>,
    /// Attributes in declaration order
    pub attributes: Vec<Attribute>,
    /// Child elements in document order
    pub children: Vec<NodeId>,
    /// Own text content, distinct from children
    pub text: Option<String>,
    /// Owning element, `None` for the document root
    pub parent: Option<NodeId>,
}

impl Element {
    /// Create a new element with no namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name as written in markup (`prefix:name` or `name`)
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Get an attribute by local name and namespace
    pub fn attribute(&self, name: &str, namespace: Option<&str>) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
    }

    /// Set an attribute, replacing the value of an existing one with the
    /// same local name and namespace
    pub fn set_attribute(&mut self, attribute: Attribute) {
        let existing = self
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name && a.namespace == attribute.namespace);
        match existing {
            Some(a) => a.value = attribute.value,
            None => self.attributes.push(attribute),
        }
    }

    /// Remove an attribute by local name and namespace
    pub fn remove_attribute(&mut self, name: &str, namespace: Option<&str>) -> bool {
        let initial_len = self.attributes.len();
        self.attributes
            .retain(|a| !(a.name == name && a.namespace.as_deref() == namespace));
        self.attributes.len() < initial_len
    }

    /// URI bound to `prefix` by a declaration on this element only
    pub fn declared_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|d| d.prefix.as_deref() == prefix)
            .map(|d| d.uri.as_str())
    }

    /// Declare a namespace binding on this element
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        match self
            .namespaces
            .iter_mut()
            .find(|d| d.prefix.as_deref() == prefix)
        {
            Some(decl) => decl.uri = uri.to_string(),
            None => self.namespaces.push(NamespaceDecl::new(prefix, uri)),
        }
    }

    /// Whether the element has neither children nor text
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Owner of every element of a document
#[derive(Debug, Clone, Default)]
pub struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a detached element and return its handle
    pub fn insert(&mut self, element: Element) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Get an element, if the handle is still live
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.element.as_ref()
    }

    /// Get a mutable element, if the handle is still live
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.element.as_mut()
    }

    /// Check whether a handle is still live
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.element.is_some()).count()
    }

    /// Check if the arena holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `element` as the last child of `parent`
    ///
    /// Returns `None` when `parent` is stale.
    pub fn append_child(&mut self, parent: NodeId, mut element: Element) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        element.parent = Some(parent);
        let id = self.insert(element);
        self.get_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Detach `id` from its parent and free its whole subtree
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.get(id).map(|e| e.parent) else {
            return false;
        };

        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }

        for node in self.subtree(id) {
            let slot = &mut self.slots[node.index as usize];
            slot.element = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        true
    }

    /// `id` followed by all of its descendants in document order
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(element) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(element.children.iter().rev().copied());
        }
        out
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|e| e.parent);
        while let Some(node) = current {
            out.push(node);
            current = self.get(node).and_then(|e| e.parent);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_replace() {
        let mut element = Element::new("a");
        element.set_attribute(Attribute::new("x", "1"));
        element.set_attribute(Attribute::namespaced("p", "x", "urn:p", "2"));
        element.set_attribute(Attribute::new("x", "3"));

        assert_eq!(element.attributes.len(), 2);
        assert_eq!(element.attribute("x", None).map(|a| a.value.as_str()), Some("3"));
        assert_eq!(
            element.attribute("x", Some("urn:p")).map(|a| a.qualified_name()),
            Some("p:x".to_string())
        );

        assert!(element.remove_attribute("x", None));
        assert!(!element.remove_attribute("x", None));
        assert_eq!(element.attributes.len(), 1);
    }

    #[test]
    fn test_append_and_subtree_order() {
        let mut arena = Arena::new();
        let root = arena.insert(Element::new("root"));
        let a = arena.append_child(root, Element::new("a")).unwrap();
        let item = arena.append_child(a, Element::new("item")).unwrap();
        let b = arena.append_child(root, Element::new("b")).unwrap();

        assert_eq!(arena.subtree(root), vec![root, a, item, b]);
        assert_eq!(arena.ancestors(item), vec![a, root]);
        assert_eq!(arena.get(item).unwrap().parent, Some(a));
    }

    #[test]
    fn test_remove_invalidates_handles() {
        let mut arena = Arena::new();
        let root = arena.insert(Element::new("root"));
        let a = arena.append_child(root, Element::new("a")).unwrap();
        let nested = arena.append_child(a, Element::new("nested")).unwrap();

        assert!(arena.remove(a));
        assert!(!arena.contains(a));
        assert!(!arena.contains(nested));
        assert!(arena.get(root).unwrap().children.is_empty());

        // Reused slot gets a new generation; old handle stays stale
        let c = arena.insert(Element::new("c"));
        assert_ne!(c, a);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_is_empty_element() {
        let mut element = Element::new("e");
        assert!(element.is_empty());
        element.text = Some(String::new());
        assert!(element.is_empty());
        element.text = Some("t".to_string());
        assert!(!element.is_empty());
    }
}

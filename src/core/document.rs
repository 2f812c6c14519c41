//! Document tree and shared handle
//!
//! A [`Tree`] owns the arena, the root element id and the XML declaration
//! details. [`Document`] wraps it in `Rc<RefCell<_>>` so that any number of
//! views can address the same tree. Borrows never outlive a single call.

use crate::core::encoding::decode;
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::{ns, validate_name, NamespaceMap};
use crate::core::node::{Arena, Element, NodeId};
use crate::core::parser::XmlParser;
use crate::facade::SimpleXmlElement;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

/// Encoding reported when the document declares none
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// An XML document: element arena plus declaration details
#[derive(Debug, Clone)]
pub struct Tree {
    /// Storage for every element
    pub arena: Arena,
    /// Document element
    pub root: NodeId,
    /// `version` from the XML declaration
    pub version: Option<String>,
    /// `encoding` from the XML declaration
    pub encoding: Option<String>,
}

impl Tree {
    /// Create a tree holding a single root element
    pub fn new(root: Element) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(root);
        Self {
            arena,
            root,
            version: None,
            encoding: None,
        }
    }

    /// Get an element, if the handle is still live
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.arena.get(id)
    }

    /// Get a mutable element, if the handle is still live
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.arena.get_mut(id)
    }

    /// Resolve `prefix` (or the default namespace for `None`) at `node`
    /// by walking ancestor declarations
    pub fn resolve_prefix(&self, node: NodeId, prefix: Option<&str>) -> Option<String> {
        if prefix == Some(ns::XML_PREFIX) {
            return Some(ns::XML.to_string());
        }

        let mut current = Some(node);
        while let Some(id) = current {
            let element = self.arena.get(id)?;
            if let Some(uri) = element.declared_namespace(prefix) {
                // An empty default declaration undeclares the default namespace
                return (!uri.is_empty()).then(|| uri.to_string());
            }
            current = element.parent;
        }
        None
    }

    /// All bindings in scope at `node`, nearest declaration first
    pub fn in_scope_namespaces(&self, node: NodeId) -> NamespaceMap {
        let mut map = NamespaceMap::new();
        map.insert_if_absent(ns::XML_PREFIX, ns::XML);

        let mut current = Some(node);
        while let Some(id) = current {
            let Some(element) = self.arena.get(id) else {
                break;
            };
            for decl in &element.namespaces {
                map.insert_if_absent(decl.prefix.as_deref().unwrap_or(""), &decl.uri);
            }
            current = element.parent;
        }
        map
    }

    /// Own text content of an element, empty when stale or absent
    pub fn text(&self, id: NodeId) -> String {
        self.arena
            .get(id)
            .and_then(|e| e.text.clone())
            .unwrap_or_default()
    }

    /// Position of every live element in document order
    pub fn document_order(&self) -> HashMap<NodeId, usize> {
        self.arena
            .subtree(self.root)
            .into_iter()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }

    /// Children of `parent` whose local name is `name`
    pub fn children_named(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        let Some(element) = self.arena.get(parent) else {
            return Vec::new();
        };
        element
            .children
            .iter()
            .copied()
            .filter(|c| self.arena.get(*c).is_some_and(|e| e.name == name))
            .collect()
    }
}

/// Shared handle to a document tree
#[derive(Debug, Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl Document {
    /// Create a document with an empty root element
    pub fn new(root_name: &str) -> XmlResult<Self> {
        validate_name(root_name)?;
        let (prefix, local) = crate::core::namespace::split_qname(root_name);
        let mut root = Element::new(local);
        root.prefix = prefix.map(str::to_string);
        Ok(Self::from_tree(Tree::new(root)))
    }

    /// Wrap an existing tree
    pub fn from_tree(tree: Tree) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Parse a document from XML text
    pub fn parse(xml: &str) -> XmlResult<Self> {
        let tree = XmlParser::new().parse(xml)?;
        Ok(Self::from_tree(tree))
    }

    /// Read and parse a document from a file
    ///
    /// The bytes are decoded by byte order mark or by the encoding named in
    /// the XML declaration.
    pub fn load_file<P: AsRef<Path>>(path: P) -> XmlResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let xml = decode(&bytes).map_err(|e| match e {
            XmlError::Encoding(msg) => XmlError::Encoding(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded XML file");
        Self::parse(&xml)
    }

    /// Facade over the document element
    pub fn root(&self) -> SimpleXmlElement {
        SimpleXmlElement::from_document(self.clone())
    }

    /// Handle of the document element
    pub fn root_id(&self) -> NodeId {
        self.tree.borrow().root
    }

    /// Declared encoding, or UTF-8
    pub fn encoding(&self) -> String {
        self.tree
            .borrow()
            .encoding
            .clone()
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
    }

    /// Execute a closure with read access to the tree
    pub fn read_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Tree) -> R,
    {
        let guard = self.tree.borrow();
        f(&guard)
    }

    /// Execute a closure with write access to the tree
    pub fn write_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Tree) -> R,
    {
        let mut guard = self.tree.borrow_mut();
        f(&mut guard)
    }

    /// Whether both handles address the same tree
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl FromStr for Document {
    type Err = XmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

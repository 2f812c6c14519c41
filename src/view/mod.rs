//! Views over a document
//!
//! A view is a lightweight lens onto part of a [`Document`]: one element,
//! an element's attributes, a filtered set of children, or a single
//! attribute. Views hold a document handle plus arena ids, never borrowed
//! references, so any number of them can coexist with mutation. A view
//! whose node has been removed behaves as empty: lookups return `None` and
//! mutations fail with [`XmlError::NotFound`].
//!
//! [`NodeView`] is the one interface every projection implements and
//! [`View`] is the tagged union handed out by navigation operations.
//!
//! [`Document`]: crate::core::Document
//! [`XmlError::NotFound`]: crate::core::XmlError::NotFound

mod attributes;
mod children;
mod element;

pub use attributes::{AttributeListView, AttributeView};
pub use children::ChildrenView;
pub use element::ElementView;

use crate::core::error::XmlResult;
use crate::core::namespace::NamespaceMap;
use crate::core::node::Attribute;
use crate::types::XmlValue;

/// Namespace restriction of a projection
///
/// URI and prefix filters are mutually exclusive. Empty strings normalize
/// to no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceFilter {
    /// No restriction
    #[default]
    Any,
    /// Only nodes in this namespace URI
    Uri(String),
    /// Only nodes written with this prefix
    Prefix(String),
}

impl NamespaceFilter {
    /// Build a filter from optional URI and prefix; the URI wins when both
    /// are given
    pub fn new(uri: Option<&str>, prefix: Option<&str>) -> Self {
        match (
            uri.filter(|u| !u.is_empty()),
            prefix.filter(|p| !p.is_empty()),
        ) {
            (Some(uri), _) => NamespaceFilter::Uri(uri.to_string()),
            (None, Some(prefix)) => NamespaceFilter::Prefix(prefix.to_string()),
            (None, None) => NamespaceFilter::Any,
        }
    }

    /// Filter on a namespace URI
    pub fn uri(uri: &str) -> Self {
        Self::new(Some(uri), None)
    }

    /// Filter on a prefix
    pub fn prefix(prefix: &str) -> Self {
        Self::new(None, Some(prefix))
    }

    /// Check whether a node with this prefix and namespace passes
    pub fn matches(&self, prefix: Option<&str>, namespace: Option<&str>) -> bool {
        match self {
            NamespaceFilter::Any => true,
            NamespaceFilter::Uri(uri) => namespace == Some(uri.as_str()),
            NamespaceFilter::Prefix(p) => prefix == Some(p.as_str()),
        }
    }
}

/// Check an attribute of a filtered list against a lookup name (`local` or
/// `prefix:local`); the list's filter already scopes the namespace
pub(crate) fn attribute_matches(attribute: &Attribute, name: &str) -> bool {
    if name.contains(':') {
        attribute.qualified_name() == name
    } else {
        attribute.name == name
    }
}

/// Check an attribute against an index lookup on an element: an
/// unprefixed name only addresses attributes in no namespace
pub(crate) fn index_matches(attribute: &Attribute, name: &str) -> bool {
    if name.contains(':') {
        attribute.qualified_name() == name
    } else {
        attribute.name == name && attribute.namespace.is_none()
    }
}

/// Operations common to every view
///
/// Field access addresses child elements by name; index access addresses
/// positions ([`get_index`](NodeView::get_index)) and attributes by name
/// ([`get_attribute`](NodeView::get_attribute),
/// [`set_index`](NodeView::set_index)).
pub trait NodeView {
    /// Local name of the addressed node
    fn node_name(&self) -> String;

    /// Children named `name`, or `None` when there are none
    fn get_field(&self, name: &str) -> Option<View>;

    /// Replace the text of the first child named `name`, or append one
    fn set_field(&self, name: &str, value: &XmlValue) -> XmlResult<()>;

    /// The `index`-th item of the collection this view represents
    fn get_index(&self, index: usize) -> Option<View>;

    /// Attribute by name
    fn get_attribute(&self, name: &str) -> Option<View>;

    /// Set or create an attribute (not a child)
    fn set_index(&self, name: &str, value: &XmlValue) -> XmlResult<()>;

    /// Number of items in this view
    fn count(&self) -> usize;

    /// Append a child element and return a view onto it
    fn add_child(&self, name: &str, value: Option<&str>, namespace: Option<&str>)
        -> XmlResult<View>;

    /// Add an attribute; a namespace requires a prefixed name
    fn add_attribute(&self, name: &str, value: Option<&str>, namespace: Option<&str>)
        -> XmlResult<()>;

    /// Project the attributes passing `filter`; `None` when the view
    /// addresses no element
    fn attributes(&self, filter: NamespaceFilter) -> Option<View>;

    /// Project the children passing `filter`; `None` when the view
    /// addresses no element
    fn children(&self, filter: NamespaceFilter) -> Option<View>;

    /// Namespace bindings, see [`ElementView::namespaces`]
    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap;

    /// Append the XML rendering of this view to `buffer`
    fn write_xml(&self, buffer: &mut String) -> XmlResult<()>;

    /// Like [`write_xml`](NodeView::write_xml), but a rendered XML
    /// declaration names `encoding` instead of the parsed one
    fn write_xml_as(&self, buffer: &mut String, encoding: &str) -> XmlResult<()> {
        let _ = encoding;
        self.write_xml(buffer)
    }

    /// Document encoding
    fn encoding(&self) -> String;

    /// Evaluate a path expression; `None` when the expression is invalid
    fn xpath(&self, expression: &str) -> Option<Vec<View>>;

    /// String value of the view
    fn text(&self) -> String;

    /// Remove every child named `name`, returning how many were removed
    fn remove_field(&self, name: &str) -> usize;

    /// Remove an attribute by name
    fn remove_attribute(&self, name: &str) -> bool;

    /// Serialize to a fresh string
    fn to_xml(&self) -> XmlResult<String> {
        let mut buffer = String::new();
        self.write_xml(&mut buffer)?;
        Ok(buffer)
    }
}

/// Any view, as produced by navigation and queries
#[derive(Debug, Clone)]
pub enum View {
    /// One element
    Element(ElementView),
    /// An element's attributes
    Attributes(AttributeListView),
    /// An element's children
    Children(ChildrenView),
    /// A single attribute
    Attribute(AttributeView),
}

impl View {
    fn inner(&self) -> &dyn NodeView {
        match self {
            View::Element(v) => v,
            View::Attributes(v) => v,
            View::Children(v) => v,
            View::Attribute(v) => v,
        }
    }

    /// Whether this view addresses a single attribute
    pub fn is_attribute(&self) -> bool {
        matches!(self, View::Attribute(_))
    }
}

impl NodeView for View {
    fn node_name(&self) -> String {
        self.inner().node_name()
    }

    fn get_field(&self, name: &str) -> Option<View> {
        self.inner().get_field(name)
    }

    fn set_field(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        self.inner().set_field(name, value)
    }

    fn get_index(&self, index: usize) -> Option<View> {
        self.inner().get_index(index)
    }

    fn get_attribute(&self, name: &str) -> Option<View> {
        self.inner().get_attribute(name)
    }

    fn set_index(&self, name: &str, value: &XmlValue) -> XmlResult<()> {
        self.inner().set_index(name, value)
    }

    fn count(&self) -> usize {
        self.inner().count()
    }

    fn add_child(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<View> {
        self.inner().add_child(name, value, namespace)
    }

    fn add_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        self.inner().add_attribute(name, value, namespace)
    }

    fn attributes(&self, filter: NamespaceFilter) -> Option<View> {
        self.inner().attributes(filter)
    }

    fn children(&self, filter: NamespaceFilter) -> Option<View> {
        self.inner().children(filter)
    }

    fn namespaces(&self, recursive: bool, from_root: bool, used_only: bool) -> NamespaceMap {
        self.inner().namespaces(recursive, from_root, used_only)
    }

    fn write_xml(&self, buffer: &mut String) -> XmlResult<()> {
        self.inner().write_xml(buffer)
    }

    fn write_xml_as(&self, buffer: &mut String, encoding: &str) -> XmlResult<()> {
        self.inner().write_xml_as(buffer, encoding)
    }

    fn encoding(&self) -> String {
        self.inner().encoding()
    }

    fn xpath(&self, expression: &str) -> Option<Vec<View>> {
        self.inner().xpath(expression)
    }

    fn text(&self) -> String {
        self.inner().text()
    }

    fn remove_field(&self, name: &str) -> usize {
        self.inner().remove_field(name)
    }

    fn remove_attribute(&self, name: &str) -> bool {
        self.inner().remove_attribute(name)
    }
}

//! Caller-facing element handle
//!
//! [`SimpleXmlElement`] pairs a [`View`] with a class name. Every result it
//! produces (fields, indexes, attribute lists, query matches) is wrapped
//! again with the same class name, so callers that subclass keep their
//! identity across navigation.
//!
//! The facade is also where recoverable failures are reported: invalid
//! names, namespaced attributes without a prefix, bad path expressions and
//! output errors are logged with `tracing::warn!` before being returned.
//!
//! # Example
//!
//! ```rust
//! use simplexml::load_string;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = load_string(r#"<r><a x="1">hi</a><a x="2">lo</a></r>"#)?;
//!
//! let a = root.get_field("a").unwrap();
//! assert_eq!(a.to_string(), "hi");
//! assert_eq!(a.count(), 2);
//! assert_eq!(a.get_index(1).unwrap().attribute("x").unwrap().to_string(), "2");
//!
//! root.add_child("b", Some("new"), None)?;
//! assert_eq!(root.get_field("b").unwrap().to_string(), "new");
//! # Ok(())
//! # }
//! ```

use crate::core::document::Document;
use crate::core::encoding::Encoding;
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::NamespaceMap;
use crate::types::XmlValue;
use crate::view::{ElementView, NamespaceFilter, NodeView, View};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Class name carried by handles unless overridden
pub const DEFAULT_CLASS: &str = "SimpleXMLElement";

fn report<T>(operation: &'static str, name: &str, result: XmlResult<T>) -> XmlResult<T> {
    if let Err(err) = &result {
        tracing::warn!(operation, name, error = %err, "XML operation failed");
    }
    result
}

fn filter_for(namespace: Option<&str>, is_prefix: bool) -> NamespaceFilter {
    if is_prefix {
        NamespaceFilter::new(None, namespace)
    } else {
        NamespaceFilter::new(namespace, None)
    }
}

/// Handle onto an element, an element collection or an attribute
#[derive(Debug, Clone)]
pub struct SimpleXmlElement {
    class: Rc<str>,
    view: View,
}

impl SimpleXmlElement {
    /// Handle onto the document element of `doc`
    pub fn from_document(doc: Document) -> Self {
        let root = doc.root_id();
        Self::from_view(View::Element(ElementView::new(doc, root)))
    }

    /// Wrap a view with the default class name
    pub fn from_view(view: View) -> Self {
        Self {
            class: Rc::from(DEFAULT_CLASS),
            view,
        }
    }

    /// Replace the class name carried by this handle and everything derived
    /// from it
    pub fn with_class(self, class: &str) -> Self {
        Self {
            class: Rc::from(class),
            view: self.view,
        }
    }

    /// Class name of this handle
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Underlying view
    pub fn view(&self) -> &View {
        &self.view
    }

    fn wrap(&self, view: View) -> Self {
        Self {
            class: Rc::clone(&self.class),
            view,
        }
    }

    /// Local name of the addressed node
    pub fn name(&self) -> String {
        self.view.node_name()
    }

    /// String value: own text of an element, value of an attribute
    pub fn text(&self) -> String {
        self.view.text()
    }

    /// Declared document encoding, `UTF-8` when none is declared
    pub fn encoding(&self) -> String {
        self.view.encoding()
    }

    /// Children named `name`
    pub fn get_field(&self, name: &str) -> Option<Self> {
        self.view.get_field(name).map(|v| self.wrap(v))
    }

    /// Set the text of the first child named `name`, creating it if needed
    pub fn set_field(&self, name: &str, value: impl Into<XmlValue>) -> XmlResult<()> {
        report("set_field", name, self.view.set_field(name, &value.into()))
    }

    /// The `index`-th item: a same-named sibling for elements, a match for
    /// collections
    pub fn get_index(&self, index: usize) -> Option<Self> {
        self.view.get_index(index).map(|v| self.wrap(v))
    }

    /// Attribute by name
    pub fn attribute(&self, name: &str) -> Option<Self> {
        self.view.get_attribute(name).map(|v| self.wrap(v))
    }

    /// Set or create an attribute
    pub fn set_index(&self, name: &str, value: impl Into<XmlValue>) -> XmlResult<()> {
        report("set_index", name, self.view.set_index(name, &value.into()))
    }

    /// Number of items: children of an element, matches of a collection
    pub fn count(&self) -> usize {
        self.view.count()
    }

    /// Iterate over the items of this handle
    ///
    /// An element yields its children; collections yield their matches and
    /// an attribute yields itself.
    pub fn iter(&self) -> std::vec::IntoIter<SimpleXmlElement> {
        let items: Vec<SimpleXmlElement> = match &self.view {
            View::Element(element) => element
                .children(NamespaceFilter::Any)
                .map(|children| {
                    (0..children.count())
                        .filter_map(|i| children.get_index(i))
                        .map(|v| self.wrap(v))
                        .collect()
                })
                .unwrap_or_default(),
            view => (0..view.count())
                .filter_map(|i| view.get_index(i))
                .map(|v| self.wrap(v))
                .collect(),
        };
        items.into_iter()
    }

    /// Append a child element
    pub fn add_child(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<Self> {
        report("add_child", name, self.view.add_child(name, value, namespace))
            .map(|v| self.wrap(v))
    }

    /// Add an attribute; a non-empty namespace requires a prefixed name
    pub fn add_attribute(
        &self,
        name: &str,
        value: Option<&str>,
        namespace: Option<&str>,
    ) -> XmlResult<()> {
        report(
            "add_attribute",
            name,
            self.view.add_attribute(name, value, namespace),
        )
    }

    /// Attributes, optionally restricted to a namespace URI (or prefix when
    /// `is_prefix` is set)
    pub fn attributes(&self, namespace: Option<&str>, is_prefix: bool) -> Option<Self> {
        self.view
            .attributes(filter_for(namespace, is_prefix))
            .map(|v| self.wrap(v))
    }

    /// Children, optionally restricted to a namespace URI (or prefix when
    /// `is_prefix` is set)
    pub fn children(&self, namespace: Option<&str>, is_prefix: bool) -> Option<Self> {
        self.view
            .children(filter_for(namespace, is_prefix))
            .map(|v| self.wrap(v))
    }

    /// Namespaces used by element and attribute names, starting here
    pub fn get_namespaces(&self, recursive: bool) -> NamespaceMap {
        self.view.namespaces(recursive, false, true)
    }

    /// Namespaces declared in the document
    pub fn get_doc_namespaces(&self, recursive: bool, from_root: bool) -> NamespaceMap {
        self.view.namespaces(recursive, from_root, false)
    }

    /// Evaluate a path expression; `None` when it is malformed
    pub fn xpath(&self, expression: &str) -> Option<Vec<Self>> {
        self.view
            .xpath(expression)
            .map(|views| views.into_iter().map(|v| self.wrap(v)).collect())
    }

    /// Remove every child named `name`
    pub fn remove_field(&self, name: &str) -> usize {
        self.view.remove_field(name)
    }

    /// Remove an attribute by name
    pub fn remove_attribute(&self, name: &str) -> bool {
        self.view.remove_attribute(name)
    }

    /// Serialize to XML text
    ///
    /// The document element is rendered with its XML declaration.
    pub fn as_xml(&self) -> Option<String> {
        match self.view.to_xml() {
            Ok(xml) => Some(xml),
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize XML");
                None
            }
        }
    }

    /// Serialize and write to `path`
    ///
    /// Output is encoded with `encoding`, or the document's declared
    /// encoding when `None`. An XML declaration in the output names the
    /// encoding actually used. The file is written to a temporary file in
    /// the target directory and renamed into place.
    pub fn as_xml_to_file<P: AsRef<Path>>(&self, path: P, encoding: Option<&str>) -> bool {
        let path = path.as_ref();
        match self.write_file(path, encoding) {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes, "wrote XML file");
                true
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to write XML file");
                false
            }
        }
    }

    fn write_file(&self, path: &Path, encoding: Option<&str>) -> XmlResult<usize> {
        let declared = self.view.encoding();
        let label = encoding.filter(|e| !e.is_empty()).unwrap_or(declared.as_str());
        let target = Encoding::for_label(label)
            .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding '{}'", label)))?;

        // The declaration must name the encoding the bytes are written in
        let mut xml = String::new();
        if Encoding::for_label(&declared).is_some_and(|d| d.same_as(target)) {
            self.view.write_xml(&mut xml)?;
        } else {
            self.view.write_xml_as(&mut xml, target.label())?;
        }
        let bytes = target.encode(&xml)?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.persist(path).map_err(|e| XmlError::Io(e.error))?;
        Ok(bytes.len())
    }
}

impl fmt::Display for SimpleXmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view.text())
    }
}

impl<'a> IntoIterator for &'a SimpleXmlElement {
    type Item = SimpleXmlElement;
    type IntoIter = std::vec::IntoIter<SimpleXmlElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

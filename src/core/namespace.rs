//! Namespace handling
//!
//! This module holds the well-known namespace URIs, the ordered
//! prefix-to-URI map returned by namespace enumeration, and the name
//! validation used whenever elements or attributes are created.

use crate::core::error::{XmlError, XmlResult};

/// Well-known namespaces
pub mod ns {
    /// XML namespace (for xml:lang, xml:space, etc.)
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Namespace of `xmlns` declarations themselves
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
    /// XML prefix
    pub const XML_PREFIX: &str = "xml";
    /// xmlns prefix
    pub const XMLNS_PREFIX: &str = "xmlns";
}

/// Ordered map of namespace prefix to URI
///
/// The default namespace is stored under the empty prefix. Insertion order
/// is preserved and the first binding recorded for a prefix wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: Vec<(String, String)>,
}

impl NamespaceMap {
    /// Create an empty namespace map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding unless the prefix is already present
    ///
    /// Returns `true` when the binding was added.
    pub fn insert_if_absent(&mut self, prefix: &str, uri: &str) -> bool {
        if self.has_prefix(prefix) {
            return false;
        }
        self.entries.push((prefix.to_string(), uri.to_string()));
        true
    }

    /// Get the URI for a namespace prefix
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Get the first prefix bound to a namespace URI
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Check if a namespace prefix is present
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.entries.iter().any(|(p, _)| p == prefix)
    }

    /// Check if a namespace URI is present
    pub fn has_uri(&self, uri: &str) -> bool {
        self.entries.iter().any(|(_, u)| u == uri)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no bindings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(prefix, uri)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl<'a> IntoIterator for &'a NamespaceMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Split `prefix:local` into its parts; an unprefixed name yields `(None, name)`
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Check whether `ch` may start an XML name
pub fn is_name_start_char(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

/// Check whether `ch` may continue an XML name
pub fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch) || ch.is_numeric() || ch == '-' || ch == '.' || ch == '\u{B7}'
}

/// Check that `name` is a valid non-colonized XML name
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Validate an element or attribute name (`local` or `prefix:local`)
pub fn validate_name(name: &str) -> XmlResult<()> {
    let valid = match split_qname(name) {
        (Some(prefix), local) => is_ncname(prefix) && is_ncname(local),
        (None, local) => is_ncname(local),
    };
    if valid {
        Ok(())
    } else {
        Err(XmlError::InvalidName(name.to_string()))
    }
}

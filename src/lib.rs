//! # simplexml
//!
//! Navigable, namespace-aware views over XML documents.
//!
//! A parsed document lives in an arena owned by a shared [`Document`]
//! handle. Navigation never copies the tree: it hands out lightweight
//! views ([`view::ElementView`], [`view::ChildrenView`],
//! [`view::AttributeListView`], [`view::AttributeView`]) wrapped in the
//! caller-facing [`SimpleXmlElement`].
//!
//! ## Features
//!
//! - Field access to children by name, index access to siblings and
//!   attributes
//! - Namespace-filtered projections of children and attributes
//! - A path query subset (`/`, `//`, `*`, `..`, `@attr`, positional and
//!   equality predicates)
//! - Serialization with optional re-encoding and atomic file output
//!
//! ## Example
//!
//! ```rust
//! use simplexml::load_string;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = load_string("<root><a><item/></a><item/></root>")?;
//! let items = root.xpath("//item").unwrap_or_default();
//! assert_eq!(items.len(), 2);
//!
//! root.set_field("title", "Hello")?;
//! assert_eq!(root.get_field("title").unwrap().to_string(), "Hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Diagnostics are emitted through [`tracing`]; install a subscriber to
//! see them. Recoverable API failures are reported at `warn` level.

pub mod core;
pub mod facade;
pub mod types;
pub mod view;

pub use self::core::{Document, NamespaceMap, XmlError, XmlResult};
pub use facade::SimpleXmlElement;
pub use types::XmlValue;
pub use view::{NamespaceFilter, NodeView, View};

use std::path::Path;

/// Parse XML text and return a handle onto its document element
pub fn load_string(xml: &str) -> XmlResult<SimpleXmlElement> {
    Ok(Document::parse(xml)?.root())
}

/// Read and parse an XML file and return a handle onto its document element
pub fn load_file<P: AsRef<Path>>(path: P) -> XmlResult<SimpleXmlElement> {
    Ok(Document::load_file(path)?.root())
}

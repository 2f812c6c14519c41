//! Core module
//!
//! This module contains the document model and everything that operates on
//! it directly: parsing, serialization, namespace resolution, output
//! encodings and the path query engine.

pub mod document;
pub mod encoding;
pub mod error;
pub mod namespace;
pub mod node;
pub mod parser;
pub mod serializer;
pub mod xpath;

pub use document::{Document, Tree, DEFAULT_ENCODING};
pub use encoding::{decode, encode, Encoding};
pub use error::{XmlError, XmlResult};
pub use namespace::{ns, validate_name, NamespaceMap};
pub use node::{Arena, Attribute, Element, NamespaceDecl, NodeId};
pub use parser::XmlParser;
pub use serializer::XmlSerializer;
pub use xpath::{parse_query, select, Query, QueryMatch};

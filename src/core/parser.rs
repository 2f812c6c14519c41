//! XML parser
//!
//! Builds a [`Tree`] from XML text with quick-xml. Namespace declarations
//! are tracked with a scope stack while reading so that element and
//! attribute prefixes are resolved as each start tag is seen.

use crate::core::document::Tree;
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::{ns, split_qname};
use crate::core::node::{Arena, Attribute, Element, NamespaceDecl, NodeId};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parser for XML documents
#[derive(Debug, Default)]
pub struct XmlParser {
    /// Declarations in scope, one frame per open element
    scopes: Vec<Vec<NamespaceDecl>>,
}

impl XmlParser {
    /// Create a new XML parser
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Parse a complete document
    pub fn parse(&mut self, xml: &str) -> XmlResult<Tree> {
        self.scopes.clear();

        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut arena = Arena::new();
        let mut root: Option<NodeId> = None;
        let mut stack: Vec<NodeId> = Vec::new();
        let mut version = None;
        let mut encoding = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Decl(e)) => {
                    version = e
                        .version()
                        .ok()
                        .map(|v| String::from_utf8_lossy(&v).to_string());
                    encoding = e
                        .encoding()
                        .and_then(Result::ok)
                        .map(|v| String::from_utf8_lossy(&v).to_string());
                }
                Ok(Event::Start(e)) => {
                    let id = self.open_element(&mut arena, &mut root, &stack, &e)?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    self.open_element(&mut arena, &mut root, &stack, &e)?;
                    self.scopes.pop();
                }
                Ok(Event::End(_)) => {
                    if let Some(id) = stack.pop() {
                        Self::finish_text(&mut arena, id);
                    }
                    self.scopes.pop();
                }
                Ok(Event::Text(e)) => {
                    // Decode XML entities (e.g., &quot; -> ")
                    let raw_text = String::from_utf8_lossy(e.as_ref());
                    let text = match unescape(&raw_text) {
                        Ok(unescaped) => unescaped.to_string(),
                        Err(_) => raw_text.to_string(),
                    };
                    Self::append_text(&mut arena, &stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    Self::append_text(&mut arena, &stack, &text)?;
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                    let text = match unescape(&entity) {
                        Ok(unescaped) => unescaped.to_string(),
                        Err(_) => entity.clone(),
                    };
                    Self::append_text(&mut arena, &stack, &text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XmlError::Parse(format!(
                        "XML parsing error at position {}: {}",
                        reader.error_position(),
                        e
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(XmlError::Parse("Unclosed element at end of input".to_string()));
        }
        let root = root.ok_or_else(|| XmlError::Parse("No root element".to_string()))?;

        tracing::debug!(elements = arena.len(), "parsed XML document");

        Ok(Tree {
            arena,
            root,
            version,
            encoding,
        })
    }

    /// Create the element for a start (or empty) tag and push its scope
    fn open_element(
        &mut self,
        arena: &mut Arena,
        root: &mut Option<NodeId>,
        stack: &[NodeId],
        e: &BytesStart<'_>,
    ) -> XmlResult<NodeId> {
        let qname = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let (decls, attrs) = Self::collect_attributes(e)?;
        self.scopes.push(decls.clone());

        let (prefix, local) = split_qname(&qname);
        let mut element = Element::new(local);
        element.prefix = prefix.map(str::to_string);
        element.namespace = self.resolve(prefix);
        element.namespaces = decls;

        for (attr_name, attr_value) in attrs {
            let attribute = match split_qname(&attr_name) {
                (Some(attr_prefix), attr_local) => Attribute {
                    name: attr_local.to_string(),
                    prefix: Some(attr_prefix.to_string()),
                    namespace: self.resolve(Some(attr_prefix)),
                    value: attr_value,
                },
                // Unprefixed attributes are never in the default namespace
                (None, attr_local) => Attribute::new(attr_local, attr_value),
            };
            element.attributes.push(attribute);
        }

        match stack.last() {
            Some(parent) => arena.append_child(*parent, element).ok_or_else(|| {
                XmlError::Parse(format!("Parent of <{}> is no longer available", qname))
            }),
            None if root.is_none() => {
                let id = arena.insert(element);
                *root = Some(id);
                Ok(id)
            }
            None => Err(XmlError::Parse(format!(
                "Multiple root elements: found <{}> after the document element",
                qname
            ))),
        }
    }

    /// Split tag attributes into namespace declarations and regular attributes
    fn collect_attributes(
        e: &BytesStart<'_>,
    ) -> XmlResult<(Vec<NamespaceDecl>, Vec<(String, String)>)> {
        let mut decls = Vec::new();
        let mut attrs = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| XmlError::Parse(format!("Bad attribute: {}", err)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            // Decode XML entities in attribute values (e.g., &quot; -> ")
            let raw_value = String::from_utf8_lossy(attr.value.as_ref());
            let value = match unescape(&raw_value) {
                Ok(unescaped) => unescaped.to_string(),
                Err(_) => raw_value.to_string(),
            };

            if key == ns::XMLNS_PREFIX {
                decls.push(NamespaceDecl::new(None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                decls.push(NamespaceDecl::new(Some(prefix), value));
            } else {
                attrs.push((key, value));
            }
        }
        Ok((decls, attrs))
    }

    /// Resolve a prefix against the open scopes, innermost first
    fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some(ns::XML_PREFIX) {
            return Some(ns::XML.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|decl| decl.prefix.as_deref() == prefix)
            .and_then(|decl| (!decl.uri.is_empty()).then(|| decl.uri.clone()))
    }

    fn append_text(arena: &mut Arena, stack: &[NodeId], text: &str) -> XmlResult<()> {
        let Some(current) = stack.last() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(XmlError::Parse(
                "Text content outside of the document element".to_string(),
            ));
        };

        if let Some(element) = arena.get_mut(*current) {
            element.text.get_or_insert_with(String::new).push_str(text);
        }
        Ok(())
    }

    /// Drop formatting whitespace from elements that have child elements
    fn finish_text(arena: &mut Arena, id: NodeId) {
        let Some(element) = arena.get_mut(id) else {
            return;
        };
        let whitespace_only = element
            .text
            .as_deref()
            .is_some_and(|t| t.trim().is_empty());
        if whitespace_only && !element.children.is_empty() {
            element.text = None;
        }
    }
}

//! Path expressions
//!
//! This module parses and evaluates the restricted XPath subset supported
//! by [`crate::view::NodeView::xpath`]:
//! - `a/b`, `/a/b` - child steps, relative or from the document
//! - `//item`, `a//b` - descendant-or-self
//! - `*`, `p:*`, `p:name` - wildcards and namespace-qualified names
//! - `.`, `..`, `@attr` - self, parent and a final attribute step
//! - `[2]`, `[last()]`, `[@id]`, `[@id='x']`, `[name='x']` - predicates
//!
//! Parsing fails with [`XmlError::InvalidExpression`]; a well-formed
//! expression that matches nothing evaluates to an empty list.

use crate::core::document::Tree;
use crate::core::error::{XmlError, XmlResult};
use crate::core::namespace::{is_name_char, is_name_start_char};
use crate::core::node::{Element, NodeId};
use std::collections::HashSet;
use std::fmt;

/// A qualified name as written in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Prefix, resolved against the context node at evaluation time
    pub prefix: Option<String>,
    /// Local name
    pub local: String,
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Node test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// `prefix:*`
    AnyInNamespace(String),
    /// `name` or `prefix:name`
    Name(QName),
}

/// What a step selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// `.`
    SelfNode,
    /// `..`
    Parent,
    /// Child elements matching a name test
    Element(NameTest),
    /// `@name`, only valid as the final step
    Attribute(NameTest),
}

/// A step predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based
    Position(usize),
    /// `[last()]`
    Last,
    /// `[@name]`
    HasAttribute(QName),
    /// `[@name='value']`
    AttributeEquals(QName, String),
    /// `[child='value']`
    ChildEquals(QName, String),
}

/// A location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Whether the step was introduced by `//`
    pub descendant: bool,
    /// Node selection
    pub kind: StepKind,
    /// Predicates applied in order, per context node
    pub predicates: Vec<Predicate>,
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Whether evaluation starts at the document
    pub absolute: bool,
    /// Location steps
    pub steps: Vec<Step>,
}

/// One result of evaluating a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMatch {
    /// An element
    Element(NodeId),
    /// An attribute of an element
    Attribute {
        /// Owning element
        element: NodeId,
        /// Attribute local name
        name: String,
        /// Attribute namespace URI
        namespace: Option<String>,
    },
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, s: &str) -> bool {
        let len = s.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + len)
            .is_some_and(|window| window.iter().copied().eq(s.chars()));
        if matches {
            self.pos += len;
        }
        matches
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> XmlError {
        let input: String = self.chars.iter().collect();
        XmlError::InvalidExpression(format!("{} at offset {} in '{}'", message, self.pos, input))
    }

    fn expect(&mut self, s: &str) -> XmlResult<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected '{}'", s)))
        }
    }

    fn ncname(&mut self) -> XmlResult<String> {
        match self.peek() {
            Some(ch) if is_name_start_char(ch) => {}
            _ => return Err(self.error("Expected a name")),
        }
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn qname(&mut self) -> XmlResult<QName> {
        let first = self.ncname()?;
        if self.eat(":") {
            let local = self.ncname()?;
            return Ok(QName {
                prefix: Some(first),
                local,
            });
        }
        Ok(QName {
            prefix: None,
            local: first,
        })
    }

    fn literal(&mut self) -> XmlResult<String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("Expected a quoted literal")),
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == quote {
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(value);
            }
            self.pos += 1;
        }
        Err(self.error("Unterminated literal"))
    }
}

/// Parse a path expression
pub fn parse_query(expression: &str) -> XmlResult<Query> {
    let mut cursor = Cursor::new(expression.trim());
    if cursor.is_eof() {
        return Err(XmlError::InvalidExpression("Empty expression".to_string()));
    }

    let mut absolute = false;
    let mut descendant = false;
    if cursor.eat("//") {
        absolute = true;
        descendant = true;
    } else if cursor.eat("/") {
        absolute = true;
        if cursor.is_eof() {
            return Ok(Query {
                absolute,
                steps: Vec::new(),
            });
        }
    }

    let mut steps = Vec::new();
    loop {
        let step = parse_step(&mut cursor, descendant)?;
        let is_attribute = matches!(step.kind, StepKind::Attribute(_));
        steps.push(step);

        if cursor.is_eof() {
            break;
        }
        if is_attribute {
            return Err(cursor.error("Attribute step must be the last step"));
        }
        if cursor.eat("//") {
            descendant = true;
        } else if cursor.eat("/") {
            descendant = false;
        } else {
            return Err(cursor.error("Unexpected character"));
        }
        if cursor.is_eof() {
            return Err(cursor.error("Expected a step after '/'"));
        }
    }

    Ok(Query { absolute, steps })
}

fn parse_step(cursor: &mut Cursor, descendant: bool) -> XmlResult<Step> {
    let kind = if cursor.eat("..") {
        StepKind::Parent
    } else if cursor.eat(".") {
        StepKind::SelfNode
    } else if cursor.eat("@") {
        StepKind::Attribute(parse_name_test(cursor)?)
    } else {
        StepKind::Element(parse_name_test(cursor)?)
    };

    let mut predicates = Vec::new();
    if matches!(kind, StepKind::Element(_)) {
        while cursor.eat("[") {
            predicates.push(parse_predicate(cursor)?);
        }
    }

    Ok(Step {
        descendant,
        kind,
        predicates,
    })
}

fn parse_name_test(cursor: &mut Cursor) -> XmlResult<NameTest> {
    if cursor.eat("*") {
        return Ok(NameTest::Any);
    }
    let first = cursor.ncname()?;
    if cursor.eat(":") {
        if cursor.eat("*") {
            return Ok(NameTest::AnyInNamespace(first));
        }
        let local = cursor.ncname()?;
        return Ok(NameTest::Name(QName {
            prefix: Some(first),
            local,
        }));
    }
    Ok(NameTest::Name(QName {
        prefix: None,
        local: first,
    }))
}

fn parse_predicate(cursor: &mut Cursor) -> XmlResult<Predicate> {
    cursor.skip_whitespace();

    let predicate = if cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        let start = cursor.pos;
        while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            cursor.pos += 1;
        }
        let digits: String = cursor.chars[start..cursor.pos].iter().collect();
        // Overflow is the only possible failure
        Predicate::Position(digits.parse::<usize>().unwrap_or(usize::MAX))
    } else if cursor.eat("last()") {
        Predicate::Last
    } else if cursor.eat("@") {
        let name = cursor.qname()?;
        cursor.skip_whitespace();
        if cursor.eat("=") {
            cursor.skip_whitespace();
            Predicate::AttributeEquals(name, cursor.literal()?)
        } else {
            Predicate::HasAttribute(name)
        }
    } else {
        let name = cursor.qname()?;
        cursor.skip_whitespace();
        cursor.expect("=")?;
        cursor.skip_whitespace();
        Predicate::ChildEquals(name, cursor.literal()?)
    };

    cursor.skip_whitespace();
    cursor.expect("]")?;
    Ok(predicate)
}

impl fmt::Display for NameTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameTest::Any => write!(f, "*"),
            NameTest::AnyInNamespace(prefix) => write!(f, "{}:*", prefix),
            NameTest::Name(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Position(n) => write!(f, "[{}]", n),
            Predicate::Last => write!(f, "[last()]"),
            Predicate::HasAttribute(name) => write!(f, "[@{}]", name),
            Predicate::AttributeEquals(name, value) => write!(f, "[@{}='{}']", name, value),
            Predicate::ChildEquals(name, value) => write!(f, "[{}='{}']", name, value),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if step.descendant {
                write!(f, "//")?;
            } else if i > 0 || self.absolute {
                write!(f, "/")?;
            }
            match &step.kind {
                StepKind::SelfNode => write!(f, ".")?,
                StepKind::Parent => write!(f, "..")?,
                StepKind::Element(test) => write!(f, "{}", test)?,
                StepKind::Attribute(test) => write!(f, "@{}", test)?,
            }
            for predicate in &step.predicates {
                write!(f, "{}", predicate)?;
            }
        }
        if self.absolute && self.steps.is_empty() {
            write!(f, "/")?;
        }
        Ok(())
    }
}

/// A name test with its prefix resolved
#[derive(Debug, Clone)]
struct Matcher {
    /// `None` matches any local name
    local: Option<String>,
    /// `None` matches any namespace, `Some(None)` only "no namespace"
    namespace: Option<Option<String>>,
}

impl Matcher {
    fn matches(&self, name: &str, namespace: Option<&str>) -> bool {
        let name_ok = self.local.as_deref().map_or(true, |l| l == name);
        let ns_ok = self
            .namespace
            .as_ref()
            .map_or(true, |uri| uri.as_deref() == namespace);
        name_ok && ns_ok
    }
}

/// Context item during evaluation; the document sits above the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Item {
    Document,
    Node(NodeId),
}

struct Evaluator<'t> {
    tree: &'t Tree,
    context: NodeId,
}

impl<'t> Evaluator<'t> {
    fn resolve_qname(&self, name: &QName) -> Option<Matcher> {
        let namespace = match &name.prefix {
            Some(prefix) => Some(self.tree.resolve_prefix(self.context, Some(prefix))?),
            None => None,
        };
        Some(Matcher {
            local: Some(name.local.clone()),
            namespace: Some(namespace),
        })
    }

    fn resolve_test(&self, test: &NameTest) -> Option<Matcher> {
        match test {
            NameTest::Any => Some(Matcher {
                local: None,
                namespace: None,
            }),
            NameTest::AnyInNamespace(prefix) => Some(Matcher {
                local: None,
                namespace: Some(Some(self.tree.resolve_prefix(self.context, Some(prefix))?)),
            }),
            NameTest::Name(name) => self.resolve_qname(name),
        }
    }

    fn element(&self, id: NodeId) -> Option<&'t Element> {
        self.tree.element(id)
    }

    fn children(&self, item: Item) -> Vec<NodeId> {
        match item {
            Item::Document => vec![self.tree.root],
            Item::Node(id) => self.element(id).map(|e| e.children.clone()).unwrap_or_default(),
        }
    }

    fn descendant_or_self(&self, item: Item) -> Vec<Item> {
        match item {
            Item::Document => std::iter::once(Item::Document)
                .chain(self.tree.arena.subtree(self.tree.root).into_iter().map(Item::Node))
                .collect(),
            Item::Node(id) => self.tree.arena.subtree(id).into_iter().map(Item::Node).collect(),
        }
    }

    fn apply_predicate(&self, predicate: &Predicate, nodes: Vec<NodeId>) -> Option<Vec<NodeId>> {
        let filtered = match predicate {
            Predicate::Position(n) => nodes.get(n.wrapping_sub(1)).copied().into_iter().collect(),
            Predicate::Last => nodes.last().copied().into_iter().collect(),
            Predicate::HasAttribute(name) => {
                let matcher = self.resolve_qname(name)?;
                nodes
                    .into_iter()
                    .filter(|id| {
                        self.element(*id).is_some_and(|e| {
                            e.attributes
                                .iter()
                                .any(|a| matcher.matches(&a.name, a.namespace.as_deref()))
                        })
                    })
                    .collect()
            }
            Predicate::AttributeEquals(name, value) => {
                let matcher = self.resolve_qname(name)?;
                nodes
                    .into_iter()
                    .filter(|id| {
                        self.element(*id).is_some_and(|e| {
                            e.attributes.iter().any(|a| {
                                matcher.matches(&a.name, a.namespace.as_deref()) && a.value == *value
                            })
                        })
                    })
                    .collect()
            }
            Predicate::ChildEquals(name, value) => {
                let matcher = self.resolve_qname(name)?;
                nodes
                    .into_iter()
                    .filter(|id| {
                        self.children(Item::Node(*id)).into_iter().any(|c| {
                            self.element(c).is_some_and(|child| {
                                matcher.matches(&child.name, child.namespace.as_deref())
                                    && child.text.as_deref().unwrap_or("") == value
                            })
                        })
                    })
                    .collect()
            }
        };
        Some(filtered)
    }

    /// Evaluate; `None` means a prefix could not be resolved
    fn evaluate(&self, query: &Query) -> Option<Vec<QueryMatch>> {
        if !self.tree.arena.contains(self.context) {
            return Some(Vec::new());
        }

        let order = self.tree.document_order();
        let position = |item: &Item| match item {
            Item::Document => 0,
            Item::Node(id) => order.get(id).map_or(usize::MAX, |p| p + 1),
        };

        let mut current = vec![if query.absolute {
            Item::Document
        } else {
            Item::Node(self.context)
        }];

        for step in &query.steps {
            let contexts: Vec<Item> = if step.descendant {
                let mut seen = HashSet::new();
                current
                    .iter()
                    .flat_map(|item| self.descendant_or_self(*item))
                    .filter(|item| seen.insert(*item))
                    .collect()
            } else {
                current.clone()
            };

            if let StepKind::Attribute(test) = &step.kind {
                let matcher = self.resolve_test(test)?;
                let mut matches = Vec::new();
                for item in contexts {
                    let Item::Node(id) = item else { continue };
                    let Some(element) = self.element(id) else { continue };
                    for attr in &element.attributes {
                        if matcher.matches(&attr.name, attr.namespace.as_deref()) {
                            matches.push(QueryMatch::Attribute {
                                element: id,
                                name: attr.name.clone(),
                                namespace: attr.namespace.clone(),
                            });
                        }
                    }
                }
                return Some(matches);
            }

            let mut next = Vec::new();
            for item in contexts {
                match &step.kind {
                    StepKind::SelfNode => next.push(item),
                    StepKind::Parent => match item {
                        Item::Document => {}
                        Item::Node(id) => match self.element(id).and_then(|e| e.parent) {
                            Some(parent) => next.push(Item::Node(parent)),
                            None => next.push(Item::Document),
                        },
                    },
                    StepKind::Element(test) => {
                        let matcher = self.resolve_test(test)?;
                        let mut candidates: Vec<NodeId> = self
                            .children(item)
                            .into_iter()
                            .filter(|c| {
                                self.element(*c).is_some_and(|e| {
                                    matcher.matches(&e.name, e.namespace.as_deref())
                                })
                            })
                            .collect();
                        for predicate in &step.predicates {
                            candidates = self.apply_predicate(predicate, candidates)?;
                        }
                        next.extend(candidates.into_iter().map(Item::Node));
                    }
                    // Attribute steps return above
                    StepKind::Attribute(_) => {}
                }
            }

            let mut seen = HashSet::new();
            next.retain(|item| seen.insert(*item));
            next.sort_by_key(|item| position(item));
            current = next;
        }

        Some(
            current
                .into_iter()
                .filter_map(|item| match item {
                    Item::Node(id) => Some(QueryMatch::Element(id)),
                    Item::Document => None,
                })
                .collect(),
        )
    }
}

/// Evaluate a parsed query against `context`
///
/// Prefixes resolve against the namespaces in scope at `context`; an
/// undeclared prefix yields an empty result.
pub fn evaluate(tree: &Tree, context: NodeId, query: &Query) -> Vec<QueryMatch> {
    let evaluator = Evaluator { tree, context };
    match evaluator.evaluate(query) {
        Some(matches) => {
            tracing::trace!(query = %query, matches = matches.len(), "evaluated path expression");
            matches
        }
        None => {
            tracing::trace!(query = %query, "undeclared namespace prefix in path expression");
            Vec::new()
        }
    }
}

/// Parse and evaluate `expression` against `context`
pub fn select(tree: &Tree, context: NodeId, expression: &str) -> XmlResult<Vec<QueryMatch>> {
    let query = parse_query(expression)?;
    Ok(evaluate(tree, context, &query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::XmlParser;
    use pretty_assertions::assert_eq;

    fn names(tree: &Tree, matches: &[QueryMatch]) -> Vec<String> {
        matches
            .iter()
            .map(|m| match m {
                QueryMatch::Element(id) => {
                    let e = tree.element(*id).unwrap();
                    match e.attribute("id", None) {
                        Some(a) => format!("{}#{}", e.name, a.value),
                        None => e.name.clone(),
                    }
                }
                QueryMatch::Attribute { name, .. } => format!("@{}", name),
            })
            .collect()
    }

    fn run(xml: &str, expr: &str) -> Vec<String> {
        let tree = XmlParser::new().parse(xml).unwrap();
        let matches = select(&tree, tree.root, expr).unwrap();
        names(&tree, &matches)
    }

    #[test]
    fn test_parse_simple_path() {
        let query = parse_query("a/b").unwrap();
        assert!(!query.absolute);
        assert_eq!(query.steps.len(), 2);
        assert_eq!(
            query.steps[0].kind,
            StepKind::Element(NameTest::Name(QName {
                prefix: None,
                local: "a".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_predicates() {
        let query = parse_query("//p:item[@id = 'x'][2]/@*").unwrap();
        assert!(query.absolute);
        assert!(query.steps[0].descendant);
        assert_eq!(query.steps[0].predicates.len(), 2);
        assert_eq!(query.steps[0].predicates[1], Predicate::Position(2));
        assert_eq!(query.steps[1].kind, StepKind::Attribute(NameTest::Any));
    }

    #[test]
    fn test_display_round_trip() {
        for expr in ["//p:item[@id='x'][2]/@*", "/r/a[last()]", "a//b[c='d']", "../x", "/"] {
            assert_eq!(parse_query(expr).unwrap().to_string(), expr);
        }
    }

    #[test]
    fn test_parse_invalid() {
        for expr in ["", "nonsense[[", "a/", "a[", "a[1", "@a/b", "a[@x='y]", "a b", "/ /"] {
            assert!(
                matches!(parse_query(expr), Err(XmlError::InvalidExpression(_))),
                "expected '{}' to be invalid",
                expr
            );
        }
    }

    #[test]
    fn test_descendant_document_order() {
        let xml = "<root><a><item/></a><item/></root>";
        assert_eq!(run(xml, "//item"), vec!["item", "item"]);

        let tree = XmlParser::new().parse(xml).unwrap();
        let matches = select(&tree, tree.root, "//item").unwrap();
        let parents: Vec<String> = matches
            .iter()
            .map(|m| match m {
                QueryMatch::Element(id) => {
                    let parent = tree.element(*id).unwrap().parent.unwrap();
                    tree.element(parent).unwrap().name.clone()
                }
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(parents, vec!["a", "root"]);
    }

    #[test]
    fn test_positional_predicates_per_parent() {
        let xml = r#"<r><g><i id="1"/><i id="2"/></g><g><i id="3"/></g></r>"#;
        assert_eq!(run(xml, "//i[1]"), vec!["i#1", "i#3"]);
        assert_eq!(run(xml, "g/i[last()]"), vec!["i#2", "i#3"]);
        assert_eq!(run(xml, "g[2]/i"), vec!["i#3"]);
        assert_eq!(run(xml, "g/i[5]"), Vec::<String>::new());
        assert_eq!(run(xml, "g/i[0]"), Vec::<String>::new());
        assert_eq!(run(xml, "g/i[99999999999999999999]"), Vec::<String>::new());
    }

    #[test]
    fn test_attribute_predicates_and_steps() {
        let xml = r#"<r><a id="x" k="1"/><a id="y"/><b><c>t</c></b></r>"#;
        assert_eq!(run(xml, "a[@id='y']"), vec!["a#y"]);
        assert_eq!(run(xml, "a[@k]"), vec!["a#x"]);
        assert_eq!(run(xml, "a/@id"), vec!["@id", "@id"]);
        assert_eq!(run(xml, "b[c='t']"), vec!["b"]);
        assert_eq!(run(xml, "b[c='u']"), Vec::<String>::new());
    }

    #[test]
    fn test_self_parent_and_absolute() {
        let xml = "<r><a><b/></a></r>";
        assert_eq!(run(xml, "."), vec!["r"]);
        assert_eq!(run(xml, "/r/a/b/.."), vec!["a"]);
        assert_eq!(run(xml, "/r"), vec!["r"]);
        assert_eq!(run(xml, "/x"), Vec::<String>::new());
        assert_eq!(run(xml, ".."), Vec::<String>::new());
        assert_eq!(run(xml, "*"), vec!["a"]);
    }

    #[test]
    fn test_namespaced_queries() {
        let xml = r#"<r xmlns:p="urn:p"><p:a/><a/><q:b xmlns:q="urn:p"/></r>"#;
        assert_eq!(run(xml, "p:a"), vec!["a"]);
        assert_eq!(run(xml, "a"), vec!["a"]);
        assert_eq!(run(xml, "p:*").len(), 2);
        // Undeclared prefix: empty, not an error
        assert_eq!(run(xml, "zz:a"), Vec::<String>::new());
    }
}

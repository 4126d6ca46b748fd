//! A minimal mutable CSS stylesheet tree.
//!
//! Parses CSS source into a tree of [`Node`]s (rules, at-rules, declarations),
//! lets callers walk and mutate the tree, and serializes it back to CSS text.
//! Raw prelude/params/value text is preserved verbatim so that transforms can
//! re-parse value text with their own grammar and leave untouched nodes
//! byte-identical on output.
//!
//! Tokenization and rule splitting are delegated to the `cssparser` crate;
//! this crate only assembles the results into an owned, addressable tree.

mod parse;
mod serialize;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

pub use cssparser::SourceLocation;
pub use parse::CssError;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a tree node.
///
/// Ids are process-unique, assigned at node construction, and survive tree
/// mutation. They let a transform record "which node" during a read-only walk
/// and address it again later without holding borrows in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A parsed stylesheet: the top-level node list plus the source file path
/// (when the stylesheet came from disk) used for relative reference
/// resolution by consumers.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub nodes: Vec<Node>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
}

/// A qualified rule: `selector { ... }`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: NodeId,
    pub selector: String,
    pub nodes: Vec<Node>,
    pub location: Option<SourceLocation>,
}

/// An at-rule: `@name params;` or `@name params { ... }`.
#[derive(Debug, Clone)]
pub struct AtRule {
    pub id: NodeId,
    pub name: String,
    pub params: String,
    /// `None` for block-less at-rules (`@import ...;`).
    pub block: Option<Vec<Node>>,
    pub location: Option<SourceLocation>,
}

/// A declaration: `property: value`. The value is kept as raw source text,
/// including any `!important` annotation.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: NodeId,
    pub property: String,
    pub value: String,
    pub location: Option<SourceLocation>,
}

impl Rule {
    pub fn new(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            id: NodeId::next(),
            selector: selector.into(),
            nodes,
            location: None,
        }
    }
}

impl AtRule {
    pub fn new(name: impl Into<String>, params: impl Into<String>, block: Option<Vec<Node>>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            params: params.into(),
            block,
            location: None,
        }
    }
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            property: property.into(),
            value: value.into(),
            location: None,
        }
    }
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Rule(r) => r.id,
            Node::AtRule(a) => a.id,
            Node::Declaration(d) => d.id,
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Node::Rule(r) => r.location,
            Node::AtRule(a) => a.location,
            Node::Declaration(d) => d.location,
        }
    }

    /// Child nodes, if this node kind has any.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Rule(r) => Some(&r.nodes),
            Node::AtRule(a) => a.block.as_deref(),
            Node::Declaration(_) => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Rule(r) => Some(&mut r.nodes),
            Node::AtRule(a) => a.block.as_mut(),
            Node::Declaration(_) => None,
        }
    }
}

impl Root {
    /// Parse CSS source into a tree. Strict: the first unrecoverable syntax
    /// error aborts the parse.
    pub fn parse(css: &str) -> Result<Self, CssError> {
        parse::parse(css, None)
    }

    /// Parse CSS source that was read from `file`. The path is retained so
    /// consumers can resolve relative references against it.
    pub fn parse_with_file(css: &str, file: impl Into<PathBuf>) -> Result<Self, CssError> {
        parse::parse(css, Some(file.into()))
    }

    /// Depth-first walk over every node in document order.
    pub fn walk<F: FnMut(&Node)>(&self, f: &mut F) {
        walk_nodes(&self.nodes, f);
    }

    /// Remove the node with the given id, wherever it sits in the tree.
    /// Returns `false` if no such node exists.
    pub fn remove(&mut self, id: NodeId) -> bool {
        remove_in(&mut self.nodes, id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        find_in(&self.nodes, id)
    }

    pub fn declaration_mut(&mut self, id: NodeId) -> Option<&mut Declaration> {
        match find_in_mut(&mut self.nodes, id)? {
            Node::Declaration(d) => Some(d),
            _ => None,
        }
    }

    pub fn to_css_string(&self) -> String {
        self.to_string()
    }
}

fn walk_nodes<F: FnMut(&Node)>(nodes: &[Node], f: &mut F) {
    for node in nodes {
        f(node);
        if let Some(children) = node.children() {
            walk_nodes(children, f);
        }
    }
}

fn remove_in(nodes: &mut Vec<Node>, id: NodeId) -> bool {
    if let Some(pos) = nodes.iter().position(|n| n.id() == id) {
        nodes.remove(pos);
        return true;
    }
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            if remove_in(children, id) {
                return true;
            }
        }
    }
    false
}

fn find_in(nodes: &[Node], id: NodeId) -> Option<&Node> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(children) = node.children() {
            if let Some(found) = find_in(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_mut(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
    for node in nodes.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(children) = node.children_mut() {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

//! Canvas document tree.
//!
//! The document is an arena (a `StableDiGraph`) of nodes with edges from
//! parent to child. Children keep insertion order, which is document order
//! because the tree is only ever built front to back and replaced
//! wholesale, never spliced.
//!
//! Every `Document` carries a process-unique *generation*. An
//! [`ElementRef`] remembers the generation it was taken from and stops
//! resolving once the document it points into has been replaced.

use crate::css::{Declaration, parse_declarations};
use crate::id::Tag;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

// ─── Nodes ───────────────────────────────────────────────────────────────

/// An attribute as written in markup. `value` is `None` for boolean
/// attributes (`<input disabled>`). Values hold decoded text; the parser
/// resolves character references and the emitter escapes `&` and `"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attrs: Vec<Attribute>,
}

/// A node in the document arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The arena root. Not an element.
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
        }
    }

    /// Attribute value by (case-insensitive) name. Boolean attributes
    /// read as the empty string.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Append a class token unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    /// Remove a class token. The attribute is dropped when it becomes empty.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", joined);
        }
    }

    // ─── Inline style ────────────────────────────────────────────────────

    /// Declarations of the `style` attribute, in source order.
    pub fn inline_declarations(&self) -> Vec<Declaration> {
        self.attr("style").map(parse_declarations).unwrap_or_default()
    }

    /// Value of one inline style property (last declaration wins).
    pub fn inline_style(&self, property: &str) -> Option<String> {
        self.inline_declarations()
            .into_iter()
            .rev()
            .find(|d| d.property.eq_ignore_ascii_case(property))
            .map(|d| d.value)
    }

    /// Set one inline style property, replacing earlier declarations of it.
    pub fn set_inline_style(&mut self, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let mut decls = self.inline_declarations();
        match decls.iter().position(|d| d.property == property) {
            Some(pos) => {
                decls.retain(|d| d.property != property);
                decls.insert(
                    pos.min(decls.len()),
                    Declaration::new(&property, value),
                );
            }
            None => decls.push(Declaration::new(&property, value)),
        }
        self.write_inline(&decls);
    }

    /// Remove one inline style property. The attribute is dropped when no
    /// declarations remain.
    pub fn remove_inline_style(&mut self, property: &str) {
        let mut decls = self.inline_declarations();
        let before = decls.len();
        decls.retain(|d| !d.property.eq_ignore_ascii_case(property));
        if decls.len() != before {
            self.write_inline(&decls);
        }
    }

    fn write_inline(&mut self, decls: &[Declaration]) {
        if decls.is_empty() {
            self.remove_attr("style");
            return;
        }
        let text = decls
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("style", text);
    }
}

// ─── Element references ──────────────────────────────────────────────────

/// A non-owning handle to an element of one document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    index: NodeIndex,
    generation: u64,
}

impl ElementRef {
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete canvas document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The underlying arena. Edges go parent → child.
    pub graph: StableDiGraph<Node, ()>,

    /// The document node.
    pub root: NodeIndex,

    generation: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a fresh generation.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Node::Document);
        Self {
            graph,
            root,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeIndex, node: Node) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        idx
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        match self.graph.node_weight(idx)? {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx)? {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in document order.
    ///
    /// Sorted by `NodeIndex`, which is insertion order for a tree that is
    /// only built front to back.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// All descendants of `idx` in pre-order (document order), excluding `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(idx).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// First element with the given tag, in document order.
    pub fn find_tag(&self, tag: &str) -> Option<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .find(|&idx| self.element(idx).is_some_and(|el| el.tag.is(tag)))
    }

    /// First element whose `id` attribute equals `id`.
    pub fn find_id(&self, id: &str) -> Option<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .find(|&idx| self.element(idx).and_then(Element::id) == Some(id))
    }

    pub fn head(&self) -> Option<NodeIndex> {
        self.find_tag("head")
    }

    pub fn body(&self) -> Option<NodeIndex> {
        self.find_tag("body")
    }

    /// Concatenated text of all text descendants.
    pub fn text_content(&self, idx: NodeIndex) -> String {
        let mut out = String::new();
        if let Some(Node::Text(t)) = self.node(idx) {
            out.push_str(t);
        }
        for d in self.descendants(idx) {
            if let Some(Node::Text(t)) = self.node(d) {
                out.push_str(t);
            }
        }
        out
    }

    // ─── References ──────────────────────────────────────────────────────

    /// Take a reference to the element at `idx` in this generation.
    pub fn element_ref(&self, idx: NodeIndex) -> Option<ElementRef> {
        self.element(idx).map(|_| ElementRef {
            index: idx,
            generation: self.generation,
        })
    }

    /// Resolve a reference; `None` if it belongs to another generation.
    pub fn resolve(&self, r: ElementRef) -> Option<NodeIndex> {
        (r.generation == self.generation && self.element(r.index).is_some()).then_some(r.index)
    }

    pub fn get(&self, r: ElementRef) -> Option<&Element> {
        self.resolve(r).and_then(|idx| self.element(idx))
    }

    pub fn get_mut(&mut self, r: ElementRef) -> Option<&mut Element> {
        let idx = self.resolve(r)?;
        self.element_mut(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeIndex, NodeIndex) {
        let mut doc = Document::new();
        let body = doc.append(doc.root, Node::Element(Element::new(Tag::intern("body"))));
        let div = doc.append(body, Node::Element(Element::new(Tag::intern("div"))));
        doc.append(div, Node::Text("hello".into()));
        (doc, body, div)
    }

    #[test]
    fn children_keep_document_order() {
        let mut doc = Document::new();
        let a = doc.append(doc.root, Node::Text("a".into()));
        let b = doc.append(doc.root, Node::Text("b".into()));
        assert_eq!(doc.children(doc.root), vec![a, b]);
    }

    #[test]
    fn descendants_are_preorder() {
        let (doc, body, div) = sample();
        let d = doc.descendants(doc.root);
        assert_eq!(d[0], body);
        assert_eq!(d[1], div);
        assert_eq!(d.len(), 3);
        assert_eq!(doc.text_content(body), "hello");
    }

    #[test]
    fn stale_references_do_not_resolve() {
        let (doc, _, div) = sample();
        let r = doc.element_ref(div).unwrap();
        assert!(doc.get(r).is_some());

        let (other, _, _) = sample();
        assert_ne!(doc.generation(), other.generation());
        assert!(other.get(r).is_none());
    }

    #[test]
    fn class_tokens() {
        let mut el = Element::new(Tag::intern("div"));
        el.add_class("card");
        el.add_class("selected");
        el.add_class("selected");
        assert_eq!(el.attr("class"), Some("card selected"));
        el.remove_class("card");
        assert_eq!(el.attr("class"), Some("selected"));
        el.remove_class("selected");
        assert!(!el.has_attr("class"));
    }

    #[test]
    fn inline_style_edits() {
        let mut el = Element::new(Tag::intern("div"));
        el.set_attr("style", "color: red; left: 4px");
        el.set_inline_style("left", "80px");
        el.set_inline_style("position", "absolute");
        assert_eq!(
            el.attr("style"),
            Some("color: red; left: 80px; position: absolute;")
        );
        assert_eq!(el.inline_style("LEFT").as_deref(), Some("80px"));
        el.remove_inline_style("color");
        el.remove_inline_style("left");
        el.remove_inline_style("position");
        assert!(!el.has_attr("style"));
    }
}

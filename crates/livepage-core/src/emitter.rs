//! Emitter: `Document` → markup text.
//!
//! Output re-parses to the same tree. Attribute values are written in
//! double quotes; text and raw-text content are written verbatim.

use crate::dom::{Document, Element, Node};
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Controls what [`emit_children`] leaves out.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions<'a> {
    /// Elements with these tag names are skipped entirely.
    pub omit_tags: &'a [&'a str],
    /// This class token is removed from every `class` attribute.
    pub strip_class: Option<&'a str>,
}

/// Emit a whole `Document`.
#[must_use]
pub fn emit_document(doc: &Document) -> String {
    emit_children(doc, doc.root, &EmitOptions::default())
}

/// Emit the children of `idx` (its inner markup).
#[must_use]
pub fn emit_children(doc: &Document, idx: NodeIndex, opts: &EmitOptions<'_>) -> String {
    let mut out = String::with_capacity(256);
    for child in doc.children(idx) {
        emit_node(&mut out, doc, child, opts);
    }
    out
}

fn emit_node(out: &mut String, doc: &Document, idx: NodeIndex, opts: &EmitOptions<'_>) {
    match doc.node(idx) {
        Some(Node::Document) | None => {}
        Some(Node::Doctype(text)) => {
            let _ = write!(out, "<!DOCTYPE {text}>");
        }
        Some(Node::Comment(text)) => {
            let _ = write!(out, "<!--{text}-->");
        }
        Some(Node::Text(text)) => out.push_str(text),
        Some(Node::Element(el)) => {
            if opts.omit_tags.iter().any(|t| el.tag.is(t)) {
                return;
            }
            emit_start_tag(out, el, opts.strip_class);
            if el.tag.is_void() {
                return;
            }
            for child in doc.children(idx) {
                emit_node(out, doc, child, opts);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn emit_start_tag(out: &mut String, el: &Element, strip_class: Option<&str>) {
    let _ = write!(out, "<{}", el.tag);
    for attr in &el.attrs {
        if attr.name == "class"
            && let Some(strip) = strip_class
        {
            let kept: Vec<&str> = el.classes().filter(|c| *c != strip).collect();
            if !kept.is_empty() {
                let _ = write!(out, " class=\"{}\"", escape_attr(&kept.join(" ")));
            }
            continue;
        }
        match &attr.value {
            Some(value) => {
                let _ = write!(out, " {}=\"{}\"", attr.name, escape_attr(value));
            }
            None => {
                let _ = write!(out, " {}", attr.name);
            }
        }
    }
    out.push('>');
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

//! Parser for markup text → `Document`.
//!
//! Built on `winnow` 0.7. The parser never fails: like a browser it
//! recovers from anything. Unknown `<` sequences become text, unmatched
//! end tags are dropped, and elements left open at the end of input are
//! closed implicitly.
//!
//! Document wrappers written inside an open document (`html` inside any
//! element, `head` or `body` inside the body) are ignored and their
//! contents spliced in place, as is a late doctype. This is what a browser
//! does when a full page is written into an existing body.

use crate::dom::{Attribute, Document, Element, Node};
use crate::id::Tag;
use petgraph::graph::NodeIndex;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Parse a markup string into a `Document`.
#[must_use]
pub fn parse_document(input: &str) -> Document {
    let mut builder = TreeBuilder::new();
    let mut rest = input;

    while !rest.is_empty() {
        match next_token(&mut rest) {
            Token::Text(text) => builder.text(text),
            Token::Comment(text) => builder.leaf(Node::Comment(text.to_string())),
            Token::Doctype(text) => builder.doctype(text.trim()),
            Token::EndTag(name) => builder.end(Tag::intern(name)),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let tag = Tag::intern(name);
                let opened = builder.start(tag, attrs, self_closing);
                if opened && tag.is_raw_text() {
                    let raw = take_raw_text(&mut rest, tag.as_str());
                    builder.text(raw);
                    builder.end(tag);
                }
            }
        }
    }

    builder.doc
}

// ─── Tokens ──────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Comment(&'a str),
    Doctype(&'a str),
    StartTag {
        name: &'a str,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(&'a str),
}

fn next_token<'a>(input: &mut &'a str) -> Token<'a> {
    if !input.starts_with('<') {
        let text = take_till::<_, _, winnow::error::ContextError>(1.., '<')
            .parse_next(input)
            .unwrap_or_default();
        return Token::Text(text);
    }

    let checkpoint = *input;
    if let Ok(token) = alt((parse_comment, parse_doctype, parse_end_tag, parse_start_tag))
        .parse_next(input)
    {
        return token;
    }

    // A lone `<` that does not open a tag is text.
    *input = checkpoint;
    let (lt, rest) = input.split_at(1);
    *input = rest;
    Token::Text(lt)
}

fn parse_comment<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let _ = "<!--".parse_next(input)?;
    match opt(take_until(0.., "-->")).parse_next(input)? {
        Some(body) => {
            let _ = "-->".parse_next(input)?;
            Ok(Token::Comment(body))
        }
        None => {
            // Unterminated comment runs to the end of input.
            let body = *input;
            *input = "";
            Ok(Token::Comment(body))
        }
    }
}

fn parse_doctype<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let is_doctype = input
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    *input = &input[9..];
    let body = take_till(0.., '>').parse_next(input)?;
    let _ = opt('>').parse_next(input)?;
    Ok(Token::Doctype(body))
}

fn parse_tag_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let first = input.chars().next();
    if !first.is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == ':').parse_next(input)
}

fn parse_end_tag<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let _ = "</".parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let _ = take_till(0.., '>').parse_next(input)?;
    let _ = '>'.parse_next(input)?;
    Ok(Token::EndTag(name))
}

fn parse_start_tag<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let _ = '<'.parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let mut attrs = Vec::new();
    loop {
        let _ = multispace0.parse_next(input)?;
        if input.starts_with("/>") {
            let _ = "/>".parse_next(input)?;
            return Ok(Token::StartTag {
                name,
                attrs,
                self_closing: true,
            });
        }
        if input.starts_with('>') {
            let _ = '>'.parse_next(input)?;
            return Ok(Token::StartTag {
                name,
                attrs,
                self_closing: false,
            });
        }
        if input.starts_with('/') {
            // Stray slash between attributes.
            let _ = '/'.parse_next(input)?;
            continue;
        }
        attrs.push(parse_attribute.parse_next(input)?);
    }
}

fn parse_attribute(input: &mut &str) -> ModalResult<Attribute> {
    let name = take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
    })
    .parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let value = if input.starts_with('=') {
        let _ = '='.parse_next(input)?;
        let _ = multispace0.parse_next(input)?;
        Some(decode_entities(parse_attribute_value.parse_next(input)?))
    } else {
        None
    };
    Ok(Attribute {
        name: name.to_ascii_lowercase(),
        value,
    })
}

/// Decodes the character references the emitter writes into attribute
/// values, plus numeric references. Unknown references stay as written.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let ch = match &rest[1..semi] {
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                name => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name.strip_prefix('#').and_then(|dec| dec.parse().ok()),
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_attribute_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
        take_till(1.., |c: char| c.is_whitespace() || c == '>'),
    ))
    .parse_next(input)
}

/// Consume raw text up to (and including) the end tag `</name`.
/// Matching is case-insensitive. Without an end tag the rest of the input
/// is raw text.
fn take_raw_text<'a>(input: &mut &'a str, name: &str) -> &'a str {
    let needle = format!("</{name}");
    let lower = input.to_ascii_lowercase();
    match lower.find(&needle) {
        Some(pos) => {
            let text = &input[..pos];
            let after = &input[pos..];
            let close = after.find('>').map_or(after.len(), |i| i + 1);
            *input = &after[close..];
            text
        }
        None => {
            let text = *input;
            *input = "";
            text
        }
    }
}

// ─── Tree builder ────────────────────────────────────────────────────────

struct TreeBuilder {
    doc: Document,
    /// Open elements, innermost last. The document node is never on it.
    open: Vec<(Tag, NodeIndex)>,
    /// Ignored nested `html`/`head`/`body` start tags still awaiting their end tag.
    ignored_wrappers: Vec<Tag>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            open: Vec::new(),
            ignored_wrappers: Vec::new(),
        }
    }

    fn current(&self) -> NodeIndex {
        self.open.last().map_or(self.doc.root, |(_, idx)| *idx)
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        // Merge with a preceding text sibling so `a < b` stays one node.
        if let Some(&last) = self.doc.children(parent).last()
            && let Some(Node::Text(existing)) = self.doc.graph.node_weight_mut(last)
        {
            existing.push_str(text);
            return;
        }
        self.doc.append(parent, Node::Text(text.to_string()));
    }

    /// A doctype is only meaningful before the first element.
    fn doctype(&mut self, text: &str) {
        if self.open.is_empty() {
            self.leaf(Node::Doctype(text.to_string()));
        }
    }

    /// `html` anywhere inside an element, `head` once the body is open,
    /// or a second `body`.
    fn is_nested_wrapper(&self, tag: Tag) -> bool {
        let is_open = |name: &str| self.open.iter().any(|(t, _)| t.is(name));
        match tag.as_str() {
            "html" => !self.open.is_empty(),
            "head" => is_open("head") || is_open("body"),
            "body" => is_open("body"),
            _ => false,
        }
    }

    fn leaf(&mut self, node: Node) {
        let parent = self.current();
        self.doc.append(parent, node);
    }

    /// Returns whether an element was opened (raw-text content follows).
    fn start(&mut self, tag: Tag, attrs: Vec<Attribute>, self_closing: bool) -> bool {
        if self.is_nested_wrapper(tag) {
            log::trace!("ignoring nested <{tag}>");
            self.ignored_wrappers.push(tag);
            return false;
        }

        let parent = self.current();
        let idx = self
            .doc
            .append(parent, Node::Element(Element { tag, attrs }));

        if tag.is_void() || (self_closing && !tag.is_raw_text()) {
            return false;
        }
        self.open.push((tag, idx));
        true
    }

    fn end(&mut self, tag: Tag) {
        if let Some(pos) = self.ignored_wrappers.iter().rposition(|t| *t == tag) {
            self.ignored_wrappers.remove(pos);
            return;
        }
        match self.open.iter().rposition(|(t, _)| *t == tag) {
            Some(pos) => self.open.truncate(pos),
            None => log::trace!("dropping unmatched </{tag}>"),
        }
    }
}

//! Style engine: stylesheet parsing, selector matching, and the cascade.
//!
//! Built on `winnow` 0.7. The parser is lenient the way a browser is:
//! comments and at-rules are skipped, malformed rules are dropped, and
//! selectors this engine cannot evaluate (pseudo-classes, attribute
//! selectors) parse but never match.

use crate::color::Color;
use crate::dom::{Document, Element};
use crate::id::Tag;
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use winnow::ascii::multispace0;
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

// ─── Declarations ────────────────────────────────────────────────────────

/// One `property: value` pair. Property names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_ascii_lowercase(),
            value: value.trim().to_string(),
            important: false,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.important {
            write!(f, "{}: {} !important;", self.property, self.value)
        } else {
            write!(f, "{}: {};", self.property, self.value)
        }
    }
}

/// Parse a declaration block body (`a: b; c: d`), as found in a rule or a
/// `style` attribute. Semicolons inside quotes or parentheses (data URLs)
/// do not split declarations.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    split_top_level(body, ';')
        .into_iter()
        .filter_map(|piece| {
            let mut rest = piece;
            let name = parse_property_name.parse_next(&mut rest).ok()?;
            let mut value = rest.trim();
            if value.is_empty() {
                return None;
            }
            let mut important = false;
            if let Some(pos) = value.to_ascii_lowercase().rfind("!important") {
                important = true;
                value = value[..pos].trim_end();
            }
            Some(Declaration {
                property: name.to_ascii_lowercase(),
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn parse_property_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let _ = multispace0.parse_next(input)?;
    let name = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    })
    .parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let _ = ':'.parse_next(input)?;
    Ok(name)
}

/// Split on `sep` outside quotes and parentheses.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) if c == sep && depth == 0 => {
                out.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&input[start..]);
    out.retain(|s| !s.trim().is_empty());
    out
}

// ─── Selectors ───────────────────────────────────────────────────────────

/// How a compound selector relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// `tag#id.class.class`; every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<Tag>,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
    /// False when the compound uses syntax this engine cannot evaluate.
    pub supported: bool,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        self.supported
            && self.tag.is_none_or(|t| t == el.tag)
            && self.id.as_deref().is_none_or(|id| el.id() == Some(id))
            && self.classes.iter().all(|c| el.has_class(c))
    }
}

/// A complex selector: compounds joined by combinators, leftmost first.
/// The combinator stored with the first compound is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub parts: Vec<(Combinator, Compound)>,
}

/// `(ids, classes, types)`.
pub type Specificity = (u32, u32, u32);

impl Selector {
    pub fn specificity(&self) -> Specificity {
        self.parts.iter().fold((0, 0, 0), |(a, b, c), (_, comp)| {
            (
                a + u32::from(comp.id.is_some()),
                b + comp.classes.len() as u32,
                c + u32::from(comp.tag.is_some()),
            )
        })
    }

    pub fn matches(&self, doc: &Document, idx: NodeIndex) -> bool {
        !self.parts.is_empty() && self.matches_at(doc, idx, self.parts.len() - 1)
    }

    fn matches_at(&self, doc: &Document, idx: NodeIndex, pos: usize) -> bool {
        let Some(el) = doc.element(idx) else {
            return false;
        };
        let (combinator, compound) = &self.parts[pos];
        if !compound.matches(el) {
            return false;
        }
        if pos == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent(idx)
                .is_some_and(|p| self.matches_at(doc, p, pos - 1)),
            Combinator::Descendant => {
                let mut cursor = doc.parent(idx);
                while let Some(ancestor) = cursor {
                    if self.matches_at(doc, ancestor, pos - 1) {
                        return true;
                    }
                    cursor = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

fn parse_ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || c == '-' || c == '_'
    })
    .parse_next(input)
}

fn parse_compound(input: &mut &str) -> ModalResult<Compound> {
    let mut compound = Compound {
        supported: true,
        ..Compound::default()
    };
    let start = input.len();
    loop {
        if input.starts_with('*') {
            let _ = '*'.parse_next(input)?;
        } else if input.starts_with('#') {
            let _ = '#'.parse_next(input)?;
            compound.id = Some(parse_ident.parse_next(input)?.to_string());
        } else if input.starts_with('.') {
            let _ = '.'.parse_next(input)?;
            compound.classes.push(parse_ident.parse_next(input)?.to_string());
        } else if input.starts_with(':') || input.starts_with('[') {
            compound.supported = false;
            let _ = take_till(0.., |c: char| c.is_whitespace() || c == '>').parse_next(input)?;
        } else if let Some(tag) = opt(parse_ident).parse_next(input)? {
            compound.tag = Some(Tag::intern(tag));
        } else {
            break;
        }
    }
    if input.len() == start {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    Ok(compound)
}

/// Parse one complex selector. `None` if it is not a selector at all.
pub fn parse_selector(text: &str) -> Option<Selector> {
    let mut rest = text.trim();
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    while !rest.is_empty() {
        let compound = parse_compound.parse_next(&mut rest).ok()?;
        parts.push((combinator, compound));
        rest = rest.trim_start();
        combinator = match rest.strip_prefix('>') {
            Some(after) => {
                rest = after.trim_start();
                Combinator::Child
            }
            None => Combinator::Descendant,
        };
        // `+` and `~` are not evaluated
        if rest.starts_with('+') || rest.starts_with('~') {
            return None;
        }
    }
    (!parts.is_empty()).then_some(Selector { parts })
}

// ─── Stylesheets ─────────────────────────────────────────────────────────

/// A style rule with its position in the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
    pub order: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Append the rules of another sheet, after this sheet's rules.
    pub fn extend(&mut self, other: Stylesheet) {
        for mut rule in other.rules {
            rule.order = self.rules.len();
            self.rules.push(rule);
        }
    }
}

/// Parse a stylesheet. Never fails; unparseable input yields fewer rules.
pub fn parse_stylesheet(input: &str) -> Stylesheet {
    let source = strip_comments(input);
    let mut rest = source.as_str();
    let mut sheet = Stylesheet::default();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if rest.starts_with('@') {
            skip_at_rule(&mut rest);
            continue;
        }
        let Ok((prelude, body)) = parse_rule.parse_next(&mut rest) else {
            break;
        };
        let selectors: Vec<Selector> = split_top_level(prelude, ',')
            .into_iter()
            .filter_map(parse_selector)
            .collect();
        if selectors.is_empty() {
            log::trace!("dropping rule with unparseable selector {prelude:?}");
            continue;
        }
        let order = sheet.rules.len();
        sheet.rules.push(Rule {
            selectors,
            declarations: parse_declarations(body),
            order,
        });
    }

    sheet
}

fn parse_rule<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let prelude = take_till(1.., '{').parse_next(input)?;
    let _ = '{'.parse_next(input)?;
    let body = take_till(0.., '}').parse_next(input)?;
    let _ = opt('}').parse_next(input)?;
    Ok((prelude, body))
}

/// Skip `@import ...;` or a whole `@media ... { ... }` block.
fn skip_at_rule(input: &mut &str) {
    let semi = input.find(';');
    let brace = input.find('{');
    match (semi, brace) {
        (Some(s), Some(b)) if s < b => *input = &input[s + 1..],
        (Some(s), None) => *input = &input[s + 1..],
        (_, Some(b)) => {
            let mut depth = 0usize;
            for (i, c) in input[b..].char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            *input = &input[b + i + 1..];
                            return;
                        }
                    }
                    _ => {}
                }
            }
            *input = "";
        }
        (None, None) => *input = "",
    }
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

// ─── Cascade ─────────────────────────────────────────────────────────────

/// `display` as far as layout cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

/// The cascaded (specified) values of one element. Longhands of the
/// `background`, `margin` and `padding` shorthands are filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    props: HashMap<String, String>,
}

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.props.get(property).map(String::as_str)
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.props
            .insert(property.to_ascii_lowercase(), value.trim().to_string());
    }

    /// A length in px; percentages resolve against `basis`.
    pub fn length(&self, property: &str, basis: f64) -> Option<f64> {
        parse_length(self.get(property)?, basis)
    }

    pub fn display(&self, tag: Tag) -> Display {
        match self.get("display") {
            Some("none") => Display::None,
            Some("inline") => Display::Inline,
            Some("inline-block" | "inline-flex" | "inline-grid") => Display::Inline,
            Some(_) => Display::Block,
            None => default_display(tag),
        }
    }

    pub fn position(&self) -> Position {
        match self.get("position") {
            Some("relative") => Position::Relative,
            Some("absolute") => Position::Absolute,
            Some("fixed") => Position::Fixed,
            _ => Position::Static,
        }
    }

    /// Resolved background color; transparent when unset or unparseable.
    pub fn background_color(&self) -> Color {
        self.get("background-color")
            .and_then(Color::parse)
            .unwrap_or(Color::TRANSPARENT)
    }

    fn apply(&mut self, decl: &Declaration) {
        match decl.property.as_str() {
            "background" => {
                let color = split_top_level(&decl.value, ' ')
                    .into_iter()
                    .find(|token| Color::parse(token).is_some())
                    .unwrap_or("transparent");
                self.set("background-color", color);
            }
            "margin" | "padding" => {
                let values: Vec<&str> = decl.value.split_ascii_whitespace().collect();
                let (top, right, bottom, left) = match values.as_slice() {
                    [a] => (*a, *a, *a, *a),
                    [a, b] => (*a, *b, *a, *b),
                    [a, b, c] => (*a, *b, *c, *b),
                    [a, b, c, d, ..] => (*a, *b, *c, *d),
                    [] => return,
                };
                let p = &decl.property;
                self.set(&format!("{p}-top"), top);
                self.set(&format!("{p}-right"), right);
                self.set(&format!("{p}-bottom"), bottom);
                self.set(&format!("{p}-left"), left);
            }
            _ => {}
        }
        self.set(&decl.property, &decl.value);
    }
}

/// Display of an element with no `display` declaration.
pub fn default_display(tag: Tag) -> Display {
    match tag.as_str() {
        "head" | "script" | "style" | "title" | "meta" | "link" | "template" | "base" => {
            Display::None
        }
        "html" | "body" | "div" | "p" | "section" | "header" | "footer" | "main" | "nav"
        | "article" | "aside" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li"
        | "form" | "table" | "tr" | "figure" | "figcaption" | "blockquote" | "pre" | "hr"
        | "fieldset" | "details" | "summary" | "dl" | "dt" | "dd" | "address" => Display::Block,
        _ => Display::Inline,
    }
}

/// Built-in defaults applied before author styles.
fn user_agent_defaults(tag: Tag, style: &mut ComputedStyle) {
    if tag.is("body") {
        style.apply(&Declaration::new("margin", "8px"));
    }
}

/// Parse a CSS length the way `parseFloat` reads a leading number:
/// `12px`, `12`, `12.5px`. Percentages resolve against `basis`.
/// `auto` and other keywords yield `None`.
pub fn parse_length(value: &str, basis: f64) -> Option<f64> {
    let value = value.trim();
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(|p| p * basis / 100.0);
    }
    parse_px(value)
}

/// Leading numeric prefix of a value, ignoring the unit.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse::<f64>().ok()
}

/// Compute the cascaded style of the element at `idx`.
///
/// Declarations are ordered by importance, then origin (inline beats
/// rules), then specificity, then source order; later wins.
pub fn compute_style(doc: &Document, sheet: &Stylesheet, idx: NodeIndex) -> ComputedStyle {
    let mut style = ComputedStyle::default();
    let Some(el) = doc.element(idx) else {
        return style;
    };
    user_agent_defaults(el.tag, &mut style);

    type Key = (bool, bool, Specificity, usize, usize);
    let inline = el.inline_declarations();
    let mut candidates: Vec<(Key, &Declaration)> = Vec::new();

    for rule in &sheet.rules {
        let best = rule
            .selectors
            .iter()
            .filter(|s| s.matches(doc, idx))
            .map(Selector::specificity)
            .max();
        if let Some(specificity) = best {
            for (i, decl) in rule.declarations.iter().enumerate() {
                candidates.push(((decl.important, false, specificity, rule.order, i), decl));
            }
        }
    }

    for (i, decl) in inline.iter().enumerate() {
        candidates.push(((decl.important, true, (0, 0, 0), 0, i), decl));
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    for (_, decl) in candidates {
        style.apply(decl);
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn declarations_split_outside_urls() {
        let decls = parse_declarations(
            "background: url('data:image/svg+xml;utf8,<svg/>'); color: RED !important",
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "background");
        assert!(decls[0].value.contains("utf8"));
        assert_eq!(decls[1].value, "RED");
        assert!(decls[1].important);
    }

    #[test]
    fn stylesheet_skips_comments_and_at_rules() {
        let sheet = parse_stylesheet(
            "/* hi */ @import url(x.css); @media (max-width: 10px) { .a { color: red } } .b, p > span { color: blue; }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
    }

    #[test]
    fn specificity_counts() {
        let s = parse_selector("div#main .card.wide").unwrap();
        assert_eq!(s.specificity(), (1, 2, 1));
        assert!(parse_selector("a + b").is_none());
    }

    #[test]
    fn cascade_orders_by_specificity_then_inline() {
        let doc = parse_document(
            r#"<html><body><div id="box" class="card" style="width: 50px">x</div></body></html>"#,
        );
        let sheet = parse_stylesheet(
            "#box { background: #ff0000; width: 10px } .card { background-color: blue; width: 20px }",
        );
        let idx = doc.find_id("box").unwrap();
        let style = compute_style(&doc, &sheet, idx);
        assert_eq!(style.background_color().to_hex(), "#ff0000");
        assert_eq!(style.length("width", 0.0), Some(50.0));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let doc = parse_document(
            r#"<html><body><section><div><span id="s">x</span></div></section></body></html>"#,
        );
        let idx = doc.find_id("s").unwrap();
        assert!(parse_selector("section span").unwrap().matches(&doc, idx));
        assert!(!parse_selector("section > span").unwrap().matches(&doc, idx));
        assert!(parse_selector("div > span#s").unwrap().matches(&doc, idx));
        assert!(!parse_selector("span:hover").unwrap().matches(&doc, idx));
    }

    #[test]
    fn margin_shorthand_expands() {
        let mut style = ComputedStyle::default();
        style.apply(&Declaration::new("margin", "1px 2px 3px"));
        assert_eq!(style.get("margin-left"), Some("2px"));
        assert_eq!(style.get("margin-bottom"), Some("3px"));
    }

    #[test]
    fn lengths_read_like_parse_float() {
        assert_eq!(parse_px("80px"), Some(80.0));
        assert_eq!(parse_px("-12.5px"), Some(-12.5));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_length("50%", 200.0), Some(100.0));
    }
}

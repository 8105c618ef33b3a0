//! Box layout.
//!
//! A small flow engine: block boxes stack vertically, inline content
//! (text, images and other inline elements) fills lines left to right and
//! wraps at the container edge. Inline elements are laid out as atomic
//! inline boxes. Text has a fixed advance of [`CHAR_ADVANCE`] per
//! character and a line height of [`LINE_HEIGHT`].
//!
//! `position: relative` shifts a box without affecting flow. Absolute and
//! fixed boxes are taken out of flow and placed against the padding box of
//! the nearest positioned ancestor (absolute) or the viewport (fixed). Only
//! `left`/`top` offsets are honored; when unset the box stays at its static
//! position.

use crate::css::{ComputedStyle, Display, Position, Stylesheet, compute_style};
use crate::dom::{Document, Element, Node};
use kurbo::{Point, Rect, Size};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Horizontal advance of one text character, in px.
pub const CHAR_ADVANCE: f64 = 8.0;
/// Height of one line of text, in px.
pub const LINE_HEIGHT: f64 = 18.0;

/// The surface (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Resolved geometry of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    /// Outer edge of the padding (there are no borders in this engine).
    pub border: Rect,
    /// Content box, inside the padding.
    pub content: Rect,
}

/// Result of laying out a document.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub boxes: HashMap<NodeIndex, LayoutBox>,
    /// Extent of everything laid out: the scroll size of the document.
    pub content: Size,
}

impl Layout {
    pub fn border_box(&self, idx: NodeIndex) -> Option<Rect> {
        self.boxes.get(&idx).map(|b| b.border)
    }

    pub fn content_box(&self, idx: NodeIndex) -> Option<Rect> {
        self.boxes.get(&idx).map(|b| b.content)
    }
}

/// Lay out every rendered element of `doc`.
pub fn resolve_layout(doc: &Document, sheet: &Stylesheet, viewport: Viewport) -> Layout {
    let mut engine = Engine {
        doc,
        sheet,
        viewport,
        layout: Layout::default(),
    };
    let initial = ContainingBlock {
        origin: Point::ZERO,
        width: viewport.width,
    };
    let flow = engine.layout_flow(doc.root, Point::ZERO, viewport.width, initial);

    let mut extent = Size::new(flow.max_width, flow.height);
    for b in engine.layout.boxes.values() {
        extent.width = extent.width.max(b.border.x1);
        extent.height = extent.height.max(b.border.y1);
    }
    engine.layout.content = extent;
    engine.layout
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Where absolutely positioned descendants are placed from.
#[derive(Debug, Clone, Copy)]
struct ContainingBlock {
    origin: Point,
    width: f64,
}

/// What a flow of children consumed.
#[derive(Debug, Clone, Copy, Default)]
struct Flow {
    height: f64,
    max_width: f64,
}

/// The line currently being filled, relative to the flow origin.
#[derive(Debug, Default)]
struct Line {
    x: f64,
    height: f64,
    pending_space: bool,
}

/// Edge lengths: top, right, bottom, left.
#[derive(Debug, Clone, Copy, Default)]
struct Edges {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Edges {
    fn of(style: &ComputedStyle, prefix: &str, basis: f64) -> Self {
        let side = |s: &str| style.length(&format!("{prefix}-{s}"), basis).unwrap_or(0.0);
        Self {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }

    fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

struct Engine<'a> {
    doc: &'a Document,
    sheet: &'a Stylesheet,
    viewport: Viewport,
    layout: Layout,
}

impl Engine<'_> {
    /// Lay out the children of `parent` into a flow starting at `origin`
    /// with the given available width.
    fn layout_flow(
        &mut self,
        parent: NodeIndex,
        origin: Point,
        width: f64,
        cb: ContainingBlock,
    ) -> Flow {
        let doc = self.doc;
        let mut flow = Flow::default();
        let mut line = Line::default();

        for child in doc.children(parent) {
            match doc.node(child) {
                Some(Node::Text(text)) => {
                    self.layout_text(text, width, &mut line, &mut flow);
                }
                Some(Node::Element(el)) => {
                    let style = compute_style(doc, self.sheet, child);
                    let display = style.display(el.tag);
                    if display == Display::None {
                        continue;
                    }
                    match style.position() {
                        Position::Absolute | Position::Fixed => {
                            let static_pos =
                                Point::new(origin.x + line.x, origin.y + flow.height);
                            self.layout_out_of_flow(child, el, &style, static_pos, cb);
                        }
                        Position::Static | Position::Relative if display == Display::Block => {
                            finish_line(&mut line, &mut flow);
                            let top_left = Point::new(origin.x, origin.y + flow.height);
                            let outer = self.layout_block(child, &style, top_left, width, cb);
                            flow.height += outer.height;
                            flow.max_width = flow.max_width.max(outer.width);
                        }
                        Position::Static | Position::Relative => {
                            let outer = self.measure_inline(child, el, &style, width, cb);
                            let at = place_atom(&mut line, &mut flow, outer, width);
                            let top_left = Point::new(origin.x + at.x, origin.y + at.y);
                            self.layout_inline(child, el, &style, top_left, width, cb);
                        }
                    }
                }
                _ => {}
            }
        }

        finish_line(&mut line, &mut flow);
        flow
    }

    fn layout_text(&self, text: &str, width: f64, line: &mut Line, flow: &mut Flow) {
        if text.starts_with(char::is_whitespace) {
            line.pending_space = true;
        }
        for word in text.split_whitespace() {
            let advance = word.chars().count() as f64 * CHAR_ADVANCE;
            let space = if line.pending_space && line.x > 0.0 {
                CHAR_ADVANCE
            } else {
                0.0
            };
            if line.x > 0.0 && line.x + space + advance > width {
                finish_line(line, flow);
                line.x = advance;
            } else {
                line.x += space + advance;
            }
            line.height = line.height.max(LINE_HEIGHT);
            flow.max_width = flow.max_width.max(line.x);
            line.pending_space = true;
        }
        if !text.ends_with(char::is_whitespace) {
            line.pending_space = false;
        }
    }

    /// Lay out a block-level box; returns its margin-box size.
    fn layout_block(
        &mut self,
        idx: NodeIndex,
        style: &ComputedStyle,
        top_left: Point,
        available: f64,
        cb: ContainingBlock,
    ) -> Size {
        let margin = Edges::of(style, "margin", available);
        let padding = Edges::of(style, "padding", available);
        let content_width = style
            .length("width", available)
            .unwrap_or(available - margin.horizontal() - padding.horizontal())
            .max(0.0);

        let offset = relative_offset(style, cb.width);
        let border_origin = Point::new(top_left.x + margin.left, top_left.y + margin.top) + offset;
        let content_origin =
            Point::new(border_origin.x + padding.left, border_origin.y + padding.top);

        let child_cb = if style.position() == Position::Static {
            cb
        } else {
            ContainingBlock {
                origin: border_origin,
                width: content_width + padding.horizontal(),
            }
        };
        let inner = self.layout_flow(idx, content_origin, content_width, child_cb);
        let content_height = style
            .length("height", self.viewport.height)
            .unwrap_or(inner.height)
            .max(0.0);

        self.record(idx, content_origin, Size::new(content_width, content_height), padding);
        Size::new(
            margin.horizontal() + padding.horizontal() + content_width,
            margin.vertical() + padding.vertical() + content_height,
        )
    }

    /// Size of an inline element's margin box without recording anything.
    fn measure_inline(
        &mut self,
        idx: NodeIndex,
        el: &Element,
        style: &ComputedStyle,
        available: f64,
        cb: ContainingBlock,
    ) -> Size {
        let margin = Edges::of(style, "margin", available);
        let padding = Edges::of(style, "padding", available);
        let content = self.inline_content_size(idx, el, style, available, cb);
        Size::new(
            margin.horizontal() + padding.horizontal() + content.width,
            margin.vertical() + padding.vertical() + content.height,
        )
    }

    fn layout_inline(
        &mut self,
        idx: NodeIndex,
        el: &Element,
        style: &ComputedStyle,
        top_left: Point,
        available: f64,
        cb: ContainingBlock,
    ) {
        let margin = Edges::of(style, "margin", available);
        let padding = Edges::of(style, "padding", available);
        let content = self.inline_content_size(idx, el, style, available, cb);

        let offset = relative_offset(style, cb.width);
        let border_origin = Point::new(top_left.x + margin.left, top_left.y + margin.top) + offset;
        let content_origin =
            Point::new(border_origin.x + padding.left, border_origin.y + padding.top);
        let child_cb = if style.position() == Position::Static {
            cb
        } else {
            ContainingBlock {
                origin: border_origin,
                width: content.width + padding.horizontal(),
            }
        };
        if !el.tag.is_void() {
            self.layout_flow(idx, content_origin, content.width, child_cb);
        }
        self.record(idx, content_origin, content, padding);
    }

    /// Content size of an atomic inline box: explicit size, replaced
    /// element size, or shrink-to-fit content.
    fn inline_content_size(
        &mut self,
        idx: NodeIndex,
        el: &Element,
        style: &ComputedStyle,
        available: f64,
        cb: ContainingBlock,
    ) -> Size {
        let explicit_w = style.length("width", available);
        let explicit_h = style.length("height", self.viewport.height);
        let intrinsic = intrinsic_size(el);

        let (width, height) = match (explicit_w.or(intrinsic.map(|s| s.width)), intrinsic) {
            (Some(w), Some(i)) => (w, explicit_h.unwrap_or(i.height)),
            (Some(w), None) => {
                let inner = self.measure_flow(idx, w, cb);
                (w, explicit_h.unwrap_or(inner.height))
            }
            (None, _) => {
                let inner = self.measure_flow(idx, available, cb);
                (inner.max_width, explicit_h.unwrap_or(inner.height))
            }
        };
        Size::new(width.max(0.0), height.max(0.0))
    }

    /// Run a flow without keeping the boxes it produced.
    fn measure_flow(&mut self, idx: NodeIndex, width: f64, cb: ContainingBlock) -> Flow {
        let saved = self.layout.boxes.clone();
        let flow = self.layout_flow(idx, Point::ZERO, width, cb);
        self.layout.boxes = saved;
        flow
    }

    fn layout_out_of_flow(
        &mut self,
        idx: NodeIndex,
        el: &Element,
        style: &ComputedStyle,
        static_pos: Point,
        cb: ContainingBlock,
    ) {
        let cb = if style.position() == Position::Fixed {
            ContainingBlock {
                origin: Point::ZERO,
                width: self.viewport.width,
            }
        } else {
            cb
        };
        let margin = Edges::of(style, "margin", cb.width);
        let padding = Edges::of(style, "padding", cb.width);

        let x = style
            .length("left", cb.width)
            .map_or(static_pos.x, |left| cb.origin.x + left);
        let y = style
            .length("top", self.viewport.height)
            .map_or(static_pos.y, |top| cb.origin.y + top);

        let available = (cb.width - margin.horizontal() - padding.horizontal()).max(0.0);
        let content = if el.tag.is_void() || style.get("width").is_some() {
            self.inline_content_size(idx, el, style, available, cb)
        } else {
            let inner = self.measure_flow(idx, available, cb);
            let height = style
                .length("height", self.viewport.height)
                .unwrap_or(inner.height);
            Size::new(inner.max_width, height)
        };

        let border_origin = Point::new(x + margin.left, y + margin.top);
        let content_origin =
            Point::new(border_origin.x + padding.left, border_origin.y + padding.top);
        if !el.tag.is_void() {
            let child_cb = ContainingBlock {
                origin: border_origin,
                width: content.width + padding.horizontal(),
            };
            self.layout_flow(idx, content_origin, content.width, child_cb);
        }
        self.record(idx, content_origin, content, padding);
    }

    fn record(&mut self, idx: NodeIndex, content_origin: Point, size: Size, padding: Edges) {
        let content = Rect::from_origin_size(content_origin, size);
        let border = Rect::new(
            content.x0 - padding.left,
            content.y0 - padding.top,
            content.x1 + padding.right,
            content.y1 + padding.bottom,
        );
        self.layout.boxes.insert(idx, LayoutBox { border, content });
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn finish_line(line: &mut Line, flow: &mut Flow) {
    if line.x > 0.0 || line.height > 0.0 {
        flow.height += line.height;
    }
    line.x = 0.0;
    line.height = 0.0;
    line.pending_space = false;
}

/// Place an atomic box on the current line, wrapping first if it does not
/// fit. Returns the box's top-left relative to the flow origin.
fn place_atom(line: &mut Line, flow: &mut Flow, size: Size, width: f64) -> Point {
    let space = if line.pending_space && line.x > 0.0 {
        CHAR_ADVANCE
    } else {
        0.0
    };
    if line.x > 0.0 && line.x + space + size.width > width {
        finish_line(line, flow);
    }
    let x = if line.x > 0.0 { line.x + space } else { 0.0 };
    let at = Point::new(x, flow.height);
    line.x = x + size.width;
    line.height = line.height.max(size.height);
    line.pending_space = false;
    flow.max_width = flow.max_width.max(line.x);
    at
}

fn relative_offset(style: &ComputedStyle, basis: f64) -> kurbo::Vec2 {
    if style.position() != Position::Relative {
        return kurbo::Vec2::ZERO;
    }
    kurbo::Vec2::new(
        style.length("left", basis).unwrap_or(0.0),
        style.length("top", basis).unwrap_or(0.0),
    )
}

/// Size of replaced and form elements when no `width` is given.
fn intrinsic_size(el: &Element) -> Option<Size> {
    let attr_px = |name: &str| el.attr(name).and_then(crate::css::parse_px);
    match el.tag.as_str() {
        "img" | "video" | "canvas" | "iframe" => Some(Size::new(
            attr_px("width").unwrap_or(0.0),
            attr_px("height").unwrap_or(0.0),
        )),
        "input" | "select" => Some(Size::new(160.0, 22.0)),
        "textarea" => Some(Size::new(160.0, 2.0 * LINE_HEIGHT)),
        _ => None,
    }
}

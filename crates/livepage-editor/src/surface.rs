//! Rendering surface adapter.
//!
//! Owns the canvas document: the element tree built from the current
//! html/css/js triple, its stylesheet and its layout. The document is
//! replaced wholesale by [`SurfaceAdapter::load`] (async, with a dwell and a
//! settle phase) or [`SurfaceAdapter::restore`] (immediate), and edited in
//! place through [`CanvasMutation`]s.
//!
//! Every replacement is a new document generation; [`ElementRef`]s taken
//! from an earlier generation no longer resolve.

use crate::config::LoadConfig;
use crate::error::EditorResult;
use crate::sync::{CHROME_ATTR, CanvasMutation, SourceBundle, apply_mutation};
use crate::transform::SurfaceTransform;
use kurbo::{Point, Size};
use livepage_core::css::ComputedStyle;
use livepage_core::layout::{Layout, LayoutBox};
use livepage_core::{
    Document, ElementRef, Stylesheet, Viewport, compute_style, hit_test, parse_document,
    parse_stylesheet, resolve_layout,
};
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::watch;

/// Text of the loading indicator.
pub const LOADING_TEXT: &str = "Loading canvas...";

/// Selection-highlight style injected ahead of any caller style.
const CHROME_STYLE: &str = "* { user-select: none; transition: all 0.2s ease-in-out; } \
.selected { outline: 2px solid #3b82f6; box-shadow: 0 0 0 2px rgba(59, 130, 246, 0.5); }";

/// Wrap the three fragments into one self-contained document.
///
/// The chrome style always comes first so caller styles can override it.
/// Empty fragments are left out; empty markup gives an empty body.
pub fn assemble_document(bundle: &SourceBundle) -> String {
    let mut out = String::with_capacity(
        bundle.html.len() + bundle.css.len() + bundle.js.len() + CHROME_STYLE.len() + 160,
    );
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<title>Generated Design</title>\n");
    let _ = writeln!(out, "<style {CHROME_ATTR}>{CHROME_STYLE}</style>");
    if !bundle.css.is_empty() {
        let _ = writeln!(out, "<style>{}</style>", bundle.css);
    }
    out.push_str("</head>\n<body>");
    out.push_str(&bundle.html);
    if !bundle.js.is_empty() {
        let _ = write!(out, "<script>{}</script>", bundle.js);
    }
    out.push_str("</body>\n</html>");
    out
}

// ─── Loading ─────────────────────────────────────────────────────────────

/// Where an in-flight load is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    /// Loading indicator shown; the old document is still in place.
    Dwell,
    /// New document swapped in; waiting for layout before measuring.
    Settle,
}

/// How a load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Swapped, settled and measured.
    Ready,
    /// Cancelled during `Dwell` (nothing changed) or `Settle` (document
    /// swapped but not measured).
    Cancelled(LoadPhase),
}

/// Cancels whatever load is in flight on the surface it came from.
#[derive(Debug, Clone)]
pub struct LoadCanceller(Arc<watch::Sender<u64>>);

impl LoadCanceller {
    pub fn cancel(&self) {
        self.0.send_modify(|n| *n = n.wrapping_add(1));
    }
}

// ─── Surface ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SurfaceAdapter {
    doc: Document,
    sheet: Stylesheet,
    layout: Layout,
    /// Logical size the document is laid out in.
    frame: Size,
    /// Visible size of the workspace.
    container: Size,
    /// Measured surface size: never smaller than the frame.
    size: Size,
    background: String,
    cursor: &'static str,
    transform: Option<SurfaceTransform>,
    phase: LoadPhase,
    timings: LoadConfig,
    cancel: Arc<watch::Sender<u64>>,
}

impl SurfaceAdapter {
    pub fn new(timings: LoadConfig, container: Size) -> Self {
        let (tx, _) = watch::channel(0);
        let mut surface = Self {
            doc: Document::new(),
            sheet: Stylesheet::default(),
            layout: Layout::default(),
            frame: container,
            container,
            size: container,
            background: "none".to_string(),
            cursor: "default",
            transform: None,
            phase: LoadPhase::Idle,
            timings,
            cancel: Arc::new(tx),
        };
        surface.replace(&SourceBundle::default());
        surface.measure();
        surface
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn generation(&self) -> u64 {
        self.doc.generation()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != LoadPhase::Idle
    }

    /// Loading indicator text while a load is in flight.
    pub fn loading_text(&self) -> Option<&'static str> {
        self.is_loading().then_some(LOADING_TEXT)
    }

    /// Handle for cancelling loads; take it before starting one.
    pub fn cancel_handle(&self) -> LoadCanceller {
        LoadCanceller(Arc::clone(&self.cancel))
    }

    /// Replace the document with `bundle`, showing the loading state for
    /// the dwell time first and measuring after the settle time.
    pub async fn load(&mut self, bundle: &SourceBundle) -> LoadOutcome {
        let mut cancelled = self.cancel.subscribe();

        self.phase = LoadPhase::Dwell;
        log::debug!("load: dwell {}ms", self.timings.dwell_ms);
        tokio::select! {
            _ = tokio::time::sleep(self.timings.dwell()) => {}
            _ = cancelled.changed() => {
                log::debug!("load cancelled during dwell");
                self.phase = LoadPhase::Idle;
                return LoadOutcome::Cancelled(LoadPhase::Dwell);
            }
        }

        self.replace(bundle);
        self.phase = LoadPhase::Settle;
        log::debug!(
            "load: swapped in generation {}, settle {}ms",
            self.doc.generation(),
            self.timings.settle_ms
        );
        tokio::select! {
            _ = tokio::time::sleep(self.timings.settle()) => {}
            _ = cancelled.changed() => {
                log::debug!("load cancelled during settle");
                self.phase = LoadPhase::Idle;
                return LoadOutcome::Cancelled(LoadPhase::Settle);
            }
        }

        self.measure();
        self.phase = LoadPhase::Idle;
        LoadOutcome::Ready
    }

    /// Replace the document immediately and measure. Used for history
    /// entries, which were valid content when recorded.
    pub fn restore(&mut self, bundle: &SourceBundle) {
        self.replace(bundle);
        self.measure();
        log::debug!("restored generation {}", self.doc.generation());
    }

    fn replace(&mut self, bundle: &SourceBundle) {
        self.doc = parse_document(&assemble_document(bundle));
        self.rebuild_stylesheet();
        self.relayout();
    }

    fn rebuild_stylesheet(&mut self) {
        let mut sheet = Stylesheet::default();
        for idx in self.doc.descendants(self.doc.root) {
            if self.doc.element(idx).is_some_and(|el| el.tag.is("style")) {
                sheet.extend(parse_stylesheet(&self.doc.text_content(idx)));
            }
        }
        self.sheet = sheet;
    }

    /// Lay the document out again in the current frame.
    pub fn relayout(&mut self) {
        let viewport = Viewport {
            width: self.frame.width,
            height: self.frame.height,
        };
        self.layout = resolve_layout(&self.doc, &self.sheet, viewport);
    }

    /// Size the surface to the larger of its content and its frame.
    fn measure(&mut self) {
        let content = self.layout.content;
        self.size = Size::new(
            content.width.max(self.frame.width),
            content.height.max(self.frame.height),
        );
        log::debug!("surface measured {}x{}", self.size.width, self.size.height);
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Measured surface size.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn frame(&self) -> Size {
        self.frame
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    /// Set the logical surface size (viewport emulation) and lay out again.
    /// The surface takes the frame size exactly; the next load or restore
    /// measures it against its content again.
    pub fn set_frame(&mut self, frame: Size) {
        self.frame = frame;
        self.size = frame;
        self.relayout();
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Element under a content-space point; `None` over the background.
    pub fn hit_test(&self, point: Point) -> Option<ElementRef> {
        hit_test(&self.doc, &self.layout, point).and_then(|idx| self.doc.element_ref(idx))
    }

    pub fn computed_style(&self, target: ElementRef) -> Option<ComputedStyle> {
        let idx = self.doc.resolve(target)?;
        Some(compute_style(&self.doc, &self.sheet, idx))
    }

    pub fn bounds(&self, target: ElementRef) -> Option<LayoutBox> {
        let idx = self.doc.resolve(target)?;
        self.layout.boxes.get(&idx).copied()
    }

    /// Inline style property of an element.
    pub fn inline_style(&self, target: ElementRef, property: &str) -> Option<String> {
        self.doc.get(target)?.inline_style(property)
    }

    pub fn is_current(&self, target: ElementRef) -> bool {
        self.doc.resolve(target).is_some()
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Apply a mutation and lay out again.
    pub fn apply(&mut self, mutation: &CanvasMutation) -> EditorResult<()> {
        apply_mutation(&mut self.doc, mutation)?;
        self.relayout();
        Ok(())
    }

    // ─── Presentation ────────────────────────────────────────────────────

    /// Surface `background` (the grid overlay).
    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background(&mut self, background: String) {
        self.background = background;
    }

    pub fn cursor(&self) -> &'static str {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: &'static str) {
        self.cursor = cursor;
    }

    /// Last visual transform pushed on an animation frame.
    pub fn transform(&self) -> Option<SurfaceTransform> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: SurfaceTransform) {
        self.transform = Some(transform);
    }
}

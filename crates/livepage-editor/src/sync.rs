//! Code sync: live canvas document → html/css/js text.
//!
//! Canvas manipulations are expressed as [`CanvasMutation`]s applied to the
//! document in place. After every mutation that changes serialized
//! content, [`CodeSync::sync`] re-serializes the document into a
//! [`SourceBundle`] and hands it to the persistence collaborator.
//!
//! Serialization never includes editor chrome: the injected highlight
//! style (marked `data-editor-chrome`) and the `selected` marker class are
//! stripped, so a load followed by a sync with no edits gives back the
//! text that was loaded, modulo markup normalization.

use crate::error::{EditorError, EditorResult};
use livepage_core::emitter::{EmitOptions, emit_children};
use livepage_core::{Document, ElementRef, NodeIndex};
use serde::{Deserialize, Serialize};

/// Attribute that marks editor-injected elements.
pub const CHROME_ATTR: &str = "data-editor-chrome";

/// Class token of the selected element.
pub const SELECTED_CLASS: &str = "selected";

/// The markup/style/script triple exchanged with the outside world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBundle {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl SourceBundle {
    pub fn new(html: impl Into<String>, css: impl Into<String>, js: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            js: js.into(),
        }
    }
}

// ─── Persistence collaborator ────────────────────────────────────────────

/// Receives serialized content after every mutation. Fire-and-forget: the
/// editor never looks at the outcome of a save.
pub trait FileSink {
    fn save_files(&mut self, bundle: &SourceBundle);
}

/// Records every save; used by tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub saves: Vec<SourceBundle>,
}

impl MemorySink {
    pub fn last(&self) -> Option<&SourceBundle> {
        self.saves.last()
    }
}

impl FileSink for MemorySink {
    fn save_files(&mut self, bundle: &SourceBundle) {
        self.saves.push(bundle.clone());
    }
}

/// Discards saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FileSink for NullSink {
    fn save_files(&mut self, _bundle: &SourceBundle) {}
}

// ─── Mutations ───────────────────────────────────────────────────────────

/// An in-place edit of one canvas element.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMutation {
    /// Set an inline style property.
    SetStyle {
        target: ElementRef,
        property: String,
        value: String,
    },
    /// Remove an inline style property.
    RemoveStyle { target: ElementRef, property: String },
    AddClass { target: ElementRef, class: String },
    RemoveClass { target: ElementRef, class: String },
}

impl CanvasMutation {
    pub fn set_style(target: ElementRef, property: &str, value: impl Into<String>) -> Self {
        Self::SetStyle {
            target,
            property: property.to_string(),
            value: value.into(),
        }
    }

    pub fn target(&self) -> ElementRef {
        match self {
            Self::SetStyle { target, .. }
            | Self::RemoveStyle { target, .. }
            | Self::AddClass { target, .. }
            | Self::RemoveClass { target, .. } => *target,
        }
    }

    /// Whether this mutation changes what [`serialize`] produces. The
    /// selection marker is stripped, so toggling it does not.
    pub fn alters_source(&self) -> bool {
        match self {
            Self::AddClass { class, .. } | Self::RemoveClass { class, .. } => {
                class != SELECTED_CLASS
            }
            _ => true,
        }
    }
}

/// Apply `mutation` to `doc`. Fails when the target belongs to another
/// document generation.
pub fn apply_mutation(doc: &mut Document, mutation: &CanvasMutation) -> EditorResult<()> {
    let target = mutation.target();
    let current = doc.generation();
    let el = doc.get_mut(target).ok_or(EditorError::StaleReference {
        generation: target.generation(),
        current,
    })?;

    match mutation {
        CanvasMutation::SetStyle {
            property, value, ..
        } => el.set_inline_style(property, value),
        CanvasMutation::RemoveStyle { property, .. } => el.remove_inline_style(property),
        CanvasMutation::AddClass { class, .. } => el.add_class(class),
        CanvasMutation::RemoveClass { class, .. } => el.remove_class(class),
    }
    log::trace!("applied {mutation:?}");
    Ok(())
}

// ─── Serialization ───────────────────────────────────────────────────────

/// Serialize the canvas document back into its three source texts.
///
/// - `html`: inner markup of the body without `script`/`style` elements
///   and without the selection marker class.
/// - `css`: text of every non-chrome `style` element, in document order.
/// - `js`: text of every `script` element, in document order.
pub fn serialize(doc: &Document) -> SourceBundle {
    let html = doc
        .body()
        .map(|body| {
            emit_children(
                doc,
                body,
                &EmitOptions {
                    omit_tags: &["script", "style"],
                    strip_class: Some(SELECTED_CLASS),
                },
            )
        })
        .unwrap_or_default();

    let css = collect_text(doc, |idx| {
        doc.element(idx)
            .is_some_and(|el| el.tag.is("style") && !el.has_attr(CHROME_ATTR))
    });
    let js = collect_text(doc, |idx| {
        doc.element(idx).is_some_and(|el| el.tag.is("script"))
    });

    SourceBundle { html, css, js }
}

fn collect_text(doc: &Document, wanted: impl Fn(NodeIndex) -> bool) -> String {
    doc.descendants(doc.root)
        .into_iter()
        .filter(|&idx| wanted(idx))
        .map(|idx| doc.text_content(idx))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serializes after mutations and forwards the result to a [`FileSink`].
#[derive(Debug, Default)]
pub struct CodeSync<S: FileSink> {
    sink: S,
    last: Option<SourceBundle>,
}

impl<S: FileSink> CodeSync<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, last: None }
    }

    /// Re-serialize `doc` and save it.
    pub fn sync(&mut self, doc: &Document) -> &SourceBundle {
        let bundle = serialize(doc);
        log::trace!(
            "code sync: {} bytes html, {} css, {} js",
            bundle.html.len(),
            bundle.css.len(),
            bundle.js.len()
        );
        self.sink.save_files(&bundle);
        self.last.insert(bundle)
    }

    /// The most recently synced bundle.
    pub fn last(&self) -> Option<&SourceBundle> {
        self.last.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepage_core::parse_document;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><style data-editor-chrome>.selected{outline:2px solid}</style><style>#a { color: red; }</style></head><body><div id="a" class="selected">x</div><script>go();</script></body></html>"#;

    #[test]
    fn serialize_strips_chrome() {
        let doc = parse_document(PAGE);
        assert_eq!(
            serialize(&doc),
            SourceBundle::new(r#"<div id="a">x</div>"#, "#a { color: red; }", "go();")
        );
    }

    #[test]
    fn mutations_edit_in_place() {
        let mut doc = parse_document(PAGE);
        let target = doc.element_ref(doc.find_id("a").unwrap()).unwrap();
        apply_mutation(&mut doc, &CanvasMutation::set_style(target, "left", "40px")).unwrap();
        apply_mutation(
            &mut doc,
            &CanvasMutation::RemoveClass {
                target,
                class: SELECTED_CLASS.into(),
            },
        )
        .unwrap();
        assert_eq!(
            serialize(&doc).html,
            r#"<div id="a" style="left: 40px;">x</div>"#
        );
    }

    #[test]
    fn stale_targets_are_rejected() {
        let old = parse_document(PAGE);
        let target = old.element_ref(old.find_id("a").unwrap()).unwrap();
        let mut doc = parse_document(PAGE);
        let err = apply_mutation(&mut doc, &CanvasMutation::set_style(target, "top", "0px"))
            .unwrap_err();
        assert!(matches!(err, EditorError::StaleReference { .. }));
    }

    #[test]
    fn selection_marker_does_not_alter_source() {
        let doc = parse_document(PAGE);
        let target = doc.element_ref(doc.find_id("a").unwrap()).unwrap();
        let select = CanvasMutation::AddClass {
            target,
            class: SELECTED_CLASS.into(),
        };
        assert!(!select.alters_source());
        assert!(CanvasMutation::set_style(target, "top", "0px").alters_source());
    }

    #[test]
    fn code_sync_saves_every_time() {
        let doc = parse_document(PAGE);
        let mut sync = CodeSync::new(MemorySink::default());
        sync.sync(&doc);
        sync.sync(&doc);
        assert_eq!(sync.sink().saves.len(), 2);
        assert_eq!(sync.last(), sync.sink().last());
    }
}

//! Layer inspector: the ordered list of manipulable elements.
//!
//! Derived from scratch on every call; nothing is cached between document
//! replacements or selection changes.

use crate::error::{EditorError, EditorResult};
use livepage_core::{Document, Element, ElementRef};

/// One row of the layer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    /// `tag` or `tag#id`.
    pub label: String,
    /// Icon class for the row.
    pub icon: &'static str,
    pub selected: bool,
    pub target: ElementRef,
}

/// Icon class shown next to an element of the given tag.
pub fn layer_icon(tag: &str) -> &'static str {
    match tag {
        "p" => "fas fa-paragraph",
        "img" => "fas fa-image",
        "input" => "fas fa-i-cursor",
        _ => "fas fa-square",
    }
}

fn label(el: &Element) -> String {
    match el.id() {
        Some(id) if !id.is_empty() => format!("{}#{id}", el.tag),
        _ => el.tag.to_string(),
    }
}

/// Every element under the body, in document order, except `script` and
/// `style`.
pub fn layers(doc: &Document, selected: Option<ElementRef>) -> Vec<LayerEntry> {
    let Some(body) = doc.body() else {
        return Vec::new();
    };
    doc.descendants(body)
        .into_iter()
        .filter_map(|idx| {
            let el = doc.element(idx)?;
            if el.tag.is("script") || el.tag.is("style") {
                return None;
            }
            let target = doc.element_ref(idx)?;
            Some(LayerEntry {
                label: label(el),
                icon: layer_icon(el.tag.as_str()),
                selected: selected == Some(target),
                target,
            })
        })
        .collect()
}

/// The element behind row `index`.
pub fn layer_at(entries: &[LayerEntry], index: usize) -> EditorResult<ElementRef> {
    entries
        .get(index)
        .map(|entry| entry.target)
        .ok_or(EditorError::LayerOutOfRange {
            index,
            len: entries.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepage_core::parse_document;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><style>p{}</style></head><body><div id="card"><p>text</p><img src="a.png"></div><input id="q"><style>.x{}</style><script>x()</script></body></html>"#;

    #[test]
    fn document_order_without_script_and_style() {
        let doc = parse_document(PAGE);
        let rows: Vec<(String, &str)> = layers(&doc, None)
            .into_iter()
            .map(|e| (e.label, e.icon))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("div#card".to_string(), "fas fa-square"),
                ("p".to_string(), "fas fa-paragraph"),
                ("img".to_string(), "fas fa-image"),
                ("input#q".to_string(), "fas fa-i-cursor"),
            ]
        );
    }

    #[test]
    fn selected_flag_follows_selection() {
        let doc = parse_document(PAGE);
        let q = doc.element_ref(doc.find_id("q").unwrap());
        let entries = layers(&doc, q);
        let flagged: Vec<&str> = entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(flagged, vec!["input#q"]);
    }

    #[test]
    fn out_of_range_rows() {
        let doc = parse_document(PAGE);
        let entries = layers(&doc, None);
        assert_eq!(layer_at(&entries, 3).ok(), doc.element_ref(doc.find_id("q").unwrap()));
        assert!(matches!(
            layer_at(&entries, 9),
            Err(EditorError::LayerOutOfRange { index: 9, len: 4 })
        ));
    }
}

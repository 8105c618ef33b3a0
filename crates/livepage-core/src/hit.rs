//! Hit testing: which element is under a content-space point.

use crate::dom::Document;
use crate::layout::Layout;
use kurbo::Point;
use petgraph::graph::NodeIndex;

/// Topmost element whose border box contains `point`.
///
/// Later elements in document order paint over earlier ones, so the last
/// match in pre-order wins. The `html` and `body` elements are never hit;
/// a point over them is background.
pub fn hit_test(doc: &Document, layout: &Layout, point: Point) -> Option<NodeIndex> {
    doc.descendants(doc.root).into_iter().rev().find(|&idx| {
        doc.element(idx)
            .is_some_and(|el| !el.tag.is("html") && !el.tag.is("body"))
            && layout
                .border_box(idx)
                .is_some_and(|rect| contains_inclusive(rect, point))
    })
}

/// `Rect::contains` excludes the far edges; hit testing includes them.
fn contains_inclusive(rect: kurbo::Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

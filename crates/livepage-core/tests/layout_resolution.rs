//! Integration tests: cascade + layout over parsed documents.

use livepage_core::css::{Position, compute_style, parse_stylesheet};
use livepage_core::layout::{LINE_HEIGHT, Viewport, resolve_layout};
use livepage_core::parser::parse_document;
use livepage_core::{Color, hit_test};
use kurbo::{Point, Rect, Size};
use pretty_assertions::assert_eq;

const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

const PAGE: &str = r#"<!DOCTYPE html><html><head>
<style>
  body { margin: 0; }
  .card { width: 200px; height: 100px; padding: 10px; background: rgb(59, 130, 246); }
  #hero.card { background-color: #ff0000; }
  section > .card { margin-left: 20px; }
</style></head>
<body><section><div id="hero" class="card">Hello</div><div id="plain" class="card" style="position: absolute; left: 40px; top: 300px"></div></section></body></html>"#;

#[test]
fn cascade_orders_by_specificity() {
    let doc = parse_document(PAGE);
    let sheet = {
        let style = doc.find_tag("style").expect("style");
        parse_stylesheet(&doc.text_content(style))
    };

    let hero = compute_style(&doc, &sheet, doc.find_id("hero").unwrap());
    assert_eq!(hero.background_color().to_hex(), "#ff0000");
    assert_eq!(hero.get("margin-left"), Some("20px"));

    let plain = compute_style(&doc, &sheet, doc.find_id("plain").unwrap());
    assert_eq!(plain.background_color(), Color::rgba(59, 130, 246, 255));
    assert_eq!(plain.position(), Position::Absolute);
}

#[test]
fn boxes_follow_margins_padding_and_position() {
    let doc = parse_document(PAGE);
    let style = doc.find_tag("style").unwrap();
    let sheet = parse_stylesheet(&doc.text_content(style));
    let layout = resolve_layout(&doc, &sheet, VIEWPORT);

    let hero = layout.boxes[&doc.find_id("hero").unwrap()];
    assert_eq!(hero.content, Rect::new(30.0, 10.0, 230.0, 110.0));
    assert_eq!(hero.border, Rect::new(20.0, 0.0, 240.0, 120.0));

    let plain = layout.border_box(doc.find_id("plain").unwrap()).unwrap();
    assert_eq!(plain, Rect::new(60.0, 300.0, 280.0, 420.0));

    // The absolute card overflows the in-flow content.
    assert_eq!(layout.content, Size::new(800.0, 420.0));
}

#[test]
fn hit_test_over_laid_out_page() {
    let doc = parse_document(PAGE);
    let style = doc.find_tag("style").unwrap();
    let sheet = parse_stylesheet(&doc.text_content(style));
    let layout = resolve_layout(&doc, &sheet, VIEWPORT);

    assert_eq!(
        hit_test(&doc, &layout, Point::new(100.0, 50.0)),
        doc.find_id("hero")
    );
    assert_eq!(
        hit_test(&doc, &layout, Point::new(100.0, 350.0)),
        doc.find_id("plain")
    );
    assert_eq!(
        hit_test(&doc, &layout, Point::new(700.0, 50.0)),
        doc.find_tag("section")
    );
    assert_eq!(hit_test(&doc, &layout, Point::new(700.0, 500.0)), None);
}

#[test]
fn text_height_is_line_based() {
    let doc = parse_document("<p id=\"p\">one two three</p>");
    let layout = resolve_layout(&doc, &parse_stylesheet(""), VIEWPORT);
    let p = layout.content_box(doc.find_id("p").unwrap()).unwrap();
    assert_eq!(p.height(), LINE_HEIGHT);
    assert_eq!(p.width(), 800.0);
}

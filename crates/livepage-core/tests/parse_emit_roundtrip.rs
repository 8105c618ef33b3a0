//! Integration tests: parse → emit → re-parse round-trip.
//!
//! Verifies that markup survives Document → text → Document without losing
//! elements, attributes or text.

use livepage_core::emitter::{EmitOptions, emit_children, emit_document};
use livepage_core::parser::parse_document;
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Parse, emit, re-parse, and compare the emitted text of both trees.
fn assert_roundtrip_stable(input: &str) {
    let doc1 = parse_document(input);
    let emitted = emit_document(&doc1);
    let doc2 = parse_document(&emitted);

    assert_eq!(
        doc1.graph.node_count(),
        doc2.graph.node_count(),
        "node count mismatch after round-trip.\nOriginal:\n{input}\nEmitted:\n{emitted}"
    );
    assert_eq!(emit_document(&doc2), emitted, "emission is not a fixed point");
}

// ─── Generated pages ─────────────────────────────────────────────────────

#[test]
fn roundtrip_landing_page() {
    assert_roundtrip_stable(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Landing</title>
  <style>.hero { background: #6c5ce7; color: white; }</style>
</head>
<body>
  <header class="hero"><h1 id="title">Ship faster</h1><p>Build pages in <em>minutes</em>.</p></header>
  <main>
    <img src="hero.png" alt="Product shot" width="320" height="200">
    <button type="button" disabled>Get started</button>
    <input type="email" placeholder='you@example.com'>
  </main>
  <script>document.querySelector('#title').addEventListener('click', () => { if (1 < 2) alert('hi'); });</script>
</body>
</html>"#,
    );
}

#[test]
fn roundtrip_preserves_comments_and_entities() {
    let src = "<p>a &amp; b &lt; c</p><!-- keep me -->";
    let doc = parse_document(src);
    assert_eq!(emit_document(&doc), src);
}

#[test]
fn roundtrip_repairs_broken_markup_once() {
    assert_roundtrip_stable("<div><p>unclosed <b>bold</div></span>tail");
}

// ─── Body serialization ──────────────────────────────────────────────────

#[test]
fn body_inner_markup_without_chrome() {
    let doc = parse_document(
        r#"<html><head><style>p{}</style></head><body><div id="card" class="selected card">x</div><style>.x{}</style><script>go()</script></body></html>"#,
    );
    let body = doc.body().expect("body");
    let html = emit_children(
        &doc,
        body,
        &EmitOptions {
            omit_tags: &["script", "style"],
            strip_class: Some("selected"),
        },
    );
    assert_eq!(html, r#"<div id="card" class="card">x</div>"#);
}

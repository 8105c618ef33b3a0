//! Integration tests: document loading (livepage-editor).
//!
//! Runs the two-phase load (dwell, settle) on tokio's paused clock and
//! checks cancellation, measurement, reset, viewport emulation and what
//! Code Sync hands to the sink after a load.

use kurbo::{Size, Vec2};
use livepage_editor::{
    CanvasEditor, EditorCommand, EditorConfig, LoadOutcome, LoadPhase, MemorySink, SourceBundle,
    ViewportMode,
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn editor() -> CanvasEditor<MemorySink> {
    let _ = env_logger::builder().is_test(true).try_init();
    CanvasEditor::new(EditorConfig::default(), MemorySink::default())
}

fn page() -> SourceBundle {
    SourceBundle::new(r#"<div id="a">x</div>"#, "", "")
}

fn labels(editor: &CanvasEditor<MemorySink>) -> Vec<String> {
    editor.layers().iter().map(|l| l.label.clone()).collect()
}

// ─── Phases ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn load_waits_for_dwell_and_settle() {
    let mut editor = editor();
    let started = Instant::now();

    let outcome = editor.load(&page()).await;

    assert_eq!(outcome, LoadOutcome::Ready);
    assert!(started.elapsed() >= Duration::from_millis(600));
    assert_eq!(editor.surface().phase(), LoadPhase::Idle);
    assert_eq!(labels(&editor), vec!["div#a"]);
    assert_eq!(editor.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_dwell_keeps_old_document() {
    let mut editor = editor();
    editor.load(&page()).await;
    let generation = editor.surface().generation();
    let saves = editor.sink().saves.len();

    let cancel = editor.cancel_handle();
    let next = SourceBundle::new(r#"<p id="b">y</p>"#, "", "");
    let (outcome, ()) = tokio::join!(editor.load(&next), async {
        sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });

    assert_eq!(outcome, LoadOutcome::Cancelled(LoadPhase::Dwell));
    assert_eq!(editor.surface().generation(), generation);
    assert_eq!(labels(&editor), vec!["div#a"]);
    assert_eq!(editor.sink().saves.len(), saves);
    assert_eq!(editor.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_settle_keeps_swapped_document() {
    let mut editor = editor();
    let cancel = editor.cancel_handle();

    let html = page();
    let (outcome, ()) = tokio::join!(editor.load(&html), async {
        sleep(Duration::from_millis(550)).await;
        cancel.cancel();
    });

    assert_eq!(outcome, LoadOutcome::Cancelled(LoadPhase::Settle));
    assert!(!editor.surface().is_loading());
    assert_eq!(labels(&editor), vec!["div#a"]);
    assert_eq!(editor.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_load_does_not_leak_into_it() {
    let mut editor = editor();
    editor.cancel_handle().cancel();
    assert_eq!(editor.load(&page()).await, LoadOutcome::Ready);
}

// ─── Content ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn sync_after_load_returns_supplied_source() {
    let mut editor = editor();
    editor
        .load(&SourceBundle::new(
            r#"<div id="a" class="card selected">x</div>"#,
            ".card { color: red; }",
            "console.log(1)",
        ))
        .await;

    assert_eq!(
        editor.sink().last(),
        Some(&SourceBundle::new(
            r#"<div id="a" class="card">x</div>"#,
            ".card { color: red; }",
            "console.log(1)",
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn empty_markup_loads_empty_shell() {
    let mut editor = editor();
    assert_eq!(
        editor.load(&SourceBundle::default()).await,
        LoadOutcome::Ready
    );
    assert!(editor.layers().is_empty());
    assert_eq!(editor.sink().last(), Some(&SourceBundle::default()));
    assert_eq!(editor.surface().size(), Size::new(1200.0, 800.0));
}

#[tokio::test(start_paused = true)]
async fn zoom_after_load() {
    let mut editor = editor();
    editor.load(&page()).await;
    for _ in 0..3 {
        editor.zoom(0.1);
    }
    assert!((editor.scale() - 1.3).abs() < 1e-9);
    assert_eq!(editor.zoom_percent(), 130);

    for _ in 0..20 {
        editor.dispatch(EditorCommand::ZoomIn).unwrap();
    }
    assert_eq!(editor.scale(), 2.0);
    editor.zoom(-50.0);
    assert_eq!(editor.scale(), 0.1);

    editor
        .dispatch(EditorCommand::Zoom { delta: f64::NAN })
        .unwrap();
    editor.zoom(f64::INFINITY);
    assert_eq!(editor.scale(), 0.1);
    editor.zoom(0.4);
    assert_eq!(editor.zoom_percent(), 50);
}

#[tokio::test(start_paused = true)]
async fn inverted_zoom_config_falls_back_to_defaults() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = EditorConfig {
        zoom: livepage_editor::config::ZoomConfig {
            min: 2.0,
            max: 0.1,
            ..Default::default()
        },
        ..EditorConfig::default()
    };
    let mut editor = CanvasEditor::new(config, MemorySink::default());
    editor.load(&page()).await;
    editor.zoom(0.1);
    assert_eq!(editor.zoom_percent(), 110);
    editor.zoom(5.0);
    assert_eq!(editor.scale(), 2.0);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_document_and_transform() {
    let mut editor = editor();
    editor.load(&page()).await;
    editor.zoom(0.5);
    editor.pan(40.0, 40.0);

    assert_eq!(editor.reset().await, LoadOutcome::Ready);

    assert!(editor.layers().is_empty());
    assert_eq!(editor.scale(), 1.0);
    assert_eq!(editor.pan_offset(), Vec2::ZERO);
    assert_eq!(editor.sink().last().unwrap().html, "");
}

// ─── Viewport emulation ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn viewport_modes_resize_and_center() {
    let mut editor = editor();
    editor.load(&page()).await;
    editor.zoom(-0.5);

    editor
        .dispatch(EditorCommand::SetViewport {
            mode: ViewportMode::Tablet,
        })
        .unwrap();
    assert_eq!(editor.viewport_mode(), ViewportMode::Tablet);
    assert_eq!(editor.surface().frame(), Size::new(768.0, 1024.0));
    assert_eq!(editor.pan_offset(), Vec2::new(408.0, 144.0));

    editor.set_viewport_mode(ViewportMode::Desktop);
    assert_eq!(editor.surface().frame(), Size::new(1200.0, 800.0));
    assert_eq!(editor.pan_offset(), Vec2::new(300.0, 200.0));
}

#[tokio::test(start_paused = true)]
async fn mode_switch_sizes_surface_to_frame() {
    let mut editor = editor();
    editor
        .load(&SourceBundle::new(
            r#"<div id="a" style="height: 3000px">x</div>"#,
            "",
            "",
        ))
        .await;
    assert!(editor.surface().size().height > 3000.0);

    editor.set_viewport_mode(ViewportMode::Tablet);
    assert_eq!(editor.surface().size(), Size::new(768.0, 1024.0));
    assert_eq!(editor.pan_offset(), Vec2::new(216.0, -112.0));
}

#[tokio::test(start_paused = true)]
async fn container_resize_recenters() {
    let mut editor = editor();
    editor.load(&page()).await;

    editor
        .dispatch(EditorCommand::ResizeContainer {
            width: 1000.0,
            height: 600.0,
        })
        .unwrap();
    assert_eq!(editor.surface().container(), Size::new(1000.0, 600.0));
    assert_eq!(editor.surface().frame(), Size::new(1000.0, 600.0));
    assert_eq!(editor.pan_offset(), Vec2::ZERO);

    editor.zoom(-0.5);
    editor.set_viewport_mode(ViewportMode::Tablet);
    editor.resize_container(Size::new(1200.0, 800.0)).unwrap();
    assert_eq!(editor.surface().frame(), Size::new(768.0, 1024.0));
    assert_eq!(editor.pan_offset(), Vec2::new(408.0, 144.0));

    assert!(editor.resize_container(Size::new(f64::NAN, 10.0)).is_err());
    assert_eq!(editor.surface().container(), Size::new(1200.0, 800.0));
}

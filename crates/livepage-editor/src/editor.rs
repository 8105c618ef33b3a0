//! The canvas editor.
//!
//! `CanvasEditor` ties the components together and is the only type the
//! UI-wiring layer talks to. It owns the canvas document (through the
//! surface adapter), the selection, and every derived view. Input arrives
//! as [`InputEvent`]s on two channels (workspace and surface) or as
//! [`EditorCommand`]s; each handler runs to completion before the next, so
//! mutations never interleave.
//!
//! After every mutation that changes serialized content the editor runs
//! Code Sync, which hands the new text to the [`FileSink`].

use crate::commands::EditorCommand;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::grid::GridService;
use crate::history::{History, Snapshot};
use crate::input::{InputEvent, Modifiers};
use crate::layers::{LayerEntry, layer_at, layers};
use crate::properties::{PanelField, PanelFields, PropertyPanel};
use crate::shortcuts::ShortcutMap;
use crate::surface::{LoadCanceller, LoadOutcome, SurfaceAdapter};
use crate::sync::{
    CanvasMutation, CodeSync, FileSink, NullSink, SELECTED_CLASS, SourceBundle, serialize,
};
use crate::tools::{Action, Manipulator, Mode, PointerContext, ToolKind};
use crate::transform::{SurfaceTransform, TransformEngine};
use crate::viewport::{ViewportEmulator, ViewportMode};
use kurbo::{Point, Size, Vec2};
use livepage_core::ElementRef;
use livepage_core::css::parse_px;

pub struct CanvasEditor<S: FileSink = NullSink> {
    config: EditorConfig,
    surface: SurfaceAdapter,
    transform: TransformEngine,
    manipulator: Manipulator,
    grid: GridService,
    panel: PropertyPanel,
    layers: Vec<LayerEntry>,
    history: History<Snapshot>,
    viewport: ViewportEmulator,
    code: CodeSync<S>,
    selection: Option<ElementRef>,
}

impl<S: FileSink> CanvasEditor<S> {
    pub fn new(config: EditorConfig, sink: S) -> Self {
        let grid = GridService::new(config.grid);
        let mut surface = SurfaceAdapter::new(config.load, config.container.into());
        surface.set_background(grid.overlay());
        let mut editor = Self {
            surface,
            transform: TransformEngine::new(config.zoom),
            manipulator: Manipulator::new(),
            grid,
            panel: PropertyPanel::default(),
            layers: Vec::new(),
            history: History::new(config.history_limit),
            viewport: ViewportEmulator::new(config.viewports),
            code: CodeSync::new(sink),
            selection: None,
            config,
        };
        editor.refresh_views();
        editor
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Load freshly generated content. Resolves once the new document has
    /// settled and been measured, or when the load is cancelled.
    ///
    /// Every swap clears the selection, re-derives the layer list, runs
    /// Code Sync and records a history entry.
    pub async fn load(&mut self, bundle: &SourceBundle) -> LoadOutcome {
        let before = self.surface.generation();
        let outcome = self.surface.load(bundle).await;
        if self.surface.generation() != before {
            self.after_replace();
            self.sync_code();
            self.record_history();
        }
        log::debug!("load finished: {outcome:?}");
        outcome
    }

    /// Handle for cancelling an in-flight [`load`](Self::load).
    pub fn cancel_handle(&self) -> LoadCanceller {
        self.surface.cancel_handle()
    }

    /// Clear to an empty document and reset zoom and pan.
    pub async fn reset(&mut self) -> LoadOutcome {
        let outcome = self.load(&SourceBundle::default()).await;
        self.transform.reset();
        self.transform.apply_transform();
        outcome
    }

    /// Selection and derived views after the document was replaced. Old
    /// references no longer resolve, so nothing carries over.
    fn after_replace(&mut self) {
        self.manipulator.abort();
        self.selection = None;
        self.clear_stray_markers();
        self.refresh_views();
    }

    /// Markup may arrive with the selection class already set; only the
    /// editor's own selection may carry it.
    fn clear_stray_markers(&mut self) {
        let marked: Vec<ElementRef> = layers(self.surface.document(), None)
            .into_iter()
            .map(|entry| entry.target)
            .filter(|&target| {
                self.surface
                    .document()
                    .get(target)
                    .is_some_and(|el| el.has_class(SELECTED_CLASS))
            })
            .collect();
        for target in marked {
            self.apply_quietly(&CanvasMutation::RemoveClass {
                target,
                class: SELECTED_CLASS.to_string(),
            });
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Apply a UI command. Failures are logged and leave the editor as it
    /// was.
    pub fn dispatch(&mut self, command: EditorCommand) -> EditorResult<()> {
        log::debug!("command: {command:?}");
        let result = match command {
            EditorCommand::Pan { dx, dy } => {
                self.pan(dx, dy);
                Ok(())
            }
            EditorCommand::Zoom { delta } => {
                self.zoom(delta);
                Ok(())
            }
            EditorCommand::ZoomIn => {
                self.transform.zoom_in();
                self.transform.apply_transform();
                Ok(())
            }
            EditorCommand::ZoomOut => {
                self.transform.zoom_out();
                self.transform.apply_transform();
                Ok(())
            }
            EditorCommand::ToggleGrid => {
                self.toggle_grid();
                Ok(())
            }
            EditorCommand::ToggleSnap => {
                self.toggle_snap_to_grid();
                Ok(())
            }
            EditorCommand::SetViewport { mode } => {
                self.set_viewport_mode(mode);
                Ok(())
            }
            EditorCommand::ResizeContainer { width, height } => {
                self.resize_container(Size::new(width, height))
            }
            EditorCommand::Undo => self.undo().map(|_| ()),
            EditorCommand::Redo => self.redo().map(|_| ()),
            EditorCommand::Deselect => {
                self.deselect();
                Ok(())
            }
            EditorCommand::SelectLayer { index } => self.select_layer(index),
            EditorCommand::SetTool { tool } => {
                self.set_tool(tool);
                Ok(())
            }
        };
        if let Err(err) = &result {
            log::warn!("{command:?} rejected: {err}");
        }
        result
    }

    /// Resolve a key press through the shortcut map and dispatch it.
    /// Returns whether the key was bound.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> EditorResult<bool> {
        match ShortcutMap::resolve_with(key, modifiers) {
            Some(command) => self.dispatch(command).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transform.pan(dx, dy);
        self.transform.apply_transform();
    }

    pub fn zoom(&mut self, delta: f64) {
        self.transform.zoom(delta);
        self.transform.apply_transform();
    }

    pub fn toggle_grid(&mut self) {
        let overlay = self.grid.toggle_visible();
        self.surface.set_background(overlay);
    }

    pub fn toggle_snap_to_grid(&mut self) {
        self.grid.toggle_snap();
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        let cursor = self.manipulator.set_tool(tool);
        self.surface.set_cursor(cursor);
    }

    /// Resize the surface to the mode's frame and center it at the current
    /// scale.
    pub fn set_viewport_mode(&mut self, mode: ViewportMode) {
        let placement = self
            .viewport
            .set_mode(mode, self.surface.container(), self.transform.scale());
        self.surface.set_frame(placement.frame);
        self.transform.set_pan(placement.pan);
        self.transform.apply_transform();
        self.refresh_panel();
    }

    /// The host resized the workspace. The current mode is applied again,
    /// so Desktop follows the new size and fixed frames are recentered.
    pub fn resize_container(&mut self, container: Size) -> EditorResult<()> {
        if !(container.width.is_finite() && container.height.is_finite())
            || container.width < 0.0
            || container.height < 0.0
        {
            return Err(EditorError::InvalidValue {
                field: "container",
                value: format!("{}x{}", container.width, container.height),
            });
        }
        self.surface.set_container(container);
        self.set_viewport_mode(self.viewport.mode());
        Ok(())
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back one history entry. Returns whether anything was restored;
    /// at the oldest entry this is a no-op.
    pub fn undo(&mut self) -> EditorResult<bool> {
        match self.history.undo().cloned() {
            Some(snapshot) => self.restore_snapshot(&snapshot).map(|()| true),
            None => Ok(false),
        }
    }

    /// Step forward one history entry; a no-op at the newest.
    pub fn redo(&mut self) -> EditorResult<bool> {
        match self.history.redo().cloned() {
            Some(snapshot) => self.restore_snapshot(&snapshot).map(|()| true),
            None => Ok(false),
        }
    }

    fn restore_snapshot(&mut self, snapshot: &Snapshot) -> EditorResult<()> {
        let bundle = snapshot.restore()?;
        self.surface.restore(&bundle);
        self.after_replace();
        self.sync_code();
        Ok(())
    }

    fn record_history(&mut self) {
        match Snapshot::capture(&serialize(self.surface.document())) {
            Ok(snapshot) => {
                self.history.push(snapshot);
                log::debug!(
                    "history: {} entries, at {:?}",
                    self.history.len(),
                    self.history.index()
                );
            }
            Err(err) => log::warn!("history entry dropped: {err}"),
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select `target`, moving the selection marker onto it.
    pub fn select(&mut self, target: ElementRef) -> EditorResult<()> {
        if !self.surface.is_current(target) {
            return Err(EditorError::StaleReference {
                generation: target.generation(),
                current: self.surface.generation(),
            });
        }
        if let Some(previous) = self.selection.take() {
            self.apply_quietly(&CanvasMutation::RemoveClass {
                target: previous,
                class: SELECTED_CLASS.to_string(),
            });
        }
        self.apply_quietly(&CanvasMutation::AddClass {
            target,
            class: SELECTED_CLASS.to_string(),
        });
        self.selection = Some(target);
        log::debug!("selected {:?}", target.index());
        self.refresh_views();
        Ok(())
    }

    /// Clear the selection; a no-op when nothing is selected.
    pub fn deselect(&mut self) {
        let Some(previous) = self.selection.take() else {
            return;
        };
        self.apply_quietly(&CanvasMutation::RemoveClass {
            target: previous,
            class: SELECTED_CLASS.to_string(),
        });
        log::debug!("deselected");
        self.refresh_views();
    }

    /// Select the element behind a layer row, as if it had been clicked.
    pub fn select_layer(&mut self, index: usize) -> EditorResult<()> {
        let target = layer_at(&self.layers, index)?;
        self.select(target)
    }

    // ─── Property panel ──────────────────────────────────────────────────

    /// Write one panel field back to the selected element. A no-op without
    /// a selection; malformed values are rejected and change nothing.
    pub fn edit_property(&mut self, field: PanelField, value: &str) -> EditorResult<()> {
        let Some(target) = self.selection else {
            return Ok(());
        };
        let mutations = self.panel.edit(target, field, value).inspect_err(|err| {
            log::warn!("property edit rejected: {err}");
        })?;
        for mutation in &mutations {
            self.surface.apply(mutation)?;
        }
        self.sync_code();
        self.refresh_panel();
        self.record_history();
        Ok(())
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Events on the workspace around the surface: wheel zoom, middle-button
    /// panning and pointer-leave. Keys go through the shortcut map.
    pub fn handle_workspace_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Wheel { delta_y } => {
                self.transform.wheel(*delta_y);
                self.transform.apply_transform();
            }
            InputEvent::Key { key, modifiers } => {
                // Failures are already logged by dispatch.
                let _ = self.handle_key(key, *modifiers);
            }
            _ => self.route(event, Channel::Workspace),
        }
    }

    /// Events inside the canvas document: clicks and element dragging.
    pub fn handle_surface_event(&mut self, event: &InputEvent) {
        self.route(event, Channel::Surface);
    }

    fn route(&mut self, event: &InputEvent, channel: Channel) {
        let hit = event
            .position()
            .and_then(|p| self.surface.hit_test(self.transform.to_content(p)));
        let selected = self.selection.filter(|&r| self.surface.is_current(r));
        let origin = selected.map_or(Point::ZERO, |r| {
            let offset = |property| {
                self.surface
                    .inline_style(r, property)
                    .and_then(|v| parse_px(&v))
                    .unwrap_or(0.0)
            };
            Point::new(offset("left"), offset("top"))
        });
        let transition = selected.and_then(|r| self.surface.inline_style(r, "transition"));

        let ctx = PointerContext {
            hit,
            selected,
            selected_origin: origin,
            selected_transition: transition.as_deref(),
            scale: self.transform.scale(),
            pan: self.transform.pan_offset(),
            grid: &self.grid,
        };
        let actions = match channel {
            Channel::Workspace => self.manipulator.handle_workspace(event, &ctx),
            Channel::Surface => self.manipulator.handle_surface(event, &ctx),
        };
        self.apply_actions(actions);
    }

    fn apply_actions(&mut self, actions: Vec<Action>) {
        let mut source_changed = false;
        let mut mutated = false;
        for action in actions {
            match action {
                Action::Select(target) => {
                    if let Err(err) = self.select(target) {
                        log::warn!("selection rejected: {err}");
                    }
                }
                Action::Deselect => self.deselect(),
                Action::PanTo(pan) => {
                    self.transform.set_pan(pan);
                    self.transform.apply_transform();
                }
                Action::Mutate(mutation) => {
                    if self.apply_quietly(&mutation) {
                        mutated = true;
                        source_changed |= mutation.alters_source();
                    }
                }
                Action::Commit => {
                    if source_changed {
                        self.sync_code();
                        source_changed = false;
                    }
                    self.record_history();
                }
                Action::SetCursor(cursor) => self.surface.set_cursor(cursor),
            }
        }
        if source_changed {
            self.sync_code();
        }
        if mutated {
            self.refresh_panel();
        }
    }

    /// Apply a mutation, logging instead of failing. Returns whether it
    /// applied.
    fn apply_quietly(&mut self, mutation: &CanvasMutation) -> bool {
        match self.surface.apply(mutation) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("mutation dropped: {err}");
                false
            }
        }
    }

    // ─── Display refresh ─────────────────────────────────────────────────

    /// Called by the host once per display-refresh tick. Yields the pending
    /// transform, if any, and pushes it to the surface.
    pub fn on_animation_frame(&mut self) -> Option<SurfaceTransform> {
        let transform = self.transform.take_frame()?;
        log::trace!("frame: {transform}");
        self.surface.set_transform(transform);
        Some(transform)
    }

    // ─── Derived views ───────────────────────────────────────────────────

    fn sync_code(&mut self) {
        self.code.sync(self.surface.document());
    }

    fn refresh_panel(&mut self) {
        self.panel.refresh(&self.surface, self.selection);
    }

    fn refresh_views(&mut self) {
        self.refresh_panel();
        self.layers = layers(self.surface.document(), self.selection);
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &SurfaceAdapter {
        &self.surface
    }

    pub fn selected(&self) -> Option<ElementRef> {
        self.selection
    }

    pub fn layers(&self) -> &[LayerEntry] {
        &self.layers
    }

    pub fn panel_fields(&self) -> &PanelFields {
        self.panel.fields()
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn mode(&self) -> Mode {
        self.manipulator.mode()
    }

    pub fn tool(&self) -> ToolKind {
        self.manipulator.tool()
    }

    pub fn viewport_mode(&self) -> ViewportMode {
        self.viewport.mode()
    }

    pub fn is_grid_visible(&self) -> bool {
        self.grid.is_visible()
    }

    pub fn is_snap_to_grid(&self) -> bool {
        self.grid.is_snap_enabled()
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale()
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.transform.pan_offset()
    }

    /// Zoom label value, e.g. `130` for 130%.
    pub fn zoom_percent(&self) -> u32 {
        self.transform.zoom_percent()
    }

    /// The bundle most recently handed to the sink.
    pub fn synced(&self) -> Option<&SourceBundle> {
        self.code.last()
    }

    pub fn sink(&self) -> &S {
        self.code.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.code.sink_mut()
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Workspace,
    Surface,
}

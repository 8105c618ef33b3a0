//! Selection and manipulation.
//!
//! The [`Manipulator`] translates input events into [`Action`]s that the
//! editor applies: selection changes, workspace pans, element mutations
//! and history commits. It holds only gesture state; selection, grid and
//! transform live with the editor and arrive through a [`PointerContext`].
//!
//! | Gesture | Starts on | Moves | Ends on |
//! |---------|-----------|-------|---------|
//! | Drag | primary down over the selected element | element `left`/`top` | pointer up |
//! | Pan | middle down anywhere in the workspace | workspace pan | pointer up or leave |
//!
//! Drag positions are always computed from the drag-start offset, never
//! accumulated from deltas: `new = pointer / scale − start`, snapped to
//! the grid when snapping is on.

use crate::grid::GridService;
use crate::input::{InputEvent, PointerButton};
use crate::sync::CanvasMutation;
use kurbo::{Point, Vec2};
use livepage_core::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active tool. Tools only change the surface cursor; selection and
/// dragging work the same under each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Text,
    Image,
}

impl ToolKind {
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Rectangle => "crosshair",
            Self::Text => "text",
            Self::Image => "copy",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Rectangle => "rectangle",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(Self::Select),
            "rectangle" => Ok(Self::Rectangle),
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

/// Cursor shown while panning.
pub const PAN_CURSOR: &str = "grabbing";

/// Manipulation mode; exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Panning,
    Dragging,
}

/// What the editor should do in response to an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select(ElementRef),
    Deselect,
    /// Set the workspace pan offset.
    PanTo(Vec2),
    Mutate(CanvasMutation),
    /// A gesture finished with a change worth an undo step.
    Commit,
    SetCursor(&'static str),
}

/// Editor state an event is interpreted against.
#[derive(Debug, Clone, Copy)]
pub struct PointerContext<'a> {
    /// Element under the pointer (content space), if any.
    pub hit: Option<ElementRef>,
    pub selected: Option<ElementRef>,
    /// Inline `left`/`top` of the selected element, 0 when unset.
    pub selected_origin: Point,
    /// Inline `transition` of the selected element.
    pub selected_transition: Option<&'a str>,
    pub scale: f64,
    pub pan: Vec2,
    pub grid: &'a GridService,
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    target: ElementRef,
    /// `pointer / scale − origin` at drag start.
    start: Vec2,
    /// Inline `transition` suspended for the drag.
    suspended: Option<String>,
    moved: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Panning {
        /// `pointer − pan` at pan start.
        start: Vec2,
    },
    Dragging(DragState),
}

#[derive(Debug, Clone)]
pub struct Manipulator {
    tool: ToolKind,
    gesture: Gesture,
}

impl Default for Manipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Manipulator {
    pub fn new() -> Self {
        Self {
            tool: ToolKind::Select,
            gesture: Gesture::Idle,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools; returns the cursor to show.
    pub fn set_tool(&mut self, tool: ToolKind) -> &'static str {
        self.tool = tool;
        log::debug!("tool: {tool}");
        tool.cursor()
    }

    pub fn mode(&self) -> Mode {
        match self.gesture {
            Gesture::Idle => Mode::Idle,
            Gesture::Panning { .. } => Mode::Panning,
            Gesture::Dragging(_) => Mode::Dragging,
        }
    }

    /// Drop any gesture in progress without producing actions. Used when
    /// the document is replaced underneath a drag.
    pub fn abort(&mut self) {
        self.gesture = Gesture::Idle;
    }

    // ─── Workspace channel ───────────────────────────────────────────────

    /// Middle-button panning over the whole workspace.
    pub fn handle_workspace(&mut self, event: &InputEvent, ctx: &PointerContext<'_>) -> Vec<Action> {
        match (event, &self.gesture) {
            (
                InputEvent::PointerDown {
                    x,
                    y,
                    button: PointerButton::Middle,
                    ..
                },
                Gesture::Idle,
            ) => {
                self.gesture = Gesture::Panning {
                    start: Vec2::new(*x, *y) - ctx.pan,
                };
                log::debug!("pan start");
                vec![Action::SetCursor(PAN_CURSOR)]
            }
            (InputEvent::PointerMove { x, y, .. }, Gesture::Panning { start }) => {
                let pan = Vec2::new(*x, *y) - *start;
                log::trace!("pan to {pan:?}");
                vec![Action::PanTo(pan)]
            }
            (InputEvent::PointerUp { .. } | InputEvent::PointerLeave, Gesture::Panning { .. }) => {
                self.gesture = Gesture::Idle;
                log::debug!("pan end");
                vec![Action::SetCursor(self.tool.cursor())]
            }
            _ => vec![],
        }
    }

    // ─── Surface channel ─────────────────────────────────────────────────

    /// Clicks and element dragging inside the canvas document.
    pub fn handle_surface(&mut self, event: &InputEvent, ctx: &PointerContext<'_>) -> Vec<Action> {
        match event {
            InputEvent::Click { .. } => match ctx.hit {
                Some(hit) => vec![Action::Select(hit)],
                None if ctx.selected.is_some() => vec![Action::Deselect],
                None => vec![],
            },

            InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Primary,
                ..
            } => {
                if !matches!(self.gesture, Gesture::Idle) {
                    return vec![];
                }
                let (Some(selected), Some(hit)) = (ctx.selected, ctx.hit) else {
                    return vec![];
                };
                if selected != hit {
                    return vec![];
                }
                let start = Vec2::new(x / ctx.scale, y / ctx.scale) - ctx.selected_origin.to_vec2();
                self.gesture = Gesture::Dragging(DragState {
                    target: selected,
                    start,
                    suspended: ctx.selected_transition.map(str::to_string),
                    moved: false,
                });
                log::debug!("drag start at {start:?}");
                vec![Action::Mutate(CanvasMutation::set_style(
                    selected,
                    "transition",
                    "none",
                ))]
            }

            InputEvent::PointerMove { x, y, .. } => {
                let Gesture::Dragging(drag) = &mut self.gesture else {
                    return vec![];
                };
                let new_x = ctx.grid.snap(x / ctx.scale - drag.start.x);
                let new_y = ctx.grid.snap(y / ctx.scale - drag.start.y);
                drag.moved = true;
                log::trace!("drag to ({new_x}, {new_y})");
                let target = drag.target;
                vec![
                    Action::Mutate(CanvasMutation::set_style(target, "position", "absolute")),
                    Action::Mutate(CanvasMutation::set_style(target, "left", px(new_x))),
                    Action::Mutate(CanvasMutation::set_style(target, "top", px(new_y))),
                ]
            }

            InputEvent::PointerUp { .. } => {
                let Gesture::Dragging(drag) = std::mem::replace(&mut self.gesture, Gesture::Idle)
                else {
                    return vec![];
                };
                log::debug!("drag end (moved: {})", drag.moved);
                let restore = match drag.suspended {
                    Some(previous) => CanvasMutation::set_style(drag.target, "transition", previous),
                    None => CanvasMutation::RemoveStyle {
                        target: drag.target,
                        property: "transition".to_string(),
                    },
                };
                let mut actions = vec![Action::Mutate(restore)];
                if drag.moved {
                    actions.push(Action::Commit);
                }
                actions
            }

            _ => vec![],
        }
    }
}

/// Format a pixel length the way the style attribute stores it.
pub fn px(value: f64) -> String {
    // `+ 0.0` turns -0 into 0
    format!("{}px", value + 0.0)
}

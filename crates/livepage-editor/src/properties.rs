//! Property panel bridge.
//!
//! Reads the selected element's visual properties into editable text
//! fields and turns a single field edit back into style mutations. Fields
//! never batch: one edit writes one property (plus `position: absolute`
//! for position edits).

use crate::error::{EditorError, EditorResult};
use crate::surface::SurfaceAdapter;
use crate::sync::CanvasMutation;
use crate::tools::px;
use livepage_core::css::parse_px;
use livepage_core::{Color, ElementRef};
use std::fmt;

/// One editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelField {
    Background,
    Width,
    Height,
    Left,
    Top,
}

impl PanelField {
    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "bg-color",
            Self::Width => "width",
            Self::Height => "height",
            Self::Left => "pos-x",
            Self::Top => "pos-y",
        }
    }
}

impl fmt::Display for PanelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field values as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelFields {
    /// Lowercase `#rrggbb`.
    pub background: String,
    /// Integer px of the content box; empty when zero.
    pub width: String,
    pub height: String,
    /// Integer px of the inline offset; `0` when unset.
    pub left: String,
    pub top: String,
}

impl Default for PanelFields {
    /// Nothing selected.
    fn default() -> Self {
        Self {
            background: "#000000".to_string(),
            width: String::new(),
            height: String::new(),
            left: String::new(),
            top: String::new(),
        }
    }
}

impl PanelFields {
    pub fn get(&self, field: PanelField) -> &str {
        match field {
            PanelField::Background => &self.background,
            PanelField::Width => &self.width,
            PanelField::Height => &self.height,
            PanelField::Left => &self.left,
            PanelField::Top => &self.top,
        }
    }
}

/// Truncate like `parseInt`.
fn int_px(value: f64) -> i64 {
    value.trunc() as i64
}

#[derive(Debug, Clone, Default)]
pub struct PropertyPanel {
    fields: PanelFields,
}

impl PropertyPanel {
    pub fn fields(&self) -> &PanelFields {
        &self.fields
    }

    /// Re-read the fields from `selected`; defaults when nothing is
    /// selected or the reference is stale.
    pub fn refresh(&mut self, surface: &SurfaceAdapter, selected: Option<ElementRef>) -> &PanelFields {
        self.fields = selected
            .and_then(|target| read_fields(surface, target))
            .unwrap_or_default();
        &self.fields
    }

    /// Turn an edit of `field` into mutations of `target`.
    pub fn edit(
        &self,
        target: ElementRef,
        field: PanelField,
        value: &str,
    ) -> EditorResult<Vec<CanvasMutation>> {
        let value = value.trim();
        let invalid = || EditorError::InvalidValue {
            field: field.name(),
            value: value.to_string(),
        };

        match field {
            PanelField::Background => {
                Color::parse(value).ok_or_else(invalid)?;
                Ok(vec![CanvasMutation::set_style(
                    target,
                    "background-color",
                    value,
                )])
            }
            PanelField::Width | PanelField::Height => {
                let n = parse_number(value).ok_or_else(invalid)?;
                let property = if field == PanelField::Width {
                    "width"
                } else {
                    "height"
                };
                Ok(vec![CanvasMutation::set_style(target, property, px(n))])
            }
            PanelField::Left | PanelField::Top => {
                let n = parse_number(value).ok_or_else(invalid)?;
                let property = if field == PanelField::Left {
                    "left"
                } else {
                    "top"
                };
                Ok(vec![
                    CanvasMutation::set_style(target, "position", "absolute"),
                    CanvasMutation::set_style(target, property, px(n)),
                ])
            }
        }
    }
}

fn read_fields(surface: &SurfaceAdapter, target: ElementRef) -> Option<PanelFields> {
    let style = surface.computed_style(target)?;
    let content = surface.bounds(target).map(|b| b.content).unwrap_or_default();
    let size = |v: f64| match int_px(v) {
        0 => String::new(),
        n => n.to_string(),
    };
    let offset = |property| {
        surface
            .inline_style(target, property)
            .and_then(|v| parse_px(&v))
            .map_or(0, int_px)
            .to_string()
    };
    Some(PanelFields {
        background: style.background_color().to_hex(),
        width: size(content.width()),
        height: size(content.height()),
        left: offset("left"),
        top: offset("top"),
    })
}

/// A number, optionally suffixed with `px`.
fn parse_number(value: &str) -> Option<f64> {
    let digits = value.strip_suffix("px").unwrap_or(value).trim();
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

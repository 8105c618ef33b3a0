//! Editor configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it
//! changes:
//!
//! ```json
//! { "grid": { "quantum": 10 }, "load": { "dwell_ms": 0 } }
//! ```

use crate::error::{EditorError, EditorResult};
use crate::viewport::ViewportMode;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomConfig,
    pub grid: GridConfig,
    pub load: LoadConfig,
    pub viewports: ViewportPresets,
    /// Visible size of the workspace the surface sits in, in px.
    pub container: SizeConfig,
    /// Maximum number of history entries kept.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomConfig::default(),
            grid: GridConfig::default(),
            load: LoadConfig::default(),
            viewports: ViewportPresets::default(),
            container: SizeConfig {
                width: 1200.0,
                height: 800.0,
            },
            history_limit: 200,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(text: &str) -> EditorResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.zoom.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Scale change per wheel notch.
    pub wheel_step: f64,
    /// Scale change per zoom button press.
    pub button_step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 2.0,
            wheel_step: 0.1,
            button_step: 0.1,
        }
    }
}

impl ZoomConfig {
    /// Bounds must be finite with `0 < min <= max`; steps finite and
    /// non-negative.
    pub fn validate(&self) -> EditorResult<()> {
        let finite = [self.min, self.max, self.wheel_step, self.button_step]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(EditorError::InvalidConfig(format!(
                "zoom values must be finite: {self:?}"
            )));
        }
        if self.min <= 0.0 || self.min > self.max {
            return Err(EditorError::InvalidConfig(format!(
                "zoom bounds need 0 < min <= max, got min {} max {}",
                self.min, self.max
            )));
        }
        if self.wheel_step < 0.0 || self.button_step < 0.0 {
            return Err(EditorError::InvalidConfig(format!(
                "zoom steps must not be negative: {self:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid cell size and snap step, in px.
    pub quantum: u32,
    pub visible: bool,
    pub snap: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            quantum: 20,
            visible: false,
            snap: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub dwell_ms: u64,
    pub settle_ms: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 500,
            settle_ms: 100,
        }
    }
}

impl LoadConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeConfig {
    pub width: f64,
    pub height: f64,
}

impl From<SizeConfig> for Size {
    fn from(s: SizeConfig) -> Self {
        Size::new(s.width, s.height)
    }
}

/// Fixed surface sizes of the emulated devices. Desktop has none: it
/// fills the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportPresets {
    pub tablet: SizeConfig,
    pub mobile: SizeConfig,
}

impl Default for ViewportPresets {
    fn default() -> Self {
        Self {
            tablet: SizeConfig {
                width: 768.0,
                height: 1024.0,
            },
            mobile: SizeConfig {
                width: 375.0,
                height: 667.0,
            },
        }
    }
}

impl ViewportPresets {
    /// Fixed size for `mode`, `None` for Desktop.
    pub fn size_of(&self, mode: ViewportMode) -> Option<Size> {
        match mode {
            ViewportMode::Desktop => None,
            ViewportMode::Tablet => Some(self.tablet.into()),
            ViewportMode::Mobile => Some(self.mobile.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorConfig::from_json(r#"{ "grid": { "quantum": 10 }, "history_limit": 5 }"#)
            .unwrap();
        assert_eq!(cfg.grid.quantum, 10);
        assert!(!cfg.grid.snap);
        assert_eq!(cfg.history_limit, 5);
        assert_eq!(cfg.zoom, ZoomConfig::default());
        assert_eq!(cfg.load.dwell(), Duration::from_millis(500));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EditorConfig::from_json("{ grid: ").unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn unusable_zoom_bounds_are_rejected() {
        for text in [
            r#"{"zoom":{"min":2.0,"max":0.1}}"#,
            r#"{"zoom":{"min":0.0}}"#,
            r#"{"zoom":{"wheel_step":-0.1}}"#,
            r#"{"zoom":{"max":1e400}}"#,
        ] {
            let err = EditorConfig::from_json(text).unwrap_err();
            assert!(
                matches!(err, EditorError::InvalidConfig(_) | EditorError::Config(_)),
                "{text}: {err}"
            );
        }
        let err = EditorConfig::from_json(r#"{"zoom":{"min":2.0,"max":0.1}}"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
        assert!(ZoomConfig::default().validate().is_ok());
        assert!(
            ZoomConfig {
                max: f64::NAN,
                ..ZoomConfig::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn viewport_presets() {
        let presets = ViewportPresets::default();
        assert_eq!(presets.size_of(ViewportMode::Desktop), None);
        assert_eq!(
            presets.size_of(ViewportMode::Mobile),
            Some(Size::new(375.0, 667.0))
        );
    }
}

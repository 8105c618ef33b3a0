//! Device viewport emulation.

use crate::config::ViewportPresets;
use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl ViewportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("unknown viewport mode: {other}")),
        }
    }
}

/// Result of switching modes: what the surface and transform should become.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLayout {
    /// Logical size of the surface.
    pub frame: Size,
    /// Pan that centers the scaled surface in the container.
    pub pan: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct ViewportEmulator {
    mode: ViewportMode,
    presets: ViewportPresets,
}

impl ViewportEmulator {
    pub fn new(presets: ViewportPresets) -> Self {
        Self {
            mode: ViewportMode::Desktop,
            presets,
        }
    }

    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    /// Logical surface size for the current mode. Desktop fills the container.
    pub fn frame_size(&self, container: Size) -> Size {
        self.presets.size_of(self.mode).unwrap_or(container)
    }

    /// Switch to `mode` and compute the centered placement at `scale`:
    /// `pan = (container − frame × scale) / 2` on both axes.
    pub fn set_mode(&mut self, mode: ViewportMode, container: Size, scale: f64) -> ViewportLayout {
        self.mode = mode;
        let frame = self.frame_size(container);
        let pan = Vec2::new(
            (container.width - frame.width * scale) / 2.0,
            (container.height - frame.height * scale) / 2.0,
        );
        log::debug!("viewport {mode}: {}x{} at {pan:?}", frame.width, frame.height);
        ViewportLayout { frame, pan }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONTAINER: Size = Size::new(1200.0, 800.0);

    #[test]
    fn tablet_is_centered_at_scale() {
        let mut emu = ViewportEmulator::default();
        let layout = emu.set_mode(ViewportMode::Tablet, CONTAINER, 0.5);
        assert_eq!(layout.frame, Size::new(768.0, 1024.0));
        assert_eq!(layout.pan, Vec2::new(408.0, 144.0));
        assert_eq!(emu.mode(), ViewportMode::Tablet);
    }

    #[test]
    fn desktop_fills_container() {
        let mut emu = ViewportEmulator::default();
        let layout = emu.set_mode(ViewportMode::Desktop, CONTAINER, 1.0);
        assert_eq!(layout.frame, CONTAINER);
        assert_eq!(layout.pan, Vec2::ZERO);
    }

    #[test]
    fn mode_names() {
        assert_eq!("mobile".parse::<ViewportMode>(), Ok(ViewportMode::Mobile));
        assert!("watch".parse::<ViewportMode>().is_err());
        assert_eq!(ViewportMode::Tablet.to_string(), "tablet");
    }
}

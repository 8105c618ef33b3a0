//! Grid overlay and snapping.

use crate::config::GridConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridService {
    visible: bool,
    snap: bool,
    quantum: u32,
}

impl Default for GridService {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridService {
    pub fn new(config: GridConfig) -> Self {
        Self {
            visible: config.visible,
            snap: config.snap,
            quantum: config.quantum.max(1),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_snap_enabled(&self) -> bool {
        self.snap
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Flip visibility; returns the overlay to apply.
    pub fn toggle_visible(&mut self) -> String {
        self.visible = !self.visible;
        log::debug!("grid visible: {}", self.visible);
        self.overlay()
    }

    pub fn toggle_snap(&mut self) {
        self.snap = !self.snap;
        log::debug!("snap to grid: {}", self.snap);
    }

    /// CSS `background` of the surface: a `quantum`-sized SVG tile with
    /// 1px lines on its left and top edge, or `none`.
    pub fn overlay(&self) -> String {
        if !self.visible {
            return "none".to_string();
        }
        let q = self.quantum;
        format!(
            "url('data:image/svg+xml;utf8,<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{q}\" height=\"{q}\" fill=\"none\"><rect width=\"100%\" height=\"100%\" fill=\"none\"/><rect width=\"1\" height=\"100%\" fill=\"rgba(255,255,255,0.1)\"/><rect width=\"100%\" height=\"1\" fill=\"rgba(255,255,255,0.1)\"/></svg>')"
        )
    }

    /// Round to the nearest multiple of the quantum when snapping is on.
    /// Halves round up, towards positive infinity.
    pub fn snap(&self, value: f64) -> f64 {
        if !self.snap {
            return value;
        }
        let q = f64::from(self.quantum);
        (value / q + 0.5).floor() * q
    }
}

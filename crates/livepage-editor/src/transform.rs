//! Workspace pan/zoom.
//!
//! The engine owns the workspace transform (pan in screen px, uniform
//! scale). Visual updates are coalesced: [`TransformEngine::apply_transform`]
//! only marks the transform dirty, and the host's next display-refresh
//! tick collects at most one [`SurfaceTransform`] via
//! [`TransformEngine::take_frame`].

use crate::config::ZoomConfig;
use kurbo::{Affine, Point, Vec2};
use std::fmt;

/// The visual transform pushed to the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    pub translate: Vec2,
    pub scale: f64,
}

impl SurfaceTransform {
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }
}

impl fmt::Display for SurfaceTransform {
    /// CSS form: `translate(Xpx, Ypx) scale(S)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px) scale({})",
            self.translate.x, self.translate.y, self.scale
        )
    }
}

#[derive(Debug, Clone)]
pub struct TransformEngine {
    pan: Vec2,
    scale: f64,
    limits: ZoomConfig,
    pending: bool,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl TransformEngine {
    /// Unusable bounds fall back to the defaults.
    pub fn new(limits: ZoomConfig) -> Self {
        let limits = match limits.validate() {
            Ok(()) => limits,
            Err(err) => {
                log::warn!("{err}; using default zoom bounds");
                ZoomConfig::default()
            }
        };
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            limits,
            pending: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    /// Shift the pan offset. Panning is unbounded; non-finite deltas are
    /// ignored.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            log::debug!("ignoring pan by ({dx}, {dy})");
            return;
        }
        self.pan += Vec2::new(dx, dy);
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = pan;
    }

    /// Add `delta` to the scale, clamped to the configured bounds.
    /// Non-finite deltas are ignored.
    pub fn zoom(&mut self, delta: f64) {
        if !delta.is_finite() {
            log::debug!("ignoring zoom by {delta}");
            return;
        }
        self.scale = (self.scale + delta).clamp(self.limits.min, self.limits.max);
        log::trace!("zoom {delta:+} -> {}", self.scale);
    }

    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            log::debug!("ignoring scale {scale}");
            return;
        }
        self.scale = scale.clamp(self.limits.min, self.limits.max);
    }

    /// Zoom for one wheel notch; scrolling down zooms out.
    pub fn wheel(&mut self, delta_y: f64) {
        let step = self.limits.wheel_step;
        self.zoom(if delta_y > 0.0 { -step } else { step });
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.limits.button_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(-self.limits.button_step);
    }

    /// Map a screen point to content-local coordinates.
    ///
    /// Only the scale is removed. Pan is not subtracted: drag positions
    /// are computed relative to the drag-start point in this same space,
    /// so the offset cancels.
    pub fn to_content(&self, screen: Point) -> Point {
        Point::new(screen.x / self.scale, screen.y / self.scale)
    }

    /// Request a visual update on the next frame.
    pub fn apply_transform(&mut self) {
        self.pending = true;
    }

    /// Called once per display-refresh tick. Yields the transform if any
    /// update was requested since the last tick.
    pub fn take_frame(&mut self) -> Option<SurfaceTransform> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        Some(self.current())
    }

    pub fn current(&self) -> SurfaceTransform {
        SurfaceTransform {
            translate: self.pan,
            scale: self.scale,
        }
    }

    /// Scale 1, no pan.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Zoom label value: `round(scale × 100)`.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zoom_is_clamped() {
        let mut t = TransformEngine::default();
        for _ in 0..50 {
            t.zoom(0.7);
        }
        assert_eq!(t.scale(), 2.0);
        t.zoom(-100.0);
        assert_eq!(t.scale(), 0.1);
        t.zoom(f64::MAX);
        assert_eq!(t.scale(), 2.0);
    }

    #[test]
    fn non_finite_input_leaves_scale_alone() {
        let mut t = TransformEngine::default();
        t.zoom(f64::NAN);
        t.zoom(f64::INFINITY);
        t.set_scale(f64::NEG_INFINITY);
        assert_eq!(t.scale(), 1.0);
        t.zoom(0.5);
        assert_eq!(t.scale(), 1.5);

        t.pan(f64::NAN, 3.0);
        assert_eq!(t.pan_offset(), Vec2::ZERO);
    }

    #[test]
    fn inverted_bounds_fall_back_to_defaults() {
        let mut t = TransformEngine::new(ZoomConfig {
            min: 2.0,
            max: 0.1,
            ..ZoomConfig::default()
        });
        t.zoom(0.5);
        assert_eq!(t.scale(), 1.5);
        t.zoom(-10.0);
        assert_eq!(t.scale(), 0.1);
    }

    #[test]
    fn three_notches_in() {
        let mut t = TransformEngine::default();
        t.zoom(0.1);
        t.zoom(0.1);
        t.zoom(0.1);
        assert!((t.scale() - 1.3).abs() < 1e-9);
        assert_eq!(t.zoom_percent(), 130);
    }

    #[test]
    fn wheel_direction() {
        let mut t = TransformEngine::default();
        t.wheel(120.0);
        assert!((t.scale() - 0.9).abs() < 1e-9);
        t.wheel(-120.0);
        t.wheel(-120.0);
        assert!((t.scale() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn content_mapping_ignores_pan() {
        let mut t = TransformEngine::default();
        t.pan(300.0, -40.0);
        t.set_scale(2.0);
        assert_eq!(t.to_content(Point::new(100.0, 50.0)), Point::new(50.0, 25.0));
    }

    #[test]
    fn frames_coalesce() {
        let mut t = TransformEngine::default();
        assert_eq!(t.take_frame(), None);
        t.pan(10.0, 0.0);
        t.apply_transform();
        t.zoom(0.5);
        t.apply_transform();
        t.apply_transform();
        let frame = t.take_frame().unwrap();
        assert_eq!(frame.to_string(), "translate(10px, 0px) scale(1.5)");
        assert_eq!(t.take_frame(), None);
    }

    #[test]
    fn reset_restores_identity() {
        let mut t = TransformEngine::default();
        t.pan(5.0, 5.0);
        t.zoom(0.4);
        t.reset();
        assert_eq!(t.current().to_affine(), Affine::IDENTITY);
    }
}

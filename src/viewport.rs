//! Pan/zoom state of the map canvas.
//!
//! The windowing layer turns wheel, pinch and drag input into deltas; this
//! module owns the resulting [`ViewTransform`] and keeps it inside the
//! bounds of the active [`ViewportProfile`].

use crate::profile::{PanBounds, ViewportProfile};

/// `translate(x, y) scale(k)` applied to the projected map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Map space → canvas space.
    pub fn apply(&self, [px, py]: [f64; 2]) -> [f64; 2] {
        [px * self.k + self.x, py * self.k + self.y]
    }

    /// Canvas space → map space.
    pub fn invert(&self, [cx, cy]: [f64; 2]) -> [f64; 2] {
        [(cx - self.x) / self.k, (cy - self.y) / self.k]
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Change requested by one gesture step: offsets add, scale multiplies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl TransformDelta {
    pub fn pan(dx: f64, dy: f64) -> Self {
        Self { x: dx, y: dy, k: 1.0 }
    }

    pub fn zoom(factor: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Wheel,
    Touch,
    /// Primary-button press that would start a drag.
    DragStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Whether a gesture should reach the pan/zoom behaviour at all.
///
/// Wheel and touch work anywhere on the canvas. A drag may not start on a
/// country shape, so that a click on a country is not swallowed as a pan.
pub fn gesture_allowed(kind: GestureKind, button: PointerButton, over_country: bool) -> bool {
    match kind {
        GestureKind::Wheel | GestureKind::Touch => true,
        GestureKind::DragStart => button == PointerButton::Primary && !over_country,
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    profile: ViewportProfile,
    /// Visible canvas size in map units.
    viewport: (f64, f64),
    transform: ViewTransform,
}

impl ViewportController {
    pub fn new(profile: ViewportProfile) -> Self {
        let viewport = profile.canvas;
        let transform = profile.initial;
        Self {
            profile,
            viewport,
            transform,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn profile(&self) -> &ViewportProfile {
        &self.profile
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Swap device class. The view returns to the new profile's default.
    pub fn set_profile(&mut self, profile: ViewportProfile) {
        self.viewport = profile.canvas;
        self.transform = profile.initial;
        self.profile = profile;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        self.transform = self.clamped(self.transform);
    }

    /// Apply a gesture delta. Deltas with a non-finite component are dropped.
    pub fn apply_delta(&mut self, delta: TransformDelta) -> ViewTransform {
        if !(delta.x.is_finite() && delta.y.is_finite() && delta.k.is_finite()) {
            tracing::trace!(?delta, "ignoring non-finite transform delta");
            return self.transform;
        }
        let t = self.transform;
        self.transform = self.clamped(ViewTransform {
            x: t.x + delta.x,
            y: t.y + delta.y,
            k: t.k * delta.k,
        });
        self.transform
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> ViewTransform {
        self.apply_delta(TransformDelta::pan(dx, dy))
    }

    /// Zoom by `factor`, keeping the map point under `anchor` (canvas
    /// coordinates) where it is.
    pub fn zoom_at(&mut self, factor: f64, anchor: [f64; 2]) -> ViewTransform {
        if !(factor.is_finite() && anchor.iter().all(|v| v.is_finite())) {
            return self.transform;
        }
        let t = self.transform;
        let k = self.clamp_scale(t.k * factor);
        let [mx, my] = t.invert(anchor);
        self.transform = self.clamped(ViewTransform {
            x: anchor[0] - mx * k,
            y: anchor[1] - my * k,
            k,
        });
        self.transform
    }

    /// Back to the profile's initial transform, exactly.
    pub fn reset(&mut self) -> ViewTransform {
        self.transform = self.profile.initial;
        self.transform
    }

    /// Unzoomed view: scale 1, no offset. Not clamped; the next gesture
    /// brings the scale back into range.
    pub fn center(&mut self) -> ViewTransform {
        self.transform = ViewTransform::IDENTITY;
        self.transform
    }

    fn clamp_scale(&self, k: f64) -> f64 {
        if k.is_nan() {
            return self.profile.min_scale;
        }
        k.clamp(self.profile.min_scale, self.profile.max_scale)
    }

    /// Allowed `(x, y)` offset ranges at scale `k`.
    pub fn offset_range(&self, k: f64) -> ((f64, f64), (f64, f64)) {
        match self.profile.pan {
            PanBounds::Fixed { x, y } => ((-x, x), (-y, y)),
            PanBounds::Overflow {
                near_default_y,
                near_default_factor,
            } => {
                let (canvas_w, canvas_h) = self.profile.canvas;
                let (view_w, view_h) = self.viewport;

                let overflow_x = (canvas_w * k - view_w).max(0.0);
                let y_range = if k <= self.profile.min_scale * near_default_factor {
                    (-near_default_y, near_default_y)
                } else {
                    let overflow_y = (canvas_h * k - view_h).max(near_default_y);
                    (-overflow_y, near_default_y)
                };
                ((-overflow_x, 0.0), y_range)
            }
        }
    }

    fn clamped(&self, t: ViewTransform) -> ViewTransform {
        let k = self.clamp_scale(t.k);
        let ((min_x, max_x), (min_y, max_y)) = self.offset_range(k);
        ViewTransform {
            x: t.x.clamp(min_x, max_x),
            y: t.y.clamp(min_y, max_y),
            k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_at_initial_transform() {
        let vc = ViewportController::new(ViewportProfile::desktop());
        assert_eq!(vc.transform(), ViewTransform { x: 0.0, y: -15.0, k: 1.2 });
    }

    #[test]
    fn scale_clamps_to_nearest_bound() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        assert_eq!(vc.apply_delta(TransformDelta::zoom(0.1)).k, 1.2);
        assert_eq!(vc.apply_delta(TransformDelta::zoom(1000.0)).k, 8.0);

        let mut mobile = ViewportController::new(ViewportProfile::mobile());
        assert_eq!(mobile.apply_delta(TransformDelta::zoom(0.5)).k, 3.0);
        assert_eq!(mobile.apply_delta(TransformDelta::zoom(100.0)).k, 12.0);
    }

    #[test]
    fn non_finite_gestures_leave_the_view_alone() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        let before = vc.pan(-50.0, 10.0);
        assert_eq!(vc.pan(f64::NAN, 0.0), before);
        assert_eq!(vc.pan(0.0, f64::INFINITY), before);
        assert_eq!(vc.apply_delta(TransformDelta::zoom(f64::NAN)), before);
        assert_eq!(vc.zoom_at(2.0, [f64::NAN, 10.0]), before);
        // Still usable afterwards.
        assert_eq!(vc.pan(10.0, 0.0).x, before.x + 10.0);
    }

    #[test]
    fn reset_is_exact_after_any_gestures() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        vc.zoom_at(3.7, [123.4, 456.7]);
        vc.pan(-91.3, 17.9);
        vc.center();
        assert_eq!(vc.reset(), ViewportProfile::desktop().initial);
    }

    #[test]
    fn center_is_unit_scale_without_offset() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        vc.zoom_at(2.0, [500.0, 350.0]);
        assert_eq!(vc.center(), ViewTransform::IDENTITY);
        // The next gesture pulls scale back into range.
        assert_eq!(vc.pan(0.0, 0.0).k, 1.2);
    }

    #[test]
    fn horizontal_pan_cannot_expose_empty_canvas() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        let t = vc.pan(500.0, 0.0);
        assert_eq!(t.x, 0.0);
        let t = vc.pan(-5000.0, 0.0);
        // 1000 * 1.2 - 1000
        assert!((t.x + 200.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_pan_is_tight_at_default_and_widens_when_zoomed() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        assert_eq!(vc.pan(0.0, -500.0).y, -20.0);
        assert_eq!(vc.pan(0.0, 500.0).y, 20.0);

        vc.apply_delta(TransformDelta::zoom(3.0));
        let t = vc.pan(0.0, -5000.0);
        // 700 * 3.6 - 700
        assert!((t.y + 1820.0).abs() < 1e-9);
    }

    #[test]
    fn mobile_uses_fixed_ranges() {
        let mut vc = ViewportController::new(ViewportProfile::mobile());
        vc.apply_delta(TransformDelta::zoom(4.0));
        let t = vc.pan(-10_000.0, 10_000.0);
        assert_eq!((t.x, t.y), (-100.0, 40.0));
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        vc.pan(-100.0, 0.0);
        let before = vc.transform();
        let anchor = [300.0, 200.0];
        let map_point = before.invert(anchor);
        let after = vc.zoom_at(1.5, anchor);
        let [ax, _] = after.apply(map_point);
        assert!((ax - anchor[0]).abs() < 1e-9);
    }

    #[test]
    fn resize_reclamps() {
        let mut vc = ViewportController::new(ViewportProfile::desktop());
        vc.pan(-200.0, 0.0);
        vc.resize(1100.0, 700.0);
        assert!((vc.transform().x + 100.0).abs() < 1e-9);
    }

    #[test]
    fn drag_is_suppressed_over_countries() {
        assert!(gesture_allowed(GestureKind::Wheel, PointerButton::Primary, true));
        assert!(gesture_allowed(GestureKind::Touch, PointerButton::Primary, true));
        assert!(gesture_allowed(GestureKind::DragStart, PointerButton::Primary, false));
        assert!(!gesture_allowed(GestureKind::DragStart, PointerButton::Primary, true));
        assert!(!gesture_allowed(GestureKind::DragStart, PointerButton::Secondary, false));
    }
}

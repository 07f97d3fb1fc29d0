//! Device-class constants, chosen once and handed to every consumer.

use crate::codes::Iso2Code;
use crate::projection::{ProjectionConfig, ProjectionKind};
use crate::viewport::ViewTransform;

/// Viewports narrower than this (CSS pixels) get the mobile profile.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// How far the map may be panned, per device class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanBounds {
    /// Derived from how far the scaled map overflows the viewport.
    Overflow {
        /// Half-width of the vertical band allowed near the default zoom.
        near_default_y: f64,
        /// Scales up to `min_scale * near_default_factor` count as "near default".
        near_default_factor: f64,
    },
    /// Fixed symmetric ranges, independent of map size.
    Fixed { x: f64, y: f64 },
}

/// Hit-test tuning for shapes whose outlines produce false pointer hits.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRules {
    pub island_codes: Vec<Iso2Code>,
    /// Clicks on an island are dropped once its rendered box exceeds this.
    pub max_island_size: f64,
    pub large_codes: Vec<Iso2Code>,
    /// Hover on a large country must land within this margin of its box.
    pub hover_margin: f64,
    /// Country whose rendered box must be at least `min_shape_size` to hover.
    pub min_size_code: Iso2Code,
    pub min_shape_size: f64,
}

impl Default for HitRules {
    fn default() -> Self {
        let codes = |list: &[&str]| list.iter().map(Iso2Code::new).collect();
        Self {
            island_codes: codes(&["BM", "CV", "IC", "SH", "GS", "FK", "IO"]),
            max_island_size: 50.0,
            large_codes: codes(&["GB", "RU", "CN", "US", "CA", "AU"]),
            hover_margin: 20.0,
            min_size_code: Iso2Code::new("RU"),
            min_shape_size: 100.0,
        }
    }
}

/// Everything that differs between desktop and mobile rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportProfile {
    pub device: DeviceClass,
    /// Canvas (viewBox) size in map units.
    pub canvas: (f64, f64),
    pub projection: ProjectionConfig,
    pub min_scale: f64,
    pub max_scale: f64,
    pub initial: ViewTransform,
    pub pan: PanBounds,
    pub hit: HitRules,
}

impl ViewportProfile {
    pub fn desktop() -> Self {
        Self {
            device: DeviceClass::Desktop,
            canvas: (1000.0, 700.0),
            projection: ProjectionConfig {
                kind: ProjectionKind::NaturalEarth1,
                scale: 200.0,
                translate: (500.0, 300.0),
            },
            min_scale: 1.2,
            max_scale: 8.0,
            initial: ViewTransform {
                x: 0.0,
                y: -15.0,
                k: 1.2,
            },
            pan: PanBounds::Overflow {
                near_default_y: 20.0,
                near_default_factor: 1.05,
            },
            hit: HitRules::default(),
        }
    }

    pub fn mobile() -> Self {
        Self {
            device: DeviceClass::Mobile,
            canvas: (300.0, 125.0),
            projection: ProjectionConfig {
                kind: ProjectionKind::NaturalEarth1,
                scale: 60.0,
                translate: (120.0, 50.0),
            },
            min_scale: 3.0,
            max_scale: 12.0,
            initial: ViewTransform {
                x: 0.0,
                y: -10.0,
                k: 3.0,
            },
            pan: PanBounds::Fixed { x: 100.0, y: 40.0 },
            hit: HitRules::default(),
        }
    }

    pub fn for_device(device: DeviceClass) -> Self {
        match device {
            DeviceClass::Desktop => Self::desktop(),
            DeviceClass::Mobile => Self::mobile(),
        }
    }

    /// Profile for a viewport of the given CSS pixel width.
    pub fn for_viewport_width(width: f64) -> Self {
        if width < MOBILE_BREAKPOINT {
            Self::mobile()
        } else {
            Self::desktop()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_scale_is_initial_scale() {
        for profile in [ViewportProfile::desktop(), ViewportProfile::mobile()] {
            assert_eq!(profile.min_scale, profile.initial.k);
            assert!(profile.max_scale > profile.min_scale);
        }
    }

    #[test]
    fn breakpoint_selects_device() {
        assert_eq!(ViewportProfile::for_viewport_width(375.0).device, DeviceClass::Mobile);
        assert_eq!(ViewportProfile::for_viewport_width(1280.0).device, DeviceClass::Desktop);
    }
}

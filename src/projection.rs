//! Geographic → map-space projection, one drawable shape per feature.

use std::f64::consts::FRAC_PI_4;
use std::fmt::Write as _;

use crate::geo::{Bounds, CountryFeature, Polygon, Ring};

/// Web Mercator latitude limit; poles project to infinity.
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    #[default]
    NaturalEarth1,
    Equirectangular,
    Mercator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub translate: (f64, f64),
}

impl ProjectionConfig {
    /// Unit-sphere projection of (lon, lat) in degrees, y pointing north.
    fn raw(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lambda = lon.to_radians();
        match self.kind {
            ProjectionKind::NaturalEarth1 => {
                let phi = lat.to_radians();
                let phi2 = phi * phi;
                let phi4 = phi2 * phi2;
                let x = lambda
                    * (0.8707 - 0.131979 * phi2
                        + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
                let y = phi
                    * (1.007226
                        + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
                (x, y)
            }
            ProjectionKind::Equirectangular => (lambda, lat.to_radians()),
            ProjectionKind::Mercator => {
                let phi = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
                (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
            }
        }
    }

    /// Map-space point for (lon, lat), before any pan/zoom.
    pub fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let (x, y) = self.raw(lon, lat);
        [
            x * self.scale + self.translate.0,
            self.translate.1 - y * self.scale,
        ]
    }
}

/// A feature's polygons in map space, with their extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedShape {
    pub polygons: Vec<Polygon>,
    pub bounds: Bounds,
}

impl ProjectedShape {
    /// SVG path data: one `M…Z` subpath per ring.
    pub fn to_path_string(&self) -> String {
        let mut d = String::new();
        for ring in self.polygons.iter().flatten() {
            for (i, [x, y]) in ring.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{cmd}{x:.2},{y:.2}");
            }
            d.push('Z');
        }
        d
    }
}

/// Projects features with a swappable configuration so a device-class
/// change never reloads the dataset.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn reconfigure(&mut self, config: ProjectionConfig) {
        self.config = config;
    }

    /// `None` when nothing drawable survives; callers skip those features.
    pub fn project_feature(&self, feature: &CountryFeature) -> Option<ProjectedShape> {
        let polygons: Vec<Polygon> = feature
            .polygons
            .iter()
            .filter_map(|poly| self.project_polygon(poly))
            .collect();
        let bounds = Bounds::of_polygons(&polygons)?;
        Some(ProjectedShape { polygons, bounds })
    }

    pub fn path(&self, feature: &CountryFeature) -> Option<String> {
        self.project_feature(feature).map(|shape| shape.to_path_string())
    }

    fn project_polygon(&self, poly: &Polygon) -> Option<Polygon> {
        let (outer, holes) = poly.split_first()?;
        if outer.len() < 3 {
            return None;
        }
        let mut rings = vec![self.project_ring(outer)];
        rings.extend(
            holes
                .iter()
                .filter(|hole| hole.len() >= 3)
                .map(|hole| self.project_ring(hole)),
        );
        Some(rings)
    }

    fn project_ring(&self, ring: &Ring) -> Ring {
        ring.iter()
            .map(|&[lon, lat]| self.config.project(lon, lat))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::NativeCode;

    fn config(kind: ProjectionKind) -> ProjectionConfig {
        ProjectionConfig {
            kind,
            scale: 200.0,
            translate: (500.0, 300.0),
        }
    }

    fn feature(polygons: Vec<Polygon>) -> CountryFeature {
        let id = NativeCode::new("FRA");
        CountryFeature {
            iso2: id.resolve(),
            id,
            name: "France".into(),
            bbox: Bounds::of_polygons(&polygons),
            polygons,
            label_pos: None,
        }
    }

    #[test]
    fn origin_maps_to_translate() {
        for kind in [
            ProjectionKind::NaturalEarth1,
            ProjectionKind::Equirectangular,
            ProjectionKind::Mercator,
        ] {
            let [x, y] = config(kind).project(0.0, 0.0);
            assert!((x - 500.0).abs() < 1e-9 && (y - 300.0).abs() < 1e-9);
        }
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let cfg = config(ProjectionKind::NaturalEarth1);
        let [x, y] = cfg.project(90.0, 45.0);
        assert!(x > 500.0);
        assert!(y < 300.0);
    }

    #[test]
    fn natural_earth_antimeridian_width() {
        let cfg = config(ProjectionKind::NaturalEarth1);
        let [x, _] = cfg.project(180.0, 0.0);
        assert!((x - (500.0 + std::f64::consts::PI * 0.8707 * 200.0)).abs() < 1e-6);
    }

    #[test]
    fn degenerate_geometry_yields_none() {
        let engine = ProjectionEngine::new(config(ProjectionKind::NaturalEarth1));
        assert!(engine.path(&feature(Vec::new())).is_none());
        assert!(engine.path(&feature(vec![vec![vec![[0.0, 0.0], [1.0, 1.0]]]])).is_none());
    }

    #[test]
    fn path_string_closes_each_ring() {
        let engine = ProjectionEngine::new(config(ProjectionKind::Equirectangular));
        let square = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let d = engine.path(&feature(vec![vec![square]])).unwrap();
        assert!(d.starts_with("M500.00,300.00L"));
        assert_eq!(d.matches('Z').count(), 1);
    }

    #[test]
    fn reconfigure_keeps_feature_data() {
        let f = feature(vec![vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]]]);
        let mut engine = ProjectionEngine::new(config(ProjectionKind::Equirectangular));
        let wide = engine.project_feature(&f).unwrap().bounds.width();
        engine.reconfigure(ProjectionConfig {
            scale: 60.0,
            translate: (120.0, 50.0),
            kind: ProjectionKind::Equirectangular,
        });
        let narrow = engine.project_feature(&f).unwrap().bounds.width();
        assert!((wide / narrow - 200.0 / 60.0).abs() < 1e-9);
    }
}

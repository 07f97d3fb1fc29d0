//! Read-only store of the country polygons the map is drawn from.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::codes::{Iso2Code, NativeCode};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<String>,
    properties: Properties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(alias = "NAME", alias = "ADMIN")]
    name: String,
    #[serde(default, rename = "ISO_A3")]
    iso_a3: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to parse country dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("country dataset contains no usable features")]
    Empty,
}

/// A closed ring of `[x, y]` points. Geographic rings are `[lon, lat]`.
pub type Ring = Vec<[f64; 2]>;
/// Ring 0 is the outer boundary, the rest are holes.
pub type Polygon = Vec<Ring>;

/// Axis-aligned extent, `(min_x, min_y, max_x, max_y)` in whatever space the
/// points live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of_polygons(polygons: &[Polygon]) -> Option<Self> {
        let mut points = polygons.iter().flatten().flatten().peekable();
        points.peek()?;

        let mut b = Bounds {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        };
        for p in points {
            b.min_x = b.min_x.min(p[0]);
            b.min_y = b.min_y.min(p[1]);
            b.max_x = b.max_x.max(p[0]);
            b.max_y = b.max_y.max(p[1]);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Same box grown by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Self {
        Bounds {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// One country or territory from the dataset. Never mutated after load.
#[derive(Debug, Clone)]
pub struct CountryFeature {
    pub id: NativeCode,
    pub iso2: Iso2Code,
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// `None` when the geometry carried no coordinates at all.
    pub bbox: Option<Bounds>,
    /// (lon, lat) inside the largest polygon, used for map labels.
    pub label_pos: Option<(f64, f64)>,
}

impl CountryFeature {
    pub fn is_degenerate(&self) -> bool {
        self.polygons
            .iter()
            .all(|p| p.first().is_none_or(|outer| outer.len() < 3))
    }
}

/// Signed area of a ring (positive = CCW).
fn ring_signed_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        area += (ring[j][0] - ring[i][0]) * (ring[j][1] + ring[i][1]);
        j = i;
    }
    area / 2.0
}

/// Ray-casting point-in-ring test.
pub(crate) fn point_in_ring(x: f64, y: f64, ring: &[[f64; 2]]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Inside the outer ring and outside every hole.
pub(crate) fn point_in_polygon(x: f64, y: f64, rings: &[Ring]) -> bool {
    match rings.split_first() {
        Some((outer, holes)) => {
            point_in_ring(x, y, outer) && !holes.iter().any(|hole| point_in_ring(x, y, hole))
        }
        None => false,
    }
}

/// Interior spans of `ring` along the line `axis == at`, as sorted
/// (enter, exit) pairs measured on the other axis.
fn interior_spans(ring: &[[f64; 2]], axis: usize, at: f64) -> Vec<(f64, f64)> {
    let other = 1 - axis;
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let mut crossings = Vec::new();
    let mut j = n - 1;
    for i in 0..n {
        let (ai, aj) = (ring[i][axis], ring[j][axis]);
        if (ai > at) != (aj > at) {
            let (oi, oj) = (ring[i][other], ring[j][other]);
            crossings.push((oj - oi) * (at - ai) / (aj - ai) + oi);
        }
        j = i;
    }
    crossings.sort_by(f64::total_cmp);
    crossings.chunks_exact(2).map(|p| (p[0], p[1])).collect()
}

/// Pick the most interior point of a ring on a coarse grid: the candidate
/// maximising min(half_width, half_height).
fn ring_label_point(ring: &[[f64; 2]]) -> (f64, f64) {
    let Some(b) = Bounds::of_polygons(&[vec![ring.to_vec()]]) else {
        return (0.0, 0.0);
    };

    let steps = 24;
    let mut best = ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0);
    let mut best_score = 0.0f64;

    for row in 1..steps {
        let lat = b.min_y + b.height() * row as f64 / steps as f64;
        for (left, right) in interior_spans(ring, 1, lat) {
            let mid_lon = (left + right) / 2.0;
            let half_w = (right - left) / 2.0;

            let vertical = interior_spans(ring, 0, mid_lon);
            if let Some(&(bottom, top)) = vertical.iter().find(|(lo, hi)| lat >= *lo && lat <= *hi)
            {
                let score = half_w.min(lat - bottom).min(top - lat);
                if score > best_score {
                    best_score = score;
                    best = (mid_lon, lat);
                }
            }
        }
    }

    best
}

fn into_feature(f: Feature) -> Option<CountryFeature> {
    let id = f.id.filter(|id| !id.is_empty()).or(f.properties.iso_a3)?;

    let polygons = match f.geometry {
        Some(Geometry::Polygon { coordinates }) => vec![coordinates],
        Some(Geometry::MultiPolygon { coordinates }) => coordinates,
        None => Vec::new(),
    };

    let bbox = Bounds::of_polygons(&polygons);
    let label_pos = polygons
        .iter()
        .filter_map(|p| p.first())
        .filter(|outer| outer.len() >= 3)
        .max_by(|a, b| {
            ring_signed_area(a)
                .abs()
                .total_cmp(&ring_signed_area(b).abs())
        })
        .map(|outer| ring_label_point(outer));

    let id = NativeCode::new(id);
    Some(CountryFeature {
        iso2: id.resolve(),
        id,
        name: f.properties.name,
        polygons,
        bbox,
        label_pos,
    })
}

/// Every country feature, loaded once and indexed by resolved code.
///
/// Several features may share an [`Iso2Code`] (a dependency drawn as its
/// administering country), so the index maps to a list of positions.
#[derive(Debug, Default)]
pub struct GeoFeatureStore {
    features: Vec<CountryFeature>,
    by_iso2: HashMap<Iso2Code, Vec<usize>>,
}

impl GeoFeatureStore {
    pub fn from_geojson(geojson: &str) -> Result<Self, GeoError> {
        let fc: FeatureCollection = serde_json::from_str(geojson)?;
        let total = fc.features.len();

        let features: Vec<CountryFeature> = fc.features.into_iter().filter_map(into_feature).collect();
        if features.is_empty() {
            return Err(GeoError::Empty);
        }
        if features.len() < total {
            tracing::warn!(
                skipped = total - features.len(),
                "dropped features without a country id"
            );
        }

        let mut by_iso2: HashMap<Iso2Code, Vec<usize>> = HashMap::new();
        for (idx, feature) in features.iter().enumerate() {
            by_iso2.entry(feature.iso2.clone()).or_default().push(idx);
        }

        tracing::debug!(count = features.len(), "loaded country features");
        Ok(Self { features, by_iso2 })
    }

    pub fn features(&self) -> &[CountryFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// True when at least one loaded feature resolves to `code`.
    pub fn contains(&self, code: &Iso2Code) -> bool {
        self.by_iso2.contains_key(code)
    }

    pub fn features_for<'a>(&'a self, code: &Iso2Code) -> impl Iterator<Item = &'a CountryFeature> {
        self.by_iso2
            .get(code)
            .into_iter()
            .flatten()
            .map(|&idx| &self.features[idx])
    }

    /// Display name of the first feature carrying `code`.
    pub fn name_of(&self, code: &Iso2Code) -> Option<&str> {
        self.features_for(code).next().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "FRA", "properties": {"name": "France"},
             "geometry": {"type": "Polygon", "coordinates": [[[-4,43],[8,43],[8,51],[-4,51],[-4,43]]]}},
            {"type": "Feature", "id": "SJM", "properties": {"name": "Svalbard"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[10,77],[30,77],[30,80],[10,80],[10,77]]]]}},
            {"type": "Feature", "id": "NOR", "properties": {"name": "Norway"},
             "geometry": {"type": "Polygon", "coordinates": [[[5,58],[30,58],[30,71],[5,71],[5,58]]]}},
            {"type": "Feature", "id": "ZZZ", "properties": {"name": "Nowhere"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "No id"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]
    }"#;

    #[test]
    fn loads_and_indexes_by_iso2() {
        let store = GeoFeatureStore::from_geojson(SAMPLE).unwrap();
        assert_eq!(store.len(), 4);
        assert!(store.contains(&Iso2Code::new("FR")));
        assert_eq!(store.features_for(&Iso2Code::new("NO")).count(), 2);
        assert_eq!(store.name_of(&Iso2Code::new("FR")), Some("France"));
        assert!(!store.contains(&Iso2Code::new("DE")));
    }

    #[test]
    fn bbox_and_label_inside_polygon() {
        let store = GeoFeatureStore::from_geojson(SAMPLE).unwrap();
        let france = &store.features()[0];
        let bbox = france.bbox.unwrap();
        assert_eq!((bbox.min_x, bbox.max_y), (-4.0, 51.0));
        let (lon, lat) = france.label_pos.unwrap();
        assert!(point_in_polygon(lon, lat, &france.polygons[0]));
    }

    #[test]
    fn null_geometry_is_degenerate() {
        let store = GeoFeatureStore::from_geojson(SAMPLE).unwrap();
        let nowhere = store.features_for(&Iso2Code::new("ZZZ")).next().unwrap();
        assert!(nowhere.is_degenerate());
        assert!(nowhere.bbox.is_none());
    }

    #[test]
    fn holes_are_excluded() {
        let square: Ring = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        let hole: Ring = vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]];
        let poly = vec![square, hole];
        assert!(point_in_polygon(2.0, 2.0, &poly));
        assert!(!point_in_polygon(5.0, 5.0, &poly));
    }

    #[test]
    fn empty_collection_is_an_error() {
        let err = GeoFeatureStore::from_geojson(r#"{"features": []}"#).unwrap_err();
        assert!(matches!(err, GeoError::Empty));
    }
}

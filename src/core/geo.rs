//! GeoJSON layer filtering and viewport fitting for the claims map.
//!
//! Geometry is never validated up front; bounding-box code skips what it
//! cannot read and callers fall back to [`DEFAULT_CENTER`].

use crate::core::query::FilterSet;
use crate::domain::model::{value_text, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Central India, `(lat, lon)`.
pub const DEFAULT_CENTER: (f64, f64) = (22.0, 81.5);
/// Margin in degrees added around a fitted boundary.
pub const DEFAULT_PADDING: f64 = 0.1;

fn feature_type() -> String {
    "Feature".to_string()
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

impl Feature {
    /// `properties` should be a JSON object; anything else is stored as none.
    pub fn new(properties: Value, geometry: Value) -> Self {
        Self {
            kind: feature_type(),
            properties: match properties {
                Value::Object(map) => Some(map),
                _ => None,
            },
            geometry: Some(geometry),
        }
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties
            .as_ref()?
            .get(key)
            .filter(|v| !v.is_null())
            .map(value_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Property equality constraints; empty values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoFilter {
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

impl GeoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.constraints.insert(key.to_string(), value.into());
        self
    }

    pub fn state(self, value: impl Into<String>) -> Self {
        self.with("state", value)
    }

    pub fn district(self, value: impl Into<String>) -> Self {
        self.with("district", value)
    }

    pub fn village(self, value: impl Into<String>) -> Self {
        self.with("village", value)
    }

    pub fn category(self, value: impl Into<String>) -> Self {
        self.with("category", value)
    }

    pub fn get(&self, key: &str) -> &str {
        self.constraints.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn is_active(&self) -> bool {
        self.constraints.values().any(|v| !v.is_empty())
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        self.constraints
            .iter()
            .filter(|(_, wanted)| !wanted.is_empty())
            .all(|(key, wanted)| feature.property(key).as_deref() == Some(wanted.as_str()))
    }

    pub fn apply(&self, collection: &FeatureCollection) -> FeatureCollection {
        let features: Vec<Feature> = collection
            .features
            .iter()
            .filter(|f| self.matches(f))
            .cloned()
            .collect();
        tracing::debug!(
            "Geo filter kept {} of {} features",
            features.len(),
            collection.features.len()
        );
        FeatureCollection {
            kind: collection.kind.clone(),
            features,
        }
    }
}

/// Picks the boundary to focus: the selected district, else the selected
/// state, else nothing.
pub fn select_boundary<'a>(
    districts: &'a FeatureCollection,
    states: &'a FeatureCollection,
    filter: &GeoFilter,
) -> Option<&'a Feature> {
    let district = filter.get("district");
    if !district.is_empty() {
        return districts
            .features
            .iter()
            .find(|f| f.property("district").as_deref() == Some(district));
    }
    let state = filter.get("state");
    if !state.is_empty() {
        return states
            .features
            .iter()
            .find(|f| f.property("state").as_deref() == Some(state));
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    fn from_point(lon: f64, lat: f64) -> Self {
        Self {
            min_lat: lat,
            max_lat: lat,
            min_lon: lon,
            max_lon: lon,
        }
    }

    fn include(&mut self, lon: f64, lat: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin,
            max_lat: self.max_lat + margin,
            min_lon: self.min_lon - margin,
            max_lon: self.max_lon + margin,
        }
    }

    /// `(lat, lon)`
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

fn extend(bbox: &mut Option<BoundingBox>, (lon, lat): (f64, f64)) {
    match bbox {
        Some(b) => b.include(lon, lat),
        None => *bbox = Some(BoundingBox::from_point(lon, lat)),
    }
}

/// GeoJSON positions are `[lon, lat, ...]`.
fn position(coords: &[Value]) -> Option<(f64, f64)> {
    if coords.len() < 2 {
        return None;
    }
    let lon = coords[0].as_f64()?;
    let lat = coords[1].as_f64()?;
    (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
}

fn collect_positions(value: &Value, bbox: &mut Option<BoundingBox>) {
    let Some(items) = value.as_array() else {
        return;
    };
    if items.is_empty() {
        return;
    }

    if items.iter().all(|v| !v.is_array()) {
        if let Some(pos) = position(items) {
            extend(bbox, pos);
        }
        return;
    }

    // any position-shaped child makes this a ring
    let is_ring = items
        .iter()
        .any(|v| v.as_array().is_some_and(|p| p.iter().all(|c| !c.is_array())));
    if is_ring {
        // one bad element discards the whole ring
        let ring: Option<Vec<(f64, f64)>> = items
            .iter()
            .map(|v| v.as_array().and_then(|p| position(p)))
            .collect();
        match ring {
            Some(ring) => ring.into_iter().for_each(|pos| extend(bbox, pos)),
            None => tracing::debug!("Skipping ring with a non-numeric position"),
        }
        return;
    }

    for item in items {
        collect_positions(item, bbox);
    }
}

fn geometry_bounds(geometry: &Value, bbox: &mut Option<BoundingBox>) {
    if let Some(parts) = geometry.get("geometries").and_then(Value::as_array) {
        for part in parts {
            geometry_bounds(part, bbox);
        }
        return;
    }
    if let Some(coords) = geometry.get("coordinates") {
        collect_positions(coords, bbox);
    }
}

pub fn bounding_box(feature: &Feature) -> Option<BoundingBox> {
    let mut bbox = None;
    if let Some(geometry) = &feature.geometry {
        geometry_bounds(geometry, &mut bbox);
    }
    bbox
}

pub fn collection_bounds(collection: &FeatureCollection) -> Option<BoundingBox> {
    let mut bbox = None;
    for geometry in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
        geometry_bounds(geometry, &mut bbox);
    }
    bbox
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub bounds: Option<BoundingBox>,
}

pub fn fit_viewport(boundary: Option<&Feature>, padding: f64) -> Viewport {
    match boundary.and_then(bounding_box) {
        Some(bbox) => {
            let bounds = bbox.padded(padding);
            Viewport {
                center: bounds.center(),
                bounds: Some(bounds),
            }
        }
        None => Viewport {
            center: DEFAULT_CENTER,
            bounds: None,
        },
    }
}

/// Mean of `(lat, lon)` points, or the default centre for none.
pub fn centroid(points: &[(f64, f64)]) -> (f64, f64) {
    if points.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(la, lo), (lat, lon)| (la + lat, lo + lon));
    (lat / n, lon / n)
}

/// Claim coordinates from two numeric record fields; rows without both are skipped.
pub fn record_points(records: &[Record], lat_field: &str, lon_field: &str) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| {
            let lat = r.field(lat_field)?.as_f64()?;
            let lon = r.field(lon_field)?.as_f64()?;
            Some((lat, lon))
        })
        .collect()
}

/// Map-page selectors. Each layer is narrowed only by the properties it
/// carries; empty values are unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSelection {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub village: String,
    #[serde(default)]
    pub tribe: String,
}

impl MapSelection {
    /// State and district, for the district layer and boundary focus.
    pub fn district_filter(&self) -> GeoFilter {
        GeoFilter::new()
            .state(self.state.as_str())
            .district(self.district.as_str())
    }

    /// Village boundaries only carry their district.
    pub fn village_filter(&self) -> GeoFilter {
        GeoFilter::new().district(self.district.as_str())
    }

    pub fn claim_filter(&self) -> FilterSet {
        FilterSet::new()
            .with_exact("state", self.state.as_str())
            .with_exact("district", self.district.as_str())
            .with_exact("village", self.village.as_str())
            .with_exact("tribe", self.tribe.as_str())
    }
}

/// Boundary layers to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayers {
    pub districts: FeatureCollection,
    pub villages: FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub viewport: Viewport,
    /// Mean claim position, `(lat, lon)`.
    pub claims_center: (f64, f64),
    pub layers: MapLayers,
    pub claims: Vec<Record>,
}

/// Everything the claims map shows for one selection.
pub fn map_view(
    selection: &MapSelection,
    districts: &FeatureCollection,
    states: &FeatureCollection,
    villages: &FeatureCollection,
    claims: &[Record],
    padding: f64,
) -> MapView {
    let district_filter = selection.district_filter();
    let boundary = select_boundary(districts, states, &district_filter);
    let claims = selection.claim_filter().filter(claims);
    MapView {
        viewport: fit_viewport(boundary, padding),
        claims_center: centroid(&record_points(&claims, "lat", "lon")),
        layers: MapLayers {
            districts: district_filter.apply(districts),
            villages: selection.village_filter().apply(villages),
        },
        claims,
    }
}

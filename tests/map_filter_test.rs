use anyhow::Result;
use fra_monitor::adapters::{load_feature_collection, sample_claims};
use fra_monitor::core::geo::{
    centroid, fit_viewport, map_view, record_points, select_boundary, FeatureCollection,
    GeoFilter, MapSelection, DEFAULT_CENTER, DEFAULT_PADDING,
};
use fra_monitor::core::query::FilterSet;
use fra_monitor::core::Storage;
use fra_monitor::LocalStorage;
use tempfile::TempDir;

const DISTRICTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"state": "Chhattisgarh", "district": "Bastar", "category": "forest"},
     "geometry": {"type": "Polygon", "coordinates": [[[81.0, 18.5], [82.0, 18.5], [82.0, 19.5], [81.0, 19.5], [81.0, 18.5]]]}},
    {"type": "Feature", "properties": {"state": "Chhattisgarh", "district": "Kanker", "category": "revenue"},
     "geometry": {"type": "Polygon", "coordinates": [[[80.8, 19.8], [81.6, 19.8], [81.6, 20.6], [80.8, 20.6], [80.8, 19.8]]]}},
    {"type": "Feature", "properties": {"state": "Chhattisgarh", "district": "Broken"}, "geometry": null}
  ]
}"#;

const STATES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"state": "Chhattisgarh"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[80.0, 17.5], [84.5, 17.5], [84.5, 24.0], [80.0, 24.0], [80.0, 17.5]]]]}}
  ]
}"#;

const VILLAGES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"name": "Village A", "district": "Bastar"},
     "geometry": {"type": "Polygon", "coordinates": [[[81.5, 19.0], [81.6, 19.0], [81.6, 19.1], [81.5, 19.1], [81.5, 19.0]]]}},
    {"type": "Feature", "properties": {"name": "Village B", "district": "Dantewada"},
     "geometry": {"type": "Polygon", "coordinates": [[[81.7, 18.8], [81.8, 18.8], [81.8, 18.9], [81.7, 18.9], [81.7, 18.8]]]}}
  ]
}"#;

fn storage(dir: &TempDir) -> LocalStorage {
    LocalStorage::new(dir.path().to_string_lossy().to_string())
}

async fn layers(dir: &TempDir) -> Result<(FeatureCollection, FeatureCollection)> {
    let storage = storage(dir);
    storage.write_file("districts.geojson", DISTRICTS.as_bytes()).await?;
    storage.write_file("states.geojson", STATES.as_bytes()).await?;
    Ok((
        load_feature_collection(&storage, "districts.geojson").await?,
        load_feature_collection(&storage, "states.geojson").await?,
    ))
}

#[tokio::test]
async fn test_district_selection_fits_district() -> Result<()> {
    let dir = TempDir::new()?;
    let (districts, states) = layers(&dir).await?;

    let filter = GeoFilter::new().state("Chhattisgarh").district("Bastar");
    let viewport = fit_viewport(select_boundary(&districts, &states, &filter), DEFAULT_PADDING);

    let bounds = viewport.bounds.expect("district bounds");
    assert!((bounds.min_lon - 80.9).abs() < 1e-9);
    assert!((bounds.max_lat - 19.6).abs() < 1e-9);
    assert!((viewport.center.0 - 19.0).abs() < 1e-9);
    assert!((viewport.center.1 - 81.5).abs() < 1e-9);

    assert_eq!(filter.apply(&districts).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_state_only_selection_fits_state() -> Result<()> {
    let dir = TempDir::new()?;
    let (districts, states) = layers(&dir).await?;

    let filter = GeoFilter::new().state("Chhattisgarh");
    let viewport = fit_viewport(select_boundary(&districts, &states, &filter), 0.0);
    let bounds = viewport.bounds.expect("state bounds");
    assert_eq!(bounds.min_lat, 17.5);
    assert_eq!(bounds.max_lon, 84.5);

    // every district, including the one without geometry, is still listed
    assert_eq!(filter.apply(&districts).len(), 3);
    Ok(())
}

#[test]
fn test_unknown_or_broken_boundary_keeps_default_view() {
    let dir = TempDir::new().unwrap();
    let (districts, states) = tokio_test::block_on(layers(&dir)).unwrap();

    for district in ["Nowhere", "Broken"] {
        let filter = GeoFilter::new().district(district);
        let viewport = fit_viewport(select_boundary(&districts, &states, &filter), DEFAULT_PADDING);
        assert_eq!(viewport.center, DEFAULT_CENTER);
        assert!(viewport.bounds.is_none());
    }

    let category = GeoFilter::new().category("revenue");
    let kept = category.apply(&districts);
    assert_eq!(kept.features[0].property("district").as_deref(), Some("Kanker"));
}

#[test]
fn test_claim_markers_follow_filters() {
    let claims = FilterSet::new()
        .with_exact("district", "Bastar")
        .filter(&sample_claims());
    let points = record_points(&claims, "lat", "lon");
    assert_eq!(points.len(), 2);

    let (lat, lon) = centroid(&points);
    assert!((lat - 19.065).abs() < 1e-9);
    assert!((lon - 81.535).abs() < 1e-9);
}

fn villages() -> FeatureCollection {
    serde_json::from_str(VILLAGES).unwrap()
}

#[tokio::test]
async fn test_village_selection_keeps_district_layer() -> Result<()> {
    let dir = TempDir::new()?;
    let (districts, states) = layers(&dir).await?;

    let selection = MapSelection {
        state: "Chhattisgarh".to_string(),
        district: "Bastar".to_string(),
        village: "Village A".to_string(),
        ..MapSelection::default()
    };
    let view = map_view(
        &selection,
        &districts,
        &states,
        &villages(),
        &sample_claims(),
        DEFAULT_PADDING,
    );

    assert_eq!(view.layers.districts.len(), 1);
    assert!(view.viewport.bounds.is_some());
    assert_eq!(view.layers.villages.len(), 1);
    assert_eq!(
        view.layers.villages.features[0].property("name").as_deref(),
        Some("Village A")
    );
    assert_eq!(view.claims.len(), 2);
    Ok(())
}

#[test]
fn test_village_layer_filters_by_district_only() {
    let empty = FeatureCollection::new(Vec::new());
    let selection = MapSelection {
        district: "Dantewada".to_string(),
        village: "Village A".to_string(),
        ..MapSelection::default()
    };
    let view = map_view(&selection, &empty, &empty, &villages(), &sample_claims(), 0.0);

    assert_eq!(view.layers.villages.len(), 1);
    assert_eq!(
        view.layers.villages.features[0].property("district").as_deref(),
        Some("Dantewada")
    );
    // no claim sits in Village A of Dantewada
    assert!(view.claims.is_empty());
    assert_eq!(view.claims_center, DEFAULT_CENTER);
}

#[test]
fn test_tribe_narrows_claims() {
    let empty = FeatureCollection::new(Vec::new());
    let selection = MapSelection {
        tribe: "Gond".to_string(),
        ..MapSelection::default()
    };
    let view = map_view(&selection, &empty, &empty, &villages(), &sample_claims(), 0.0);

    assert_eq!(view.claims.len(), 1);
    assert_eq!(view.claims[0].field_text("holder").as_deref(), Some("Ram Singh"));
    assert_eq!(view.claims_center, (19.05, 81.55));
    assert_eq!(view.viewport.center, DEFAULT_CENTER);
    assert_eq!(view.layers.villages.len(), 2);
}

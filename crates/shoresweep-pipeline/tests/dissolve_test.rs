//! Dissolve pipeline runs over real per-polygon files on disk.

use geo::{Coord, LineString, MultiLineString};
use shoresweep_core::config::DissolveSettings;
use shoresweep_geo::error::DissolveError;
use shoresweep_geo::features::write_collection;
use shoresweep_geo::{Feature, FeatureCollection};
use shoresweep_pipeline::{DissolvePipeline, DissolveRunError};
use shoresweep_store::{CollectionStore, MemoryStore};
use std::path::Path;

fn line(coords: &[(f64, f64)]) -> Feature {
    Feature::lines(
        MultiLineString(vec![LineString(
            coords.iter().map(|&(x, y)| Coord { x, y }).collect(),
        )]),
        serde_json::Map::new(),
    )
}

fn write_input(dir: &Path, file_name: &str, features: Vec<Feature>) {
    let collection = FeatureCollection::new("input", features);
    write_collection(&collection, &dir.join(file_name)).unwrap();
}

#[test]
fn test_overlapping_tiles_dissolve_into_one_feature() {
    let dir = tempfile::tempdir().unwrap();
    // Two tiles tracing the same reach, offset well within the 2-unit
    // buffer radius.
    write_input(
        dir.path(),
        "CAMP_1_output_lines.geojson",
        vec![line(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)])],
    );
    write_input(
        dir.path(),
        "CAMP_2_output_lines.geojson",
        vec![line(&[(0.0, 1.0), (10.0, 1.0), (20.0, 1.0)])],
    );

    let store = MemoryStore::new();
    let pipeline = DissolvePipeline::new(&store);
    let report = pipeline
        .run(dir.path(), "CAMP", &DissolveSettings::with_defaults())
        .unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(report.segments, 4);
    assert_eq!(report.rejected, 0);
    assert_eq!(report.zones, 1);
    assert_eq!(report.result_features, 1);
    assert_eq!(report.result_name, "CAMP_RESULT");

    // Every stage left an inspectable collection behind.
    assert_eq!(
        store.list().unwrap(),
        vec![
            "CAMP_BUFFER".to_string(),
            "CAMP_DISSOLVE".to_string(),
            "CAMP_MERGE".to_string(),
            "CAMP_RESULT".to_string(),
            "CAMP_SPATIAL_JOIN".to_string(),
            "CAMP_SPLIT".to_string(),
        ]
    );

    // The single result feature carries all four surviving segments.
    let result = store.load("CAMP_RESULT").unwrap();
    assert_eq!(result.features[0].line_parts().len(), 4);
}

#[test]
fn test_long_bridge_segments_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    // One plausible reach plus a 100-unit bridge to a stray vertex.
    write_input(
        dir.path(),
        "CAMP_1_output_lines.geojson",
        vec![line(&[(0.0, 0.0), (10.0, 0.0), (110.0, 0.0)])],
    );

    let store = MemoryStore::new();
    let report = DissolvePipeline::new(&store)
        .run(dir.path(), "CAMP", &DissolveSettings::with_defaults())
        .unwrap();

    assert_eq!(report.segments, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(store.load("CAMP_SPLIT").unwrap().len(), 1);
}

#[test]
fn test_empty_source_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();

    let err = DissolvePipeline::new(&store)
        .run(dir.path(), "CAMP", &DissolveSettings::with_defaults())
        .unwrap_err();

    assert!(matches!(
        err,
        DissolveRunError::Geometry(DissolveError::NoInputFiles { .. })
    ));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_unparseable_file_name_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_input(
        dir.path(),
        "stray.geojson",
        vec![line(&[(0.0, 0.0), (10.0, 0.0)])],
    );

    let store = MemoryStore::new();
    let err = DissolvePipeline::new(&store)
        .run(dir.path(), "CAMP", &DissolveSettings::with_defaults())
        .unwrap_err();

    assert!(matches!(
        err,
        DissolveRunError::Geometry(DissolveError::FilenameParse { .. })
    ));
}

#[test]
fn test_rerun_replaces_stage_collections() {
    let dir = tempfile::tempdir().unwrap();
    write_input(
        dir.path(),
        "CAMP_1_output_lines.geojson",
        vec![line(&[(0.0, 0.0), (10.0, 0.0)])],
    );

    let store = MemoryStore::new();
    let pipeline = DissolvePipeline::new(&store);
    let settings = DissolveSettings::with_defaults();

    let first = pipeline.run(dir.path(), "CAMP", &settings).unwrap();
    let first_result = store.load("CAMP_RESULT").unwrap();

    let second = pipeline.run(dir.path(), "CAMP", &settings).unwrap();
    let second_result = store.load("CAMP_RESULT").unwrap();

    assert_eq!(first.result_features, second.result_features);
    assert_eq!(first_result, second_result);
    assert_eq!(store.list().unwrap().len(), 6);
}

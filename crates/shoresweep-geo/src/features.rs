//! Named feature collections and their GeoJSON persistence.

use crate::error::DissolveError;
use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use geojson::{Feature as GjFeature, FeatureCollection as GjFeatureCollection, GeoJson, Geometry, Value};
use serde_json::Map;
use shoresweep_core::models::ShorelineSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Geometry carried by one feature: line work through most stages, area
/// polygons for the buffer and zone stages.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Lines(MultiLineString<f64>),
    Areas(MultiPolygon<f64>),
}

/// One feature: geometry plus free-form attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub properties: Map<String, serde_json::Value>,
}

impl Feature {
    pub fn lines(lines: MultiLineString<f64>, properties: Map<String, serde_json::Value>) -> Self {
        Self {
            geometry: FeatureGeometry::Lines(lines),
            properties,
        }
    }

    pub fn areas(areas: MultiPolygon<f64>, properties: Map<String, serde_json::Value>) -> Self {
        Self {
            geometry: FeatureGeometry::Areas(areas),
            properties,
        }
    }

    /// The line parts of this feature, empty for area features.
    pub fn line_parts(&self) -> &[LineString<f64>] {
        match &self.geometry {
            FeatureGeometry::Lines(mls) => &mls.0,
            FeatureGeometry::Areas(_) => &[],
        }
    }
}

/// A named, immutable set of features. Every pipeline stage consumes
/// collections and produces exactly one new one; nothing mutates in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub name: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
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

/// Extract the polygon-id fragment from a per-polygon output file name:
/// the substring between the last `_` before the `_output` token and the
/// token itself. `TEST_1_7_output_lines.geojson` yields `7`.
pub fn polygon_id_from_filename(file_name: &str) -> Option<&str> {
    let end = file_name.rfind("_output")?;
    let beg = file_name[..end].rfind('_')? + 1;
    let fragment = &file_name[beg..end];
    if fragment.is_empty() {
        None
    } else {
        Some(fragment)
    }
}

/// Read one per-polygon GeoJSON file into a line-feature collection named
/// `<run_name>_POLYGON_<id>`, where the id comes from the file name.
pub fn read_polygon_file(path: &Path, run_name: &str) -> Result<FeatureCollection, DissolveError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DissolveError::FilenameParse {
            file: path.to_path_buf(),
        })?;

    let polygon_id =
        polygon_id_from_filename(file_name).ok_or_else(|| DissolveError::FilenameParse {
            file: path.to_path_buf(),
        })?;
    let name = format!("{}_POLYGON_{}", run_name, polygon_id);

    let content = fs::read_to_string(path).map_err(|e| DissolveError::Read {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| DissolveError::InvalidGeoJson {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let gj_features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(DissolveError::InvalidGeoJson {
                file: path.to_path_buf(),
                reason: "expected a Feature or FeatureCollection".to_string(),
            })
        }
    };

    let mut features = Vec::new();
    let mut skipped = 0usize;
    for gj in gj_features {
        let properties = gj.properties.clone().unwrap_or_default();
        match gj.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(coords)) => {
                features.push(Feature::lines(
                    MultiLineString(vec![line_string_from(coords)]),
                    properties,
                ));
            }
            Some(Value::MultiLineString(lines)) => {
                features.push(Feature::lines(
                    MultiLineString(lines.iter().map(|c| line_string_from(c)).collect()),
                    properties,
                ));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(
            file = %path.display(),
            skipped,
            "skipped non-line features during ingestion"
        );
    }

    Ok(FeatureCollection::new(name, features))
}

/// Parse GeoJSON text into a collection with the given name. Accepts line
/// and area geometries; anything else is rejected, since no pipeline stage
/// produces it.
pub fn parse_collection(
    name: impl Into<String>,
    content: &str,
) -> Result<FeatureCollection, DissolveError> {
    let name = name.into();
    let fail = |reason: String| DissolveError::InvalidGeoJson {
        file: PathBuf::from(&name),
        reason,
    };

    let geojson: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| fail(e.to_string()))?;

    let gj_features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(fail("expected a Feature or FeatureCollection".to_string()))
        }
    };

    let mut features = Vec::with_capacity(gj_features.len());
    for gj in gj_features {
        let properties = gj.properties.clone().unwrap_or_default();
        let geometry = match gj.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(coords)) => {
                FeatureGeometry::Lines(MultiLineString(vec![line_string_from(coords)]))
            }
            Some(Value::MultiLineString(lines)) => FeatureGeometry::Lines(MultiLineString(
                lines.iter().map(|c| line_string_from(c)).collect(),
            )),
            Some(Value::Polygon(rings)) => {
                FeatureGeometry::Areas(MultiPolygon(vec![polygon_from(rings)]))
            }
            Some(Value::MultiPolygon(polygons)) => FeatureGeometry::Areas(MultiPolygon(
                polygons.iter().map(|rings| polygon_from(rings)).collect(),
            )),
            other => {
                let kind = match other {
                    Some(Value::Point(_)) => "Point",
                    Some(Value::MultiPoint(_)) => "MultiPoint",
                    Some(Value::GeometryCollection(_)) => "GeometryCollection",
                    _ => "missing",
                };
                return Err(fail(format!("unsupported geometry: {}", kind)));
            }
        };
        features.push(Feature {
            geometry,
            properties,
        });
    }

    Ok(FeatureCollection { name, features })
}

/// Serialize a collection to GeoJSON text.
pub fn to_geojson_string(collection: &FeatureCollection) -> String {
    let features = collection
        .features
        .iter()
        .map(|feature| {
            let geometry = match &feature.geometry {
                FeatureGeometry::Lines(mls) => {
                    // Single-part line work round-trips as a plain LineString.
                    if mls.0.len() == 1 {
                        Geometry::new(Value::LineString(coords_of(&mls.0[0])))
                    } else {
                        Geometry::new(Value::MultiLineString(
                            mls.0.iter().map(coords_of).collect(),
                        ))
                    }
                }
                FeatureGeometry::Areas(mp) => Geometry::new(Value::MultiPolygon(
                    mp.0.iter().map(polygon_coords_of).collect(),
                )),
            };

            GjFeature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(feature.properties.clone()),
                foreign_members: None,
            }
        })
        .collect();

    GeoJson::FeatureCollection(GjFeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
    .to_string()
}

/// Write a collection to a GeoJSON file, creating parent directories.
pub fn write_collection(collection: &FeatureCollection, path: &Path) -> Result<(), DissolveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DissolveError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    fs::write(path, to_geojson_string(collection)).map_err(|e| DissolveError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Convert a filtered shoreline set into the per-polygon output collection,
/// one line feature per detection with its capture provenance as attributes.
pub fn shorelines_to_collection(set: &ShorelineSet) -> FeatureCollection {
    let features = set
        .detections
        .iter()
        .map(|detection| {
            let mut properties = Map::new();
            properties.insert(
                "date".to_string(),
                serde_json::Value::String(detection.date.to_string()),
            );
            properties.insert(
                "satellite".to_string(),
                serde_json::Value::String(detection.satellite.clone()),
            );
            if let Some(accuracy) = serde_json::Number::from_f64(detection.georef_accuracy_m) {
                properties.insert(
                    "georef_accuracy_m".to_string(),
                    serde_json::Value::Number(accuracy),
                );
            }

            Feature::lines(MultiLineString(vec![detection.line.clone()]), properties)
        })
        .collect();

    FeatureCollection::new(set.site_name.clone(), features)
}

fn line_string_from(coords: &[Vec<f64>]) -> LineString<f64> {
    LineString(
        coords
            .iter()
            .filter(|position| position.len() >= 2)
            .map(|position| Coord {
                x: position[0],
                y: position[1],
            })
            .collect(),
    )
}

fn polygon_from(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let mut exterior = LineString(vec![]);
    let mut interiors = Vec::new();
    for (index, ring) in rings.iter().enumerate() {
        if index == 0 {
            exterior = line_string_from(ring);
        } else {
            interiors.push(line_string_from(ring));
        }
    }
    Polygon::new(exterior, interiors)
}

fn coords_of(line: &LineString<f64>) -> Vec<Vec<f64>> {
    line.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_coords_of(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .map(coords_of)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_polygon_id_from_filename() {
        assert_eq!(
            polygon_id_from_filename("TEST_1_7_output_lines.geojson"),
            Some("7")
        );
        assert_eq!(
            polygon_id_from_filename("RUN_412_output_points.geojson"),
            Some("412")
        );
        // No _output token
        assert_eq!(polygon_id_from_filename("shorelines.geojson"), None);
        // No separator before the token
        assert_eq!(polygon_id_from_filename("output_lines.geojson"), None);
        // Empty fragment
        assert_eq!(polygon_id_from_filename("TEST__output_lines.geojson"), None);
    }

    #[test]
    fn test_read_polygon_file_names_collection_from_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RUN_3_output_lines.geojson");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "type": "FeatureCollection",
                "features": [
                    {{
                        "type": "Feature",
                        "geometry": {{
                            "type": "LineString",
                            "coordinates": [[0.0, 0.0], [1.0, 1.0]]
                        }},
                        "properties": {{"date": "2023-05-23"}}
                    }},
                    {{
                        "type": "Feature",
                        "geometry": {{
                            "type": "Point",
                            "coordinates": [5.0, 5.0]
                        }},
                        "properties": {{}}
                    }}
                ]
            }}"#
        )
        .unwrap();

        let collection = read_polygon_file(&path, "RUN").unwrap();

        assert_eq!(collection.name, "RUN_POLYGON_3");
        // The point feature is skipped, not an error.
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.features[0].properties["date"],
            serde_json::Value::String("2023-05-23".to_string())
        );
    }

    #[test]
    fn test_read_polygon_file_rejects_unparseable_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.geojson");
        std::fs::write(&path, "{}").unwrap();

        let err = read_polygon_file(&path, "RUN").unwrap_err();
        assert!(matches!(err, DissolveError::FilenameParse { .. }));
    }

    #[test]
    fn test_read_polygon_file_rejects_bad_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RUN_1_output_lines.geojson");
        std::fs::write(&path, "not geojson at all").unwrap();

        let err = read_polygon_file(&path, "RUN").unwrap_err();
        assert!(matches!(err, DissolveError::InvalidGeoJson { .. }));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RUN_9_output_lines.geojson");

        let original = FeatureCollection::new(
            "RUN_POLYGON_9",
            vec![Feature::lines(
                MultiLineString(vec![LineString(vec![
                    Coord { x: 0.0, y: 0.0 },
                    Coord { x: 2.0, y: 1.0 },
                ])]),
                Map::new(),
            )],
        );

        write_collection(&original, &path).unwrap();
        let reread = read_polygon_file(&path, "RUN").unwrap();

        assert_eq!(reread.len(), 1);
        assert_eq!(reread.features[0].line_parts(), original.features[0].line_parts());
    }
}

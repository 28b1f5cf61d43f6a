//! The geometry stages of the dissolve pipeline.
//!
//! The pipeline turns "is this the same shoreline, approximately, from two
//! sources" into "do their buffers overlap": merged line work is split into
//! vertex segments, implausibly long segments are dropped, the survivors
//! are buffered, overlapping buffers dissolve into zones, and segments are
//! grouped by the zone they fall in. Each function takes collections in and
//! returns one new named collection; inputs are never mutated.

use crate::error::DissolveError;
use crate::features::{Feature, FeatureCollection, FeatureGeometry};
use geo::{
    BooleanOps, BoundingRect, Coord, Euclidean, Intersects, Length, LineString, MultiLineString,
    MultiPolygon, Polygon,
};
use rstar::{RTree, RTreeObject, AABB};
use serde_json::Map;

/// Attribute key carrying the dissolved-zone identity through the join.
pub const ZONE_ID_KEY: &str = "zone_id";

/// Points per semicircular cap when buffering a segment.
const CAP_STEPS: usize = 8;

/// Merge many per-polygon collections into one, preserving each feature's
/// attributes.
pub fn merge(parts: &[FeatureCollection], name: impl Into<String>) -> FeatureCollection {
    let features = parts
        .iter()
        .flat_map(|collection| collection.features.iter().cloned())
        .collect();
    FeatureCollection::new(name, features)
}

/// Split every line feature into maximal straight segments at its original
/// vertices. Pure decomposition: the later buffer/dissolve logic coalesces
/// segments, not whole paths, which localizes the dedup decision.
pub fn split_at_vertices(merged: &FeatureCollection, name: impl Into<String>) -> FeatureCollection {
    let mut features = Vec::new();
    for feature in &merged.features {
        for line in feature.line_parts() {
            for segment in line.lines() {
                features.push(Feature::lines(
                    MultiLineString(vec![LineString(vec![segment.start, segment.end])]),
                    feature.properties.clone(),
                ));
            }
        }
    }
    FeatureCollection::new(name, features)
}

/// Discard segments whose length is strictly greater than
/// `max_segment_length` (output linear unit). Long segments are assumed to
/// be spurious bridges between disjoint reaches introduced by merging.
/// Returns the surviving collection and the rejected count.
pub fn reject_long_segments(
    split: &FeatureCollection,
    max_segment_length: f64,
    name: impl Into<String>,
) -> (FeatureCollection, usize) {
    let mut features = Vec::new();
    let mut rejected = 0usize;
    for feature in &split.features {
        let length: f64 = feature
            .line_parts()
            .iter()
            .map(|line| Euclidean.length(line))
            .sum();
        if length > max_segment_length {
            rejected += 1;
        } else {
            features.push(feature.clone());
        }
    }
    (FeatureCollection::new(name, features), rejected)
}

/// Buffer every segment by `radius`, producing one area feature per
/// segment. Segments from adjacent tiles that trace the same physical
/// shoreline end up with overlapping buffers.
pub fn buffer_segments(
    segments: &FeatureCollection,
    radius: f64,
    name: impl Into<String>,
) -> FeatureCollection {
    let features = segments
        .features
        .iter()
        .map(|feature| {
            let polygons: Vec<Polygon<f64>> = feature
                .line_parts()
                .iter()
                .flat_map(|line| line.lines())
                .map(|segment| capsule(segment.start, segment.end, radius))
                .collect();
            Feature::areas(MultiPolygon(polygons), feature.properties.clone())
        })
        .collect();
    FeatureCollection::new(name, features)
}

/// Dissolve all overlapping buffer polygons into single-part zone polygons.
/// Each zone gets a fresh 1-based id, carried in its `zone_id` attribute.
pub fn dissolve_buffers(
    buffers: &FeatureCollection,
    name: impl Into<String>,
) -> FeatureCollection {
    let mut dissolved = MultiPolygon::<f64>(vec![]);
    for feature in &buffers.features {
        if let FeatureGeometry::Areas(areas) = &feature.geometry {
            dissolved = dissolved.union(areas);
        }
    }

    let features = dissolved
        .0
        .into_iter()
        .enumerate()
        .map(|(index, polygon)| {
            let mut properties = Map::new();
            properties.insert(
                ZONE_ID_KEY.to_string(),
                serde_json::Value::Number(serde_json::Number::from(index as u64 + 1)),
            );
            Feature::areas(MultiPolygon(vec![polygon]), properties)
        })
        .collect();

    FeatureCollection::new(name, features)
}

// R-tree entry: one zone polygon with its id and precomputed envelope.
struct ZoneEntry {
    zone_id: u64,
    lower: [f64; 2],
    upper: [f64; 2],
    polygon: Polygon<f64>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lower, self.upper)
    }
}

/// Attach to every split segment the id of the dissolved zone it
/// intersects. A segment matching no zone is a fatal error: it would
/// otherwise drop silently from the final result.
pub fn spatial_join(
    segments: &FeatureCollection,
    zones: &FeatureCollection,
    name: impl Into<String>,
) -> Result<FeatureCollection, DissolveError> {
    let mut entries = Vec::new();
    for feature in &zones.features {
        let zone_id = zone_id_of(feature, &zones.name)?;
        let areas = match &feature.geometry {
            FeatureGeometry::Areas(areas) => areas,
            FeatureGeometry::Lines(_) => {
                return Err(DissolveError::WrongGeometry {
                    name: zones.name.clone(),
                    expected: "area",
                    found: "line",
                })
            }
        };
        for polygon in &areas.0 {
            if let Some(rect) = polygon.bounding_rect() {
                entries.push(ZoneEntry {
                    zone_id,
                    lower: [rect.min().x, rect.min().y],
                    upper: [rect.max().x, rect.max().y],
                    polygon: polygon.clone(),
                });
            }
        }
    }
    let tree = RTree::bulk_load(entries);

    let mut features = Vec::with_capacity(segments.len());
    for (index, feature) in segments.features.iter().enumerate() {
        let lines = match &feature.geometry {
            FeatureGeometry::Lines(lines) => lines,
            FeatureGeometry::Areas(_) => {
                return Err(DissolveError::WrongGeometry {
                    name: segments.name.clone(),
                    expected: "line",
                    found: "area",
                })
            }
        };

        let rect = lines
            .bounding_rect()
            .ok_or(DissolveError::UnmatchedSegment { index })?;
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        // Envelope prefilter, then the exact intersection test.
        let zone_id = tree
            .locate_in_envelope_intersecting(&envelope)
            .find(|zone| zone.polygon.intersects(lines))
            .map(|zone| zone.zone_id)
            .ok_or(DissolveError::UnmatchedSegment { index })?;

        let mut properties = feature.properties.clone();
        properties.insert(
            ZONE_ID_KEY.to_string(),
            serde_json::Value::Number(serde_json::Number::from(zone_id)),
        );
        features.push(Feature::lines(lines.clone(), properties));
    }

    Ok(FeatureCollection::new(name, features))
}

/// Group the joined segments by zone id and merge each group into one
/// multi-part line feature - the final collection, one feature per
/// physically-distinct shoreline reach.
pub fn dissolve_by_zone(
    joined: &FeatureCollection,
    name: impl Into<String>,
) -> Result<FeatureCollection, DissolveError> {
    let mut groups: std::collections::BTreeMap<u64, Vec<LineString<f64>>> = Default::default();
    for feature in &joined.features {
        let zone_id = zone_id_of(feature, &joined.name)?;
        groups
            .entry(zone_id)
            .or_default()
            .extend(feature.line_parts().iter().cloned());
    }

    let features = groups
        .into_iter()
        .map(|(zone_id, lines)| {
            let mut properties = Map::new();
            properties.insert(
                ZONE_ID_KEY.to_string(),
                serde_json::Value::Number(serde_json::Number::from(zone_id)),
            );
            Feature::lines(MultiLineString(lines), properties)
        })
        .collect();

    Ok(FeatureCollection::new(name, features))
}

fn zone_id_of(feature: &Feature, collection: &str) -> Result<u64, DissolveError> {
    feature
        .properties
        .get(ZONE_ID_KEY)
        .and_then(|value| value.as_u64())
        .ok_or_else(|| DissolveError::MissingZoneId {
            name: collection.to_string(),
        })
}

/// Capsule polygon around a segment: two semicircular caps joined by the
/// offset sides. Degenerate (zero-length) segments buffer to a disc.
fn capsule(start: Coord<f64>, end: Coord<f64>, radius: f64) -> Polygon<f64> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();

    if len == 0.0 {
        let ring = (0..=CAP_STEPS * 2)
            .map(|i| {
                let angle = std::f64::consts::PI * i as f64 / CAP_STEPS as f64;
                Coord {
                    x: start.x + radius * angle.cos(),
                    y: start.y + radius * angle.sin(),
                }
            })
            .collect();
        return Polygon::new(LineString(ring), vec![]);
    }

    // Angle of the left-hand normal; each cap sweeps half a turn from it.
    let phi = (dy / len).atan2(dx / len) + std::f64::consts::FRAC_PI_2;

    let mut ring = Vec::with_capacity(2 * CAP_STEPS + 3);
    for i in 0..=CAP_STEPS {
        let angle = phi - std::f64::consts::PI * i as f64 / CAP_STEPS as f64;
        ring.push(Coord {
            x: end.x + radius * angle.cos(),
            y: end.y + radius * angle.sin(),
        });
    }
    for i in 0..=CAP_STEPS {
        let angle =
            phi - std::f64::consts::PI - std::f64::consts::PI * i as f64 / CAP_STEPS as f64;
        ring.push(Coord {
            x: start.x + radius * angle.cos(),
            y: start.y + radius * angle.sin(),
        });
    }
    ring.push(ring[0]);

    Polygon::new(LineString(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_feature(coords: &[(f64, f64)]) -> Feature {
        Feature::lines(
            MultiLineString(vec![LineString(
                coords.iter().map(|&(x, y)| Coord { x, y }).collect(),
            )]),
            Map::new(),
        )
    }

    fn segment_collection(segments: &[((f64, f64), (f64, f64))]) -> FeatureCollection {
        FeatureCollection::new(
            "SEGMENTS",
            segments
                .iter()
                .map(|&(a, b)| line_feature(&[a, b]))
                .collect(),
        )
    }

    #[test]
    fn test_merge_preserves_attributes_and_order() {
        let mut props = Map::new();
        props.insert("satellite".to_string(), serde_json::Value::String("S2".into()));
        let a = FeatureCollection::new(
            "A",
            vec![Feature::lines(
                MultiLineString(vec![LineString(vec![
                    Coord { x: 0.0, y: 0.0 },
                    Coord { x: 1.0, y: 0.0 },
                ])]),
                props,
            )],
        );
        let b = FeatureCollection::new("B", vec![line_feature(&[(5.0, 5.0), (6.0, 5.0)])]);

        let merged = merge(&[a, b], "OUT_MERGE");

        assert_eq!(merged.name, "OUT_MERGE");
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.features[0].properties["satellite"],
            serde_json::Value::String("S2".to_string())
        );
    }

    #[test]
    fn test_split_produces_one_segment_per_edge() {
        let collection = FeatureCollection::new(
            "IN",
            vec![line_feature(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)])],
        );

        let split = split_at_vertices(&collection, "OUT_SPLIT");

        assert_eq!(split.len(), 3);
        for feature in &split.features {
            assert_eq!(feature.line_parts()[0].0.len(), 2);
        }
    }

    #[test]
    fn test_reject_long_segments_boundary_is_strict() {
        let collection = segment_collection(&[
            ((0.0, 0.0), (39.0, 0.0)),
            ((0.0, 10.0), (41.0, 10.0)),
            ((0.0, 20.0), (40.0, 20.0)),
        ]);

        let (kept, rejected) = reject_long_segments(&collection, 40.0, "OUT");

        // 39 kept, 41 rejected, exactly 40 kept (strictly greater is out).
        assert_eq!(rejected, 1);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_buffer_produces_area_per_segment() {
        let collection = segment_collection(&[((0.0, 0.0), (10.0, 0.0))]);

        let buffered = buffer_segments(&collection, 2.0, "OUT_BUFFER");

        assert_eq!(buffered.len(), 1);
        let areas = match &buffered.features[0].geometry {
            FeatureGeometry::Areas(mp) => mp,
            _ => panic!("expected area geometry"),
        };
        assert_eq!(areas.0.len(), 1);

        // The capsule covers points beside the segment within the radius
        // and excludes points beyond it.
        let capsule = &areas.0[0];
        assert!(capsule.intersects(&geo::Point::new(5.0, 1.5)));
        assert!(!capsule.intersects(&geo::Point::new(5.0, 3.0)));
        // Cap rounds past the endpoints too.
        assert!(capsule.intersects(&geo::Point::new(11.0, 0.0)));
    }

    #[test]
    fn test_dissolve_merges_overlapping_buffers_only() {
        // Two near-duplicate segments within 2 units, one far away.
        let collection = segment_collection(&[
            ((0.0, 0.0), (10.0, 0.0)),
            ((0.0, 1.0), (10.0, 1.0)),
            ((100.0, 100.0), (110.0, 100.0)),
        ]);

        let buffered = buffer_segments(&collection, 2.0, "B");
        let zones = dissolve_buffers(&buffered, "D");

        assert_eq!(zones.len(), 2);
        let ids: Vec<u64> = zones
            .features
            .iter()
            .map(|f| f.properties[ZONE_ID_KEY].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_spatial_join_assigns_zone_ids() {
        let segments = segment_collection(&[
            ((0.0, 0.0), (10.0, 0.0)),
            ((0.0, 1.0), (10.0, 1.0)),
            ((100.0, 100.0), (110.0, 100.0)),
        ]);
        let buffered = buffer_segments(&segments, 2.0, "B");
        let zones = dissolve_buffers(&buffered, "D");

        let joined = spatial_join(&segments, &zones, "J").unwrap();

        assert_eq!(joined.len(), 3);
        let id0 = joined.features[0].properties[ZONE_ID_KEY].as_u64().unwrap();
        let id1 = joined.features[1].properties[ZONE_ID_KEY].as_u64().unwrap();
        let id2 = joined.features[2].properties[ZONE_ID_KEY].as_u64().unwrap();
        assert_eq!(id0, id1);
        assert_ne!(id0, id2);
    }

    #[test]
    fn test_spatial_join_surfaces_unmatched_segment() {
        let segments = segment_collection(&[((0.0, 0.0), (10.0, 0.0))]);
        let buffered = buffer_segments(&segments, 2.0, "B");
        let zones = dissolve_buffers(&buffered, "D");

        // A segment nowhere near any zone.
        let stray = segment_collection(&[((500.0, 500.0), (510.0, 500.0))]);
        let err = spatial_join(&stray, &zones, "J").unwrap_err();

        assert!(matches!(err, DissolveError::UnmatchedSegment { index: 0 }));
    }

    #[test]
    fn test_dissolve_by_zone_groups_segments() {
        let segments = segment_collection(&[
            ((0.0, 0.0), (10.0, 0.0)),
            ((0.0, 1.0), (10.0, 1.0)),
            ((100.0, 100.0), (110.0, 100.0)),
        ]);
        let buffered = buffer_segments(&segments, 2.0, "B");
        let zones = dissolve_buffers(&buffered, "D");
        let joined = spatial_join(&segments, &zones, "J").unwrap();

        let result = dissolve_by_zone(&joined, "RESULT").unwrap();

        // Two zones, so two multi-part features; the overlapping pair
        // becomes one feature with two parts.
        assert_eq!(result.len(), 2);
        let parts: Vec<usize> = result
            .features
            .iter()
            .map(|f| f.line_parts().len())
            .collect();
        assert!(parts.contains(&2));
        assert!(parts.contains(&1));
    }

    #[test]
    fn test_full_stage_sequence_is_idempotent() {
        let run = |segments: &FeatureCollection| {
            let (kept, _) = reject_long_segments(&split_at_vertices(segments, "S"), 40.0, "K");
            let zones = dissolve_buffers(&buffer_segments(&kept, 2.0, "B"), "D");
            let joined = spatial_join(&kept, &zones, "J").unwrap();
            dissolve_by_zone(&joined, "R").unwrap()
        };

        let input = FeatureCollection::new(
            "IN",
            vec![
                line_feature(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.5)]),
                line_feature(&[(0.5, 1.0), (10.0, 1.2), (19.5, 1.0)]),
            ],
        );

        let first = run(&input);
        let second = run(&input);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.features.iter().zip(second.features.iter()) {
            assert_eq!(a.properties, b.properties);
            assert_eq!(a.line_parts().len(), b.line_parts().len());
        }
    }

    #[test]
    fn test_capsule_degenerate_segment_is_disc() {
        let disc = capsule(Coord { x: 3.0, y: 3.0 }, Coord { x: 3.0, y: 3.0 }, 2.0);
        assert!(disc.intersects(&geo::Point::new(3.0, 4.5)));
        assert!(!disc.intersects(&geo::Point::new(3.0, 5.5)));
    }

    proptest::proptest! {
        #[test]
        fn test_capsule_always_covers_its_segment(
            ax in -1000.0f64..1000.0,
            ay in -1000.0f64..1000.0,
            bx in -1000.0f64..1000.0,
            by in -1000.0f64..1000.0,
            radius in 0.5f64..10.0,
        ) {
            let shape = capsule(Coord { x: ax, y: ay }, Coord { x: bx, y: by }, radius);

            proptest::prop_assert!(shape.intersects(&geo::Point::new(ax, ay)));
            proptest::prop_assert!(shape.intersects(&geo::Point::new(bx, by)));
            proptest::prop_assert!(shape.intersects(&geo::Point::new(
                (ax + bx) / 2.0,
                (ay + by) / 2.0
            )));
        }
    }
}

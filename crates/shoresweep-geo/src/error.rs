//! Error type for the geometry dissolve pipeline
//!
//! Every variant here is fatal for the pipeline run: later stages depend on
//! the full, correctly-identified set of prior features, and a partial
//! dissolve would silently under-represent shoreline coverage.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DissolveError {
    #[error("No vector files found in {dir}")]
    NoInputFiles { dir: PathBuf },

    #[error("Cannot derive a polygon id from file name {file} (expected <...>_<id>_output_<kind>.geojson)")]
    FilenameParse { file: PathBuf },

    #[error("Failed to read {file}: {reason}")]
    Read { file: PathBuf, reason: String },

    #[error("Invalid GeoJSON in {file}: {reason}")]
    InvalidGeoJson { file: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Segment {index} intersects no dissolved zone")]
    UnmatchedSegment { index: usize },

    #[error("Collection {name} holds {found} geometry where {expected} was expected")]
    WrongGeometry {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Feature in collection {name} is missing its zone_id attribute")]
    MissingZoneId { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

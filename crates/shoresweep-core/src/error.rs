//! Error types for shoresweep
//!
//! Two deliberately separate kinds: [`RunError`] is fatal and aborts a run
//! before or outside the polygon loop; [`PolygonError`] is recovered at the
//! per-polygon boundary and recorded against the offending polygon id.
//! Propagation policy is type-directed, never string-matched.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: bad configuration, unreadable input, or a failed geometry
/// pipeline precondition. A `RunError` means no (further) polygons are
/// processed.
#[derive(Debug, Error)]
pub enum RunError {
    // Polygon source errors
    #[error("Polygon file not found at {path}")]
    PolygonFileNotFound { path: PathBuf },

    #[error("Polygon file format error at line {line}: {reason}")]
    PolygonFormat { line: usize, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Unknown campaign: {name}. Check the [[campaign]] entries in the config file")]
    UnknownCampaign { name: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-polygon errors: anything the extraction pipeline can raise for one
/// polygon. The batch loop records these and moves on; they never abort the
/// run.
#[derive(Debug, Error)]
pub enum PolygonError {
    #[error("No imagery found for site {site}: {reason}")]
    NoImagery { site: String, reason: String },

    #[error("Imagery retrieval failed for site {site}: {reason}")]
    Retrieval { site: String, reason: String },

    #[error("Shoreline extraction failed for site {site}: {reason}")]
    Extraction { site: String, reason: String },

    #[error("No shorelines survived filtering for site {site}")]
    EmptyShorelineSet { site: String },

    #[error("Preview export failed for site {site}: {reason}")]
    PreviewExport { site: String, reason: String },

    #[error("Vector export failed for site {site}: {reason}")]
    Export { site: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RunError>;

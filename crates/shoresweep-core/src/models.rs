//! Domain models shared by the batch processor and the dissolve pipeline.

use chrono::NaiveDate;
use geo::LineString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One area of interest: a user-supplied id and an ordered polygon boundary.
///
/// Built once from the input CSV and read-only thereafter. The boundary is
/// not required to be closed; [`PerPolygonContext::derive`] normalizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub id: String,
    /// Ordered (longitude, latitude) pairs, at least 3.
    pub boundary: Vec<(f64, f64)>,
}

impl PolygonRecord {
    /// The id parsed as an integer for allow-list membership.
    ///
    /// A non-numeric id yields `None`, which fails admission without
    /// crashing the run.
    pub fn admission_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }
}

/// Per-polygon derived configuration.
///
/// Constructed fresh for every loop iteration and dropped when that
/// polygon resolves. It is never shared between iterations, so one
/// polygon's derived fields cannot leak into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PerPolygonContext {
    /// `<run_name>_<polygon_id>` - the identity unit of one extraction.
    pub site_name: String,
    /// Closed ring of the axis-aligned minimal bounding rectangle:
    /// five (lon, lat) pairs with the fifth equal to the first.
    pub normalized_boundary: Vec<(f64, f64)>,
}

impl PerPolygonContext {
    /// Derive the context for one polygon. Infallible for any boundary
    /// with at least one point; callers guarantee >= 3 via the source.
    pub fn derive(run_name: &str, record: &PolygonRecord) -> Self {
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for &(lon, lat) in &record.boundary {
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
        }

        // Clockwise from the lower-left corner, explicitly closed.
        let normalized_boundary = vec![
            (min_lon, min_lat),
            (min_lon, max_lat),
            (max_lon, max_lat),
            (max_lon, min_lat),
            (min_lon, min_lat),
        ];

        Self {
            site_name: format!("{}_{}", run_name, record.id),
            normalized_boundary,
        }
    }
}

/// Metadata for one satellite capture resolved for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub date: NaiveDate,
    pub satellite: String,
    /// Reported horizontal georeferencing accuracy, in meters.
    pub georef_accuracy_m: f64,
    /// Where the external detector staged the per-image shoreline output.
    pub shoreline_path: PathBuf,
}

/// The imagery resolved for one site, in capture order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSet {
    pub site_name: String,
    pub images: Vec<ImageMetadata>,
}

impl ImageSet {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }
}

/// One detected shoreline polyline with its capture provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineDetection {
    pub date: NaiveDate,
    pub satellite: String,
    pub georef_accuracy_m: f64,
    pub line: LineString<f64>,
}

/// All detections extracted for one site, before and after cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineSet {
    pub site_name: String,
    pub detections: Vec<ShorelineDetection>,
}

impl ShorelineSet {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }
}

/// Progress accounting for one batch run.
///
/// Mutated only by the batch processor, once per polygon outcome.
/// `remaining` means "not yet attempted": every resolved outcome, success
/// or failure, decrements it.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub succeeded: usize,
    /// Ids of polygons that failed, in resolution order.
    pub failed_ids: Vec<String>,
    /// Ids not admitted by the allow-list - the "unprocessed" report.
    pub skipped_ids: Vec<String>,
    pub remaining: usize,
    /// When the run (argument resolution included) started.
    pub run_start: Instant,
    /// When the polygon loop itself started.
    pub batch_start: Instant,
}

impl BatchProgress {
    pub fn new(admitted_total: usize, run_start: Instant) -> Self {
        Self {
            succeeded: 0,
            failed_ids: Vec::new(),
            skipped_ids: Vec::new(),
            remaining: admitted_total,
            run_start,
            batch_start: Instant::now(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn record_failure(&mut self, id: impl Into<String>) {
        self.failed_ids.push(id.into());
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn record_skip(&mut self, id: impl Into<String>) {
        self.skipped_ids.push(id.into());
    }

    pub fn failed_count(&self) -> usize {
        self.failed_ids.len()
    }

    pub fn run_elapsed(&self) -> Duration {
        self.run_start.elapsed()
    }

    pub fn batch_elapsed(&self) -> Duration {
        self.batch_start.elapsed()
    }
}

//! Deterministic cleanup filters applied to raw detection output.
//!
//! Order is part of the contract: deduplication runs before the accuracy
//! filter, so threshold decisions are never skewed by counting duplicates.

use shoresweep_core::models::{ShorelineDetection, ShorelineSet};
use std::collections::HashSet;

/// Remove duplicate detections - same capture date and same satellite -
/// keeping exactly one (the first in capture order).
pub fn remove_duplicates(set: ShorelineSet) -> ShorelineSet {
    let mut seen: HashSet<(chrono::NaiveDate, String)> = HashSet::new();
    let detections = set
        .detections
        .into_iter()
        .filter(|detection| seen.insert((detection.date, detection.satellite.clone())))
        .collect();

    ShorelineSet {
        site_name: set.site_name,
        detections,
    }
}

/// Remove detections whose reported horizontal georeferencing accuracy
/// exceeds `max_error_m`.
pub fn remove_inaccurate(set: ShorelineSet, max_error_m: f64) -> ShorelineSet {
    let (kept, dropped): (Vec<ShorelineDetection>, Vec<ShorelineDetection>) = set
        .detections
        .into_iter()
        .partition(|detection| detection.georef_accuracy_m <= max_error_m);

    if !dropped.is_empty() {
        tracing::debug!(
            site = %set.site_name,
            dropped = dropped.len(),
            max_error_m,
            "detections dropped by georeferencing accuracy filter"
        );
    }

    ShorelineSet {
        site_name: set.site_name,
        detections: kept,
    }
}

/// The full cleanup pass, in the fixed order the batch processor applies.
pub fn clean_detections(set: ShorelineSet, max_error_m: f64) -> ShorelineSet {
    remove_inaccurate(remove_duplicates(set), max_error_m)
}

//! The dissolve pipeline runner.
//!
//! Walks the per-polygon output directory, then drives the six geometry
//! stages in order, persisting each stage's collection through the store so
//! every intermediate is inspectable after the run.

use shoresweep_core::config::DissolveSettings;
use shoresweep_geo::error::DissolveError;
use shoresweep_geo::features::read_polygon_file;
use shoresweep_geo::stages;
use shoresweep_geo::FeatureCollection;
use shoresweep_store::{CollectionStore, StoreError};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DissolveRunError {
    #[error(transparent)]
    Geometry(#[from] DissolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a completed dissolve run produced, for reporting.
#[derive(Debug, Clone)]
pub struct DissolveReport {
    /// Per-polygon input files consumed.
    pub files: usize,
    /// Vertex segments after splitting, before rejection.
    pub segments: usize,
    /// Segments rejected for exceeding the length ceiling.
    pub rejected: usize,
    /// Dissolved zones found.
    pub zones: usize,
    /// Features in the final collection.
    pub result_features: usize,
    /// Name of the final collection in the store.
    pub result_name: String,
}

pub struct DissolvePipeline<'a, S: CollectionStore> {
    store: &'a S,
}

impl<'a, S: CollectionStore> DissolvePipeline<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run all stages over the `.geojson` files in `source_dir`.
    ///
    /// Stage collections are named `<run_name>_MERGE` through
    /// `<run_name>_RESULT` and each save replaces any collection left by a
    /// previous run, so re-running over the same inputs converges on the
    /// same stored state.
    pub fn run(
        &self,
        source_dir: &Path,
        run_name: &str,
        settings: &DissolveSettings,
    ) -> Result<DissolveReport, DissolveRunError> {
        let parts = self.read_inputs(source_dir, run_name)?;
        let files = parts.len();

        let merged = stages::merge(&parts, format!("{}_MERGE", run_name));
        self.store.save(&merged)?;
        tracing::info!(files, features = merged.len(), "merge stage complete");

        let raw_split = stages::split_at_vertices(&merged, format!("{}_SPLIT", run_name));
        let segments = raw_split.len();
        let (split, rejected) = stages::reject_long_segments(
            &raw_split,
            settings.max_segment_length.value,
            format!("{}_SPLIT", run_name),
        );
        self.store.save(&split)?;
        tracing::info!(
            segments,
            rejected,
            max_segment_length = settings.max_segment_length.value,
            "split stage complete"
        );

        let buffered = stages::buffer_segments(
            &split,
            settings.buffer_radius.value,
            format!("{}_BUFFER", run_name),
        );
        self.store.save(&buffered)?;

        let zones = stages::dissolve_buffers(&buffered, format!("{}_DISSOLVE", run_name));
        self.store.save(&zones)?;
        tracing::info!(zones = zones.len(), "dissolve stage complete");

        let joined = stages::spatial_join(&split, &zones, format!("{}_SPATIAL_JOIN", run_name))?;
        self.store.save(&joined)?;

        let result_name = format!("{}_RESULT", run_name);
        let result = stages::dissolve_by_zone(&joined, result_name.clone())?;
        self.store.save(&result)?;
        tracing::info!(
            features = result.len(),
            name = %result_name,
            "result stage complete"
        );

        Ok(DissolveReport {
            files,
            segments,
            rejected,
            zones: zones.len(),
            result_features: result.len(),
            result_name,
        })
    }

    /// Discover and ingest the per-polygon files, in sorted name order so
    /// the merged feature order is stable across runs.
    fn read_inputs(
        &self,
        source_dir: &Path,
        run_name: &str,
    ) -> Result<Vec<FeatureCollection>, DissolveRunError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(source_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("geojson") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(DissolveError::NoInputFiles {
                dir: source_dir.to_path_buf(),
            }
            .into());
        }

        let mut parts = Vec::with_capacity(paths.len());
        for path in &paths {
            let collection = read_polygon_file(path, run_name)?;
            tracing::debug!(file = %path.display(), features = collection.len(), "input ingested");
            parts.push(collection);
        }
        Ok(parts)
    }
}

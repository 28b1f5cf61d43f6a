//! The polygon batch processor.
//!
//! Drives the three-step extraction pipeline for each admitted polygon and
//! isolates failures at the per-polygon boundary: one polygon's error is
//! recorded and the loop continues. There is no automatic retry; the
//! operator re-runs with an allow-list narrowed to the failed ids.

use crate::filters;
use shoresweep_core::config::RunConfiguration;
use shoresweep_core::error::PolygonError;
use shoresweep_core::models::{BatchProgress, PerPolygonContext, PolygonRecord};
use shoresweep_core::ports::ShorelineProvider;
use shoresweep_geo::features::{shorelines_to_collection, write_collection};
use std::path::PathBuf;
use std::time::Instant;

/// Receives progress snapshots while the batch runs. The processor calls
/// `snapshot` after every admitted polygon resolves and `finished` once the
/// collection is exhausted.
pub trait StatusReporter {
    fn polygon_started(&mut self, id: &str, site: &str);

    fn polygon_failed(&mut self, id: &str, error: &PolygonError);

    fn snapshot(&mut self, progress: &BatchProgress);

    fn finished(&mut self, progress: &BatchProgress);
}

/// Default reporter: structured log events only.
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn polygon_started(&mut self, id: &str, site: &str) {
        tracing::info!(polygon = id, site, "processing polygon");
    }

    fn polygon_failed(&mut self, id: &str, error: &PolygonError) {
        tracing::error!(polygon = id, error = %error, "polygon failed");
    }

    fn snapshot(&mut self, progress: &BatchProgress) {
        tracing::info!(
            succeeded = progress.succeeded,
            remaining = progress.remaining,
            failed = progress.failed_count(),
            elapsed = ?progress.batch_elapsed(),
            "batch progress"
        );
    }

    fn finished(&mut self, progress: &BatchProgress) {
        tracing::info!(
            succeeded = progress.succeeded,
            failed = progress.failed_count(),
            failed_ids = ?progress.failed_ids,
            skipped = progress.skipped_ids.len(),
            elapsed = ?progress.run_elapsed(),
            "batch finished"
        );
    }
}

/// The control loop over all polygon records for one run.
pub struct PolygonBatchProcessor<'a, P: ShorelineProvider> {
    provider: &'a P,
    config: &'a RunConfiguration,
}

impl<'a, P: ShorelineProvider> PolygonBatchProcessor<'a, P> {
    pub fn new(provider: &'a P, config: &'a RunConfiguration) -> Self {
        Self { provider, config }
    }

    /// Process every record in order, strictly one at a time.
    ///
    /// `run_start` is when argument resolution began, so the final summary
    /// can report total run time separately from loop time.
    pub async fn run(
        &self,
        records: &[PolygonRecord],
        reporter: &mut dyn StatusReporter,
        run_start: Instant,
    ) -> BatchProgress {
        let admitted = records.iter().filter(|r| self.is_admitted(r)).count();
        let mut progress = BatchProgress::new(admitted, run_start);

        for record in records {
            if !self.is_admitted(record) {
                progress.record_skip(record.id.clone());
                continue;
            }

            // Context is derived fresh here and dropped when the polygon
            // resolves; nothing derived leaks into the next iteration.
            let ctx = PerPolygonContext::derive(&self.config.run_name, record);
            reporter.polygon_started(&record.id, &ctx.site_name);

            match self.process_one(&ctx).await {
                Ok(path) => {
                    tracing::info!(site = %ctx.site_name, output = %path.display(), "polygon exported");
                    progress.record_success();
                }
                Err(error) => {
                    reporter.polygon_failed(&record.id, &error);
                    progress.record_failure(record.id.clone());
                }
            }

            reporter.snapshot(&progress);
        }

        if !progress.skipped_ids.is_empty() {
            tracing::info!(
                unprocessed = ?progress.skipped_ids,
                "polygon ids not in the allow-list were not processed"
            );
        }
        reporter.finished(&progress);
        progress
    }

    fn is_admitted(&self, record: &PolygonRecord) -> bool {
        match record.admission_id() {
            Some(id) => self.config.allow_list.contains(&id),
            None => false,
        }
    }

    /// Steps 2-6 for one polygon. Any error returned here is recorded
    /// against the polygon and the batch moves on.
    async fn process_one(&self, ctx: &PerPolygonContext) -> Result<PathBuf, PolygonError> {
        let images = self.provider.retrieve_imagery(ctx, self.config).await?;
        tracing::debug!(site = %ctx.site_name, images = images.len(), "imagery resolved");

        let raw = self.provider.extract_shorelines(&images, self.config).await?;
        let filtered =
            filters::clean_detections(raw, self.config.thresholds.accepted_georef_error_m);

        // Best-effort side channel: a preview failure never fails the
        // polygon.
        if self.config.export_previews {
            if let Err(error) = self.provider.export_previews(&images, ctx).await {
                tracing::warn!(site = %ctx.site_name, error = %error, "preview export failed; continuing");
            }
        }

        if filtered.is_empty() {
            return Err(PolygonError::EmptyShorelineSet {
                site: ctx.site_name.clone(),
            });
        }

        let path = self.output_path(&ctx.site_name);
        let collection = shorelines_to_collection(&filtered);
        write_collection(&collection, &path).map_err(|e| PolygonError::Export {
            site: ctx.site_name.clone(),
            reason: e.to_string(),
        })?;

        Ok(path)
    }

    fn output_path(&self, site_name: &str) -> PathBuf {
        self.config
            .geo_output_root
            .join(format!("{}_output_lines.geojson", site_name))
    }
}

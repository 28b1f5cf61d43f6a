//! Console progress reporter for the extraction batch.

use crate::progress::{create_polygon_bar, finish_error, finish_success};
use console::style;
use indicatif::ProgressBar;
use shoresweep_core::error::PolygonError;
use shoresweep_core::models::BatchProgress;
use shoresweep_pipeline::StatusReporter;

pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    /// `admitted` is how many polygons pass the allow-list; the bar tracks
    /// resolved outcomes, not skips.
    pub fn new(admitted: usize) -> Self {
        Self {
            bar: create_polygon_bar(admitted as u64, "Processing polygons..."),
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn polygon_started(&mut self, id: &str, site: &str) {
        self.bar.set_message(format!("Polygon {} ({})", id, site));
    }

    fn polygon_failed(&mut self, id: &str, error: &PolygonError) {
        self.bar
            .println(format!("{} polygon {}: {}", style("✗").red().bold(), id, error));
    }

    fn snapshot(&mut self, progress: &BatchProgress) {
        self.bar.inc(1);
        self.bar.set_message(format!(
            "{} succeeded, {} failed, {} remaining",
            progress.succeeded,
            progress.failed_count(),
            progress.remaining
        ));
    }

    fn finished(&mut self, progress: &BatchProgress) {
        if progress.failed_ids.is_empty() {
            finish_success(
                &self.bar,
                &format!("{} polygons processed", progress.succeeded),
            );
        } else {
            finish_error(
                &self.bar,
                &format!(
                    "{} processed, {} failed",
                    progress.succeeded,
                    progress.failed_count()
                ),
            );
        }
    }
}

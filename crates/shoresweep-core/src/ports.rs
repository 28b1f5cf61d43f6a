//! Port trait definitions
//!
//! The batch processor drives the external shoreline-detection toolkit
//! through this interface; adapters decide whether imagery comes from a
//! remote archive or from files already staged on disk.

use crate::config::RunConfiguration;
use crate::error::PolygonError;
use crate::models::{ImageSet, PerPolygonContext, ShorelineSet};
use async_trait::async_trait;

/// Port to the external shoreline-extraction toolkit.
///
/// Every method may block for an externally-variable duration (network or
/// disk bound). All failures are per-polygon: the batch loop records them
/// and continues, so implementations must not panic on upstream errors.
#[async_trait]
pub trait ShorelineProvider: Send + Sync {
    /// Resolve the imagery for one site.
    ///
    /// When `config.download_imagery` is false this must resolve and
    /// validate already-present local imagery; absence of local imagery is
    /// an error, never a silently empty set.
    async fn retrieve_imagery(
        &self,
        ctx: &PerPolygonContext,
        config: &RunConfiguration,
    ) -> std::result::Result<ImageSet, PolygonError>;

    /// Run shoreline detection over a resolved image set.
    async fn extract_shorelines(
        &self,
        images: &ImageSet,
        config: &RunConfiguration,
    ) -> std::result::Result<ShorelineSet, PolygonError>;

    /// Persist per-image preview artifacts. Best-effort side channel: the
    /// batch loop logs failures here without failing the polygon.
    async fn export_previews(
        &self,
        images: &ImageSet,
        ctx: &PerPolygonContext,
    ) -> std::result::Result<(), PolygonError>;
}

//! Shoresweep Pipeline - The two batch stages
//!
//! [`batch`] drives the per-polygon extraction loop with per-item failure
//! isolation; [`dissolve`] reassembles the per-polygon outputs into one
//! deduplicated network of shoreline segments. [`providers`] holds the
//! shipped adapter over detector output staged on disk.

pub mod batch;
pub mod dissolve;
pub mod filters;
pub mod providers;

pub use batch::{PolygonBatchProcessor, StatusReporter, TracingReporter};
pub use dissolve::{DissolvePipeline, DissolveReport, DissolveRunError};
pub use providers::LocalCatalogProvider;

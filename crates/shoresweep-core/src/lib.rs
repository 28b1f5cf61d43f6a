//! Shoresweep Core - Domain models, configuration, and the provider port
//!
//! This crate contains the shared data model for both pipelines: the polygon
//! source, the immutable run configuration, and the port the batch processor
//! drives to reach the external shoreline-detection toolkit.

pub mod config;
pub mod error;
pub mod models;
pub mod polygons;
pub mod ports;

pub use error::{PolygonError, Result, RunError};

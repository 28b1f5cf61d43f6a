//! Shoresweep Geo - Typed feature collections and the dissolve stages
//!
//! Everything here is pure geometry: each stage function consumes
//! collections and returns exactly one new collection, so stages are
//! idempotent and individually re-runnable given their inputs.

pub mod error;
pub mod features;
pub mod stages;

pub use error::DissolveError;
pub use features::{Feature, FeatureCollection, FeatureGeometry};

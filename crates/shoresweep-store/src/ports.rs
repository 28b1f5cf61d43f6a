//! Port trait for collection persistence.

use shoresweep_geo::FeatureCollection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Invalid collection {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists named feature collections. Synchronous by design: every backend
/// is local, and the dissolve pipeline that drives it runs one stage at a
/// time with a single writer per store location.
pub trait CollectionStore {
    /// Persist a collection under its name, replacing any previous version.
    fn save(&self, collection: &FeatureCollection) -> Result<(), StoreError>;

    /// Load a collection by name.
    fn load(&self, name: &str) -> Result<FeatureCollection, StoreError>;

    /// Whether a collection with this name exists.
    fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Names of all stored collections, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

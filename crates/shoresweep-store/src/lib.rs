//! Shoresweep Store - Persistence for named feature collections
//!
//! Every dissolve stage writes its output through the [`CollectionStore`]
//! port, so intermediate results survive the run and any stage can be
//! re-run from its inputs. Backends: a GeoJSON directory store for real
//! runs and an in-memory store for tests.

pub mod fs;
pub mod memory;
pub mod ports;

pub use fs::GeoJsonDirStore;
pub use memory::MemoryStore;
pub use ports::{CollectionStore, StoreError};

//! In-memory collection store for tests and dry runs.

use crate::ports::{CollectionStore, StoreError};
use shoresweep_geo::FeatureCollection;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, FeatureCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryStore {
    fn save(&self, collection: &FeatureCollection) -> Result<(), StoreError> {
        self.collections
            .write()
            .expect("store lock poisoned")
            .insert(collection.name.clone(), collection.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<FeatureCollection, StoreError> {
        self.collections
            .read()
            .expect("store lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound {
                name: name.to_string(),
            })
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .collections
            .read()
            .expect("store lock poisoned")
            .contains_key(name))
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .expect("store lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let collection = FeatureCollection::new("RUN_RESULT", vec![]);

        store.save(&collection).unwrap();

        assert!(store.exists("RUN_RESULT").unwrap());
        assert_eq!(store.load("RUN_RESULT").unwrap(), collection);
        assert_eq!(store.list().unwrap(), vec!["RUN_RESULT".to_string()]);
    }

    #[test]
    fn test_memory_store_missing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load("NOPE").unwrap_err(),
            StoreError::CollectionNotFound { .. }
        ));
    }
}

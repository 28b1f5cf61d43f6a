//! GeoJSON directory store: one `<name>.geojson` file per collection.

use crate::ports::{CollectionStore, StoreError};
use shoresweep_geo::features::{parse_collection, to_geojson_string};
use shoresweep_geo::FeatureCollection;
use std::fs;
use std::path::{Path, PathBuf};

pub struct GeoJsonDirStore {
    root: PathBuf,
}

impl GeoJsonDirStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.geojson", name))
    }
}

impl CollectionStore for GeoJsonDirStore {
    fn save(&self, collection: &FeatureCollection) -> Result<(), StoreError> {
        let path = self.path_for(&collection.name);
        fs::write(&path, to_geojson_string(collection))?;
        tracing::debug!(name = %collection.name, features = collection.len(), "collection saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<FeatureCollection, StoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(StoreError::CollectionNotFound {
                name: name.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        parse_collection(name, &content).map_err(|e| StoreError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(name).exists())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("geojson") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

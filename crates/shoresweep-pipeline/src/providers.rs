//! Provider adapter over detector output staged on the filesystem.
//!
//! The external detection toolkit leaves one directory per site under the
//! imagery root: a `catalog.json` listing every capture plus one shoreline
//! GeoJSON per capture. This adapter resolves and validates that layout
//! behind the [`ShorelineProvider`] port; a networked imagery backend would
//! be another implementation of the same port.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shoresweep_core::config::RunConfiguration;
use shoresweep_core::error::PolygonError;
use shoresweep_core::models::{
    ImageMetadata, ImageSet, PerPolygonContext, ShorelineDetection, ShorelineSet,
};
use shoresweep_core::ports::ShorelineProvider;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-site catalog file the detector writes.
pub const CATALOG_FILE: &str = "catalog.json";

/// One capture entry in a site catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub date: NaiveDate,
    pub satellite: String,
    pub georef_accuracy_m: f64,
    /// Shoreline GeoJSON path, relative to the site directory.
    pub shoreline: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Catalog {
    images: Vec<CatalogEntry>,
}

pub struct LocalCatalogProvider;

impl LocalCatalogProvider {
    pub fn new() -> Self {
        Self
    }

    fn site_dir(config: &RunConfiguration, site: &str) -> PathBuf {
        config.imagery_root.join(site)
    }

    fn read_catalog(site_dir: &Path, site: &str) -> Result<Catalog, PolygonError> {
        let path = site_dir.join(CATALOG_FILE);
        if !path.exists() {
            return Err(PolygonError::NoImagery {
                site: site.to_string(),
                reason: format!("no {} under {}", CATALOG_FILE, site_dir.display()),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| PolygonError::Retrieval {
            site: site.to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| PolygonError::Retrieval {
            site: site.to_string(),
            reason: format!("invalid catalog {}: {}", path.display(), e),
        })
    }
}

impl Default for LocalCatalogProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShorelineProvider for LocalCatalogProvider {
    async fn retrieve_imagery(
        &self,
        ctx: &PerPolygonContext,
        config: &RunConfiguration,
    ) -> Result<ImageSet, PolygonError> {
        let site = ctx.site_name.clone();

        if config.download_imagery {
            return Err(PolygonError::Retrieval {
                site,
                reason: "remote imagery download is not available through the local catalog \
                         provider; run the external detector to stage imagery first"
                    .to_string(),
            });
        }

        let site_dir = Self::site_dir(config, &site);
        let catalog = Self::read_catalog(&site_dir, &site)?;

        let mut images = Vec::new();
        for entry in catalog.images {
            if !config.date_range.contains(entry.date) {
                continue;
            }
            if !config.satellites.iter().any(|s| s == &entry.satellite) {
                continue;
            }

            let shoreline_path = site_dir.join(&entry.shoreline);
            if !shoreline_path.exists() {
                return Err(PolygonError::NoImagery {
                    site,
                    reason: format!(
                        "catalog references missing shoreline file {}",
                        shoreline_path.display()
                    ),
                });
            }

            images.push(ImageMetadata {
                date: entry.date,
                satellite: entry.satellite,
                georef_accuracy_m: entry.georef_accuracy_m,
                shoreline_path,
            });
        }

        if images.is_empty() {
            return Err(PolygonError::NoImagery {
                site,
                reason: "no staged imagery matches the configured date range and satellites"
                    .to_string(),
            });
        }

        Ok(ImageSet {
            site_name: ctx.site_name.clone(),
            images,
        })
    }

    async fn extract_shorelines(
        &self,
        images: &ImageSet,
        _config: &RunConfiguration,
    ) -> Result<ShorelineSet, PolygonError> {
        let mut detections = Vec::new();
        for image in &images.images {
            let content =
                fs::read_to_string(&image.shoreline_path).map_err(|e| PolygonError::Extraction {
                    site: images.site_name.clone(),
                    reason: format!("cannot read {}: {}", image.shoreline_path.display(), e),
                })?;

            let collection = shoresweep_geo::features::parse_collection(
                images.site_name.clone(),
                &content,
            )
            .map_err(|e| PolygonError::Extraction {
                site: images.site_name.clone(),
                reason: e.to_string(),
            })?;

            for feature in &collection.features {
                for line in feature.line_parts() {
                    detections.push(ShorelineDetection {
                        date: image.date,
                        satellite: image.satellite.clone(),
                        georef_accuracy_m: image.georef_accuracy_m,
                        line: line.clone(),
                    });
                }
            }
        }

        Ok(ShorelineSet {
            site_name: images.site_name.clone(),
            detections,
        })
    }

    async fn export_previews(
        &self,
        images: &ImageSet,
        ctx: &PerPolygonContext,
    ) -> Result<(), PolygonError> {
        // One summary per capture under <site>/previews/.
        let first = images.images.first().ok_or_else(|| PolygonError::PreviewExport {
            site: ctx.site_name.clone(),
            reason: "image set is empty".to_string(),
        })?;
        let site_dir = first
            .shoreline_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let preview_dir = site_dir.join("previews");

        fs::create_dir_all(&preview_dir).map_err(|e| PolygonError::PreviewExport {
            site: ctx.site_name.clone(),
            reason: e.to_string(),
        })?;

        for image in &images.images {
            let path = preview_dir.join(format!("{}_{}.json", image.date, image.satellite));
            let summary = serde_json::json!({
                "site": ctx.site_name,
                "date": image.date,
                "satellite": image.satellite,
                "georef_accuracy_m": image.georef_accuracy_m,
            });
            fs::write(&path, summary.to_string()).map_err(|e| PolygonError::PreviewExport {
                site: ctx.site_name.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoresweep_core::config::{DateRange, GeometryThresholds};
    use shoresweep_core::models::PolygonRecord;
    use std::collections::HashSet;

    const SHORELINE_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[0.0, 0.0], [1.0, 0.5]]
            }
        }]
    }"#;

    fn config(imagery_root: &Path) -> RunConfiguration {
        RunConfiguration {
            run_name: "RUN".to_string(),
            date_range: DateRange {
                start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            },
            satellites: vec!["S2".to_string()],
            allow_list: HashSet::from([1]),
            imagery_root: imagery_root.to_path_buf(),
            geo_output_root: imagery_root.join("out"),
            download_imagery: false,
            export_previews: false,
            thresholds: GeometryThresholds::default(),
        }
    }

    fn ctx() -> PerPolygonContext {
        PerPolygonContext::derive(
            "RUN",
            &PolygonRecord {
                id: "1".to_string(),
                boundary: vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
            },
        )
    }

    fn stage_site(root: &Path, entries: &str) {
        let site_dir = root.join("RUN_1");
        fs::create_dir_all(&site_dir).unwrap();
        fs::write(site_dir.join("shore_a.geojson"), SHORELINE_GEOJSON).unwrap();
        fs::write(site_dir.join(CATALOG_FILE), entries).unwrap();
    }

    #[tokio::test]
    async fn test_catalog_filtered_by_date_and_satellite() {
        let dir = tempfile::tempdir().unwrap();
        stage_site(
            dir.path(),
            r#"{"images": [
                {"date": "2023-05-23", "satellite": "S2", "georef_accuracy_m": 5.0, "shoreline": "shore_a.geojson"},
                {"date": "2022-05-23", "satellite": "S2", "georef_accuracy_m": 5.0, "shoreline": "shore_a.geojson"},
                {"date": "2023-06-01", "satellite": "L8", "georef_accuracy_m": 5.0, "shoreline": "shore_a.geojson"}
            ]}"#,
        );

        let provider = LocalCatalogProvider::new();
        let images = provider
            .retrieve_imagery(&ctx(), &config(dir.path()))
            .await
            .unwrap();

        // Out-of-range date and unlisted satellite are filtered out.
        assert_eq!(images.len(), 1);
        assert_eq!(images.images[0].satellite, "S2");
    }

    #[tokio::test]
    async fn test_missing_catalog_is_no_imagery() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalCatalogProvider::new();

        let err = provider
            .retrieve_imagery(&ctx(), &config(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, PolygonError::NoImagery { .. }));
    }

    #[tokio::test]
    async fn test_download_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.download_imagery = true;

        let err = LocalCatalogProvider::new()
            .retrieve_imagery(&ctx(), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PolygonError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn test_nothing_in_range_is_no_imagery() {
        let dir = tempfile::tempdir().unwrap();
        stage_site(
            dir.path(),
            r#"{"images": [
                {"date": "2020-05-23", "satellite": "S2", "georef_accuracy_m": 5.0, "shoreline": "shore_a.geojson"}
            ]}"#,
        );

        let err = LocalCatalogProvider::new()
            .retrieve_imagery(&ctx(), &config(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, PolygonError::NoImagery { .. }));
    }

    #[tokio::test]
    async fn test_extract_reads_staged_shorelines() {
        let dir = tempfile::tempdir().unwrap();
        stage_site(
            dir.path(),
            r#"{"images": [
                {"date": "2023-05-23", "satellite": "S2", "georef_accuracy_m": 5.0, "shoreline": "shore_a.geojson"}
            ]}"#,
        );

        let provider = LocalCatalogProvider::new();
        let run_config = config(dir.path());
        let images = provider.retrieve_imagery(&ctx(), &run_config).await.unwrap();
        let shorelines = provider
            .extract_shorelines(&images, &run_config)
            .await
            .unwrap();

        assert_eq!(shorelines.len(), 1);
        assert_eq!(shorelines.detections[0].satellite, "S2");
        assert_eq!(shorelines.detections[0].line.0.len(), 2);
    }
}

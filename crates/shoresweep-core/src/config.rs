use crate::error::{Result, RunError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Inclusive calendar date range with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Detection thresholds handed to the external toolkit plus the accuracy
/// cutoff applied by the cleanup filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryThresholds {
    /// Maximum accepted cloud fraction, in [0, 1].
    pub cloud_fraction: f64,
    /// Minimum area (m^2) for an object to count as beach.
    pub min_beach_area_m2: f64,
    /// Minimum shoreline perimeter length (m) to be valid.
    pub min_shoreline_length_m: f64,
    /// Maximum accepted horizontal georeferencing error (m).
    pub accepted_georef_error_m: f64,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self {
            cloud_fraction: 0.9,
            min_beach_area_m2: 1000.0,
            min_shoreline_length_m: 500.0,
            accepted_georef_error_m: 10.0,
        }
    }
}

/// Run-wide parameters, assembled once per run and immutable thereafter.
///
/// Shared by reference across all per-polygon processing; per-polygon state
/// lives in a freshly derived `PerPolygonContext` instead.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Names the run; site names are `<run_name>_<polygon_id>`.
    pub run_name: String,
    pub date_range: DateRange,
    pub satellites: Vec<String>,
    /// Polygon ids eligible for processing, as integers.
    pub allow_list: HashSet<i64>,
    /// Root of staged imagery: one `<site_name>/` directory per site.
    pub imagery_root: PathBuf,
    /// Where per-polygon vector outputs are written.
    pub geo_output_root: PathBuf,
    pub download_imagery: bool,
    pub export_previews: bool,
    pub thresholds: GeometryThresholds,
}

impl RunConfiguration {
    /// Validate run-wide parameters. Called once, before any polygon is
    /// processed; every violation here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.run_name.trim().is_empty() {
            return Err(RunError::ConfigMissing {
                key: "run_name".to_string(),
            });
        }

        if self.date_range.start >= self.date_range.end {
            return Err(RunError::ConfigInvalid {
                key: "date_range".to_string(),
                reason: format!(
                    "start {} must be before end {}",
                    self.date_range.start, self.date_range.end
                ),
            });
        }

        if self.satellites.is_empty() {
            return Err(RunError::ConfigInvalid {
                key: "satellites".to_string(),
                reason: "at least one satellite identifier is required".to_string(),
            });
        }

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.cloud_fraction) {
            return Err(RunError::ConfigInvalid {
                key: "thresholds.cloud_fraction".to_string(),
                reason: format!("{} is outside [0, 1]", t.cloud_fraction),
            });
        }
        for (key, value) in [
            ("thresholds.min_beach_area_m2", t.min_beach_area_m2),
            ("thresholds.min_shoreline_length_m", t.min_shoreline_length_m),
            ("thresholds.accepted_georef_error_m", t.accepted_georef_error_m),
        ] {
            if value <= 0.0 {
                return Err(RunError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("{} must be positive", value),
                });
            }
        }

        Ok(())
    }
}

/// Dissolve-pipeline tunables.
///
/// Both values are deliberate heuristics, so they are configuration, not
/// constants: segments longer than `max_segment_length` are treated as
/// spurious bridges between disjoint reaches, and `buffer_radius` sets the
/// overlap test for "same shoreline from adjacent tiles".
#[derive(Debug, Clone)]
pub struct DissolveSettings {
    /// Segments strictly longer than this (output linear unit) are rejected.
    pub max_segment_length: ConfigValue<f64>,
    /// Buffer radius (output linear unit) around each surviving segment.
    pub buffer_radius: ConfigValue<f64>,
}

impl DissolveSettings {
    /// Create settings with default values
    pub fn with_defaults() -> Self {
        Self {
            max_segment_length: ConfigValue::new(40.0, ConfigSource::Default),
            buffer_radius: ConfigValue::new(2.0, ConfigSource::Default),
        }
    }

    /// Load settings from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let file_config = FileConfig::read(path.as_ref())?;

        if let Some(max_segment_length) = file_config.max_segment_length {
            self.max_segment_length.update(max_segment_length, ConfigSource::File);
        }

        if let Some(buffer_radius) = file_config.buffer_radius {
            self.buffer_radius.update(buffer_radius, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load settings from environment variables
    pub fn load_from_env(mut self) -> Self {
        // SHORESWEEP_MAX_SEGMENT_LENGTH
        if let Ok(raw) = env::var("SHORESWEEP_MAX_SEGMENT_LENGTH") {
            match raw.parse::<f64>() {
                Ok(v) => self.max_segment_length.update(v, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHORESWEEP_MAX_SEGMENT_LENGTH value '{}': expected a number",
                    raw
                ),
            }
        }

        // SHORESWEEP_BUFFER_RADIUS
        if let Ok(raw) = env::var("SHORESWEEP_BUFFER_RADIUS") {
            match raw.parse::<f64>() {
                Ok(v) => self.buffer_radius.update(v, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHORESWEEP_BUFFER_RADIUS value '{}': expected a number",
                    raw
                ),
            }
        }

        self
    }

    /// Update settings from CLI arguments
    pub fn update_from_cli(&mut self, max_segment_length: Option<f64>, buffer_radius: Option<f64>) {
        if let Some(v) = max_segment_length {
            self.max_segment_length.update(v, ConfigSource::Cli);
        }

        if let Some(v) = buffer_radius {
            self.buffer_radius.update(v, ConfigSource::Cli);
        }
    }

    /// Validate resolved values
    pub fn validate(&self) -> Result<()> {
        if self.max_segment_length.value <= 0.0 {
            return Err(RunError::ConfigInvalid {
                key: "max_segment_length".to_string(),
                reason: format!("{} must be positive", self.max_segment_length.value),
            });
        }

        if self.buffer_radius.value <= 0.0 {
            return Err(RunError::ConfigInvalid {
                key: "buffer_radius".to_string(),
                reason: format!("{} must be positive", self.buffer_radius.value),
            });
        }

        Ok(())
    }
}

/// One imagery campaign: a named date window and the polygon ids eligible
/// for it. Data-driven from the config file so new dates and areas never
/// require a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub allow_list: Vec<i64>,
}

impl Campaign {
    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn allow_set(&self) -> HashSet<i64> {
        self.allow_list.iter().copied().collect()
    }
}

/// The campaign table loaded from `[[campaign]]` entries in the config file.
#[derive(Debug, Clone, Default)]
pub struct CampaignTable {
    campaigns: Vec<Campaign>,
}

impl CampaignTable {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_config = FileConfig::read(path.as_ref())?;
        Ok(Self {
            campaigns: file_config.campaign.unwrap_or_default(),
        })
    }

    pub fn lookup(&self, name: &str) -> Result<&Campaign> {
        self.campaigns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| RunError::UnknownCampaign {
                name: name.to_string(),
            })
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

/// Configuration loaded from a TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    max_segment_length: Option<f64>,
    buffer_radius: Option<f64>,
    campaign: Option<Vec<Campaign>>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RunError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| RunError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to parse TOML: {}", e),
        })
    }
}

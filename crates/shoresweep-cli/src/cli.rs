use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shoresweep - batch shoreline extraction and dissolve
#[derive(Parser, Debug)]
#[command(name = "shoresweep")]
#[command(about = "Batch shoreline extraction and geometry dissolve", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the per-polygon shoreline extraction batch
    Extract(ExtractArgs),

    /// Dissolve per-polygon outputs into one deduplicated collection
    Dissolve(DissolveArgs),

    /// List the campaigns defined in the config file
    Campaigns(CampaignsArgs),
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Path to the polygon CSV (id,longitude,latitude rows)
    #[arg(long)]
    pub polygons: PathBuf,

    /// Run name; site names become <run-name>_<polygon-id>
    #[arg(long)]
    pub run_name: String,

    /// TOML config file holding the campaign table
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Named campaign supplying the date range and allow-list
    #[arg(long, conflicts_with_all = ["start", "end", "allow"])]
    pub campaign: Option<String>,

    /// Start of the capture date range (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// End of the capture date range (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Comma-separated polygon ids eligible for processing
    #[arg(long, value_name = "IDS")]
    pub allow: Option<String>,

    /// Satellite identifiers to accept (repeatable)
    #[arg(long = "satellite", value_name = "NAME", default_values_t = [String::from("L8"), String::from("S2")])]
    pub satellites: Vec<String>,

    /// Root of staged imagery, one directory per site
    #[arg(long, default_value = "data")]
    pub imagery_root: PathBuf,

    /// Where per-polygon GeoJSON outputs are written
    /// (defaults to <imagery-root>/GEOJSON)
    #[arg(long)]
    pub geo_output_root: Option<PathBuf>,

    /// Request remote imagery download instead of staged-only
    #[arg(long)]
    pub download: bool,

    /// Export per-image preview summaries (best-effort)
    #[arg(long)]
    pub previews: bool,

    /// Maximum accepted horizontal georeferencing error, meters
    #[arg(long)]
    pub accepted_georef_error: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct DissolveArgs {
    /// Run name; stage collections are <name>_MERGE through <name>_RESULT
    pub name: String,

    /// Directory holding the per-polygon .geojson outputs
    #[arg(long)]
    pub source_dir: PathBuf,

    /// Where stage collections are persisted
    /// (defaults to <source-dir>/stages)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// TOML config file with dissolve tunables
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reject split segments strictly longer than this
    #[arg(long)]
    pub max_segment_length: Option<f64>,

    /// Buffer radius around each surviving segment
    #[arg(long)]
    pub buffer_radius: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct CampaignsArgs {
    /// TOML config file holding the campaign table
    #[arg(long)]
    pub config: PathBuf,
}

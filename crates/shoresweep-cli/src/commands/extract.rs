//! `extract` - run the per-polygon shoreline extraction batch.

use crate::cli::ExtractArgs;
use crate::output::OutputWriter;
use crate::report::ConsoleReporter;
use anyhow::{bail, Context, Result};
use shoresweep_core::config::{CampaignTable, DateRange, GeometryThresholds, RunConfiguration};
use shoresweep_core::polygons;
use shoresweep_pipeline::{LocalCatalogProvider, PolygonBatchProcessor};
use std::collections::HashSet;
use std::time::Instant;

pub async fn execute(args: ExtractArgs, output: &OutputWriter) -> Result<()> {
    let run_start = Instant::now();

    let config = resolve_configuration(&args)?;
    config.validate()?;
    tracing::info!(
        run = %config.run_name,
        start = %config.date_range.start,
        end = %config.date_range.end,
        satellites = ?config.satellites,
        "extraction batch starting"
    );

    let records = polygons::load(&args.polygons)?;
    output.info(format!(
        "{} polygons loaded from {}",
        records.len(),
        args.polygons.display()
    ));

    let admitted = records
        .iter()
        .filter(|r| {
            r.admission_id()
                .map(|id| config.allow_list.contains(&id))
                .unwrap_or(false)
        })
        .count();
    if admitted == 0 {
        output.warning("no polygon ids match the allow-list; nothing to process");
    }

    let provider = LocalCatalogProvider::new();
    let processor = PolygonBatchProcessor::new(&provider, &config);
    let mut reporter = ConsoleReporter::new(admitted);

    let progress = processor.run(&records, &mut reporter, run_start).await;

    output.kv("Succeeded", progress.succeeded);
    output.kv("Failed", progress.failed_count());
    if !progress.failed_ids.is_empty() {
        output.warning(format!(
            "failed polygon ids: {}",
            progress.failed_ids.join(", ")
        ));
    }
    if !progress.skipped_ids.is_empty() {
        output.info(format!(
            "not in allow-list (unprocessed): {}",
            progress.skipped_ids.join(", ")
        ));
    }
    output.kv(
        "Batch time",
        format!("{:.1}s", progress.batch_elapsed().as_secs_f64()),
    );
    output.kv(
        "Total run time",
        format!("{:.1}s", progress.run_elapsed().as_secs_f64()),
    );

    if progress.succeeded > 0 {
        output.success(format!(
            "outputs written under {}",
            config.geo_output_root.display()
        ));
    }

    Ok(())
}

/// Assemble the immutable run configuration from a campaign or from
/// explicit flags. Campaigns and explicit date flags are mutually
/// exclusive at the clap level.
fn resolve_configuration(args: &ExtractArgs) -> Result<RunConfiguration> {
    let (date_range, allow_list) = match &args.campaign {
        Some(name) => {
            let config_path = args
                .config
                .as_ref()
                .context("--campaign requires --config pointing at the campaign table")?;
            let table = CampaignTable::load_from_file(config_path)?;
            let campaign = table.lookup(name)?;
            (campaign.date_range(), campaign.allow_set())
        }
        None => {
            let (Some(start), Some(end)) = (args.start, args.end) else {
                bail!("either --campaign or both --start and --end are required");
            };
            let allow = args
                .allow
                .as_deref()
                .context("--allow is required when no campaign is selected")?;
            (DateRange { start, end }, parse_allow_list(allow)?)
        }
    };

    let mut thresholds = GeometryThresholds::default();
    if let Some(accuracy) = args.accepted_georef_error {
        thresholds.accepted_georef_error_m = accuracy;
    }

    Ok(RunConfiguration {
        run_name: args.run_name.clone(),
        date_range,
        satellites: args.satellites.clone(),
        allow_list,
        imagery_root: args.imagery_root.clone(),
        geo_output_root: args
            .geo_output_root
            .clone()
            .unwrap_or_else(|| args.imagery_root.join("GEOJSON")),
        download_imagery: args.download,
        export_previews: args.previews,
        thresholds,
    })
}

/// Parse a comma-separated id list, e.g. `1,3,17`.
fn parse_allow_list(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("invalid polygon id in --allow: '{}'", s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allow_list() {
        let allow = parse_allow_list("1, 3,17").unwrap();
        assert_eq!(allow, HashSet::from([1, 3, 17]));
    }

    #[test]
    fn test_parse_allow_list_rejects_garbage() {
        assert!(parse_allow_list("1,two").is_err());
    }

    #[test]
    fn test_parse_allow_list_skips_empty_entries() {
        let allow = parse_allow_list("1,,2,").unwrap();
        assert_eq!(allow, HashSet::from([1, 2]));
    }
}

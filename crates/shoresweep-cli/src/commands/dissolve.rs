//! `dissolve` - merge per-polygon outputs into one deduplicated collection.

use crate::cli::DissolveArgs;
use crate::output::OutputWriter;
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::Result;
use shoresweep_core::config::DissolveSettings;
use shoresweep_pipeline::DissolvePipeline;
use shoresweep_store::GeoJsonDirStore;

pub fn execute(args: DissolveArgs, output: &OutputWriter) -> Result<()> {
    let mut settings = DissolveSettings::with_defaults();
    if let Some(path) = &args.config {
        settings = settings.load_from_file(path)?;
    }
    settings = settings.load_from_env();
    settings.update_from_cli(args.max_segment_length, args.buffer_radius);
    settings.validate()?;

    let store_dir = args
        .store_dir
        .clone()
        .unwrap_or_else(|| args.source_dir.join("stages"));
    let store = GeoJsonDirStore::open(&store_dir)?;
    tracing::info!(
        run = %args.name,
        source = %args.source_dir.display(),
        "dissolve run starting"
    );

    output.kv("Source", args.source_dir.display());
    output.kv("Stage store", store_dir.display());
    output.kv(
        "Max segment length",
        format!(
            "{} ({:?})",
            settings.max_segment_length.value, settings.max_segment_length.source
        ),
    );
    output.kv(
        "Buffer radius",
        format!(
            "{} ({:?})",
            settings.buffer_radius.value, settings.buffer_radius.source
        ),
    );

    let spinner = create_spinner("Dissolving shoreline segments...");
    let pipeline = DissolvePipeline::new(&store);
    let report = match pipeline.run(&args.source_dir, &args.name, &settings) {
        Ok(report) => {
            finish_success(&spinner, "dissolve complete");
            report
        }
        Err(error) => {
            finish_error(&spinner, "dissolve failed");
            return Err(error.into());
        }
    };

    output.kv("Input files", report.files);
    output.kv("Segments", report.segments);
    output.kv("Rejected (too long)", report.rejected);
    output.kv("Zones", report.zones);
    output.kv("Result features", report.result_features);
    output.success(format!(
        "result collection '{}' written under {}",
        report.result_name,
        store_dir.display()
    ));

    Ok(())
}

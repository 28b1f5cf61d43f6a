//! `campaigns` - list the campaign table from the config file.

use crate::cli::CampaignsArgs;
use crate::output::OutputWriter;
use anyhow::Result;
use serde::Serialize;
use shoresweep_core::config::CampaignTable;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct CampaignRow {
    #[tabled(rename = "Campaign")]
    name: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Polygons")]
    polygons: usize,
}

pub fn execute(args: CampaignsArgs, output: &OutputWriter) -> Result<()> {
    let table = CampaignTable::load_from_file(&args.config)?;

    if table.is_empty() {
        output.info(format!(
            "no campaigns defined in {}",
            args.config.display()
        ));
        return Ok(());
    }

    let rows: Vec<CampaignRow> = table
        .campaigns()
        .iter()
        .map(|campaign| CampaignRow {
            name: campaign.name.clone(),
            start: campaign.start.to_string(),
            end: campaign.end.to_string(),
            polygons: campaign.allow_list.len(),
        })
        .collect();

    output.table(rows);
    Ok(())
}

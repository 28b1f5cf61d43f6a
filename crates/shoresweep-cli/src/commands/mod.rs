//! Command implementations

mod campaigns;
mod dissolve;
mod extract;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Extract(args) => extract::execute(args, &output).await,
        Commands::Dissolve(args) => dissolve::execute(args, &output),
        Commands::Campaigns(args) => campaigns::execute(args, &output),
    }
}

//! The `tables` subcommand.

use clap::Args;

use super::{StreamOpts, process_document_stream};
use crate::{
    ocr::OcrOpts,
    prelude::*,
    scenarios::tables::TablesScenario,
    structure::StructureConfig,
    ui::{ProgressConfig, Ui},
};

/// Options for the `tables` subcommand.
#[derive(Debug, Args)]
pub struct TablesOpts {
    #[clap(flatten)]
    pub stream_opts: StreamOpts,

    #[clap(flatten)]
    pub ocr_opts: OcrOpts,

    /// Heuristic thresholds, as a TOML or JSON file.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// The `tables` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_tables(ui: &Ui, opts: &TablesOpts) -> Result<()> {
    let config = StructureConfig::load(opts.config.as_deref()).await?;
    process_document_stream(
        ui,
        &opts.stream_opts,
        &opts.ocr_opts,
        &ProgressConfig {
            emoji: "🧾",
            msg: "Detecting tables",
            done_msg: "Detected tables",
        },
        TablesScenario { config },
    )
    .await
}

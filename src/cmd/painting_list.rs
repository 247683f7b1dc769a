//! The `painting-list` subcommand.

use clap::Args;

use super::{StreamOpts, process_document_stream};
use crate::{
    ocr::OcrOpts,
    prelude::*,
    scenarios::painting_list::PaintingListScenario,
    structure::StructureConfig,
    ui::{ProgressConfig, Ui},
};

/// Options for the `painting-list` subcommand.
#[derive(Debug, Args)]
pub struct PaintingListOpts {
    #[clap(flatten)]
    pub stream_opts: StreamOpts,

    #[clap(flatten)]
    pub ocr_opts: OcrOpts,

    /// Heuristic thresholds, as a TOML or JSON file. The `[merge]` section
    /// controls cross-page merging.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// The `painting-list` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_painting_list(ui: &Ui, opts: &PaintingListOpts) -> Result<()> {
    let config = StructureConfig::load(opts.config.as_deref()).await?;
    process_document_stream(
        ui,
        &opts.stream_opts,
        &opts.ocr_opts,
        &ProgressConfig {
            emoji: "🎨",
            msg: "Extracting painting lists",
            done_msg: "Extracted painting lists",
        },
        PaintingListScenario { config },
    )
    .await
}

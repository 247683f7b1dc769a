//! The `layout` subcommand.

use clap::Args;

use super::{StreamOpts, process_document_stream};
use crate::{
    ocr::OcrOpts,
    prelude::*,
    scenarios::layout::LayoutScenario,
    structure::StructureConfig,
    ui::{ProgressConfig, Ui},
};

/// Options for the `layout` subcommand.
#[derive(Debug, Args)]
pub struct LayoutOpts {
    #[clap(flatten)]
    pub stream_opts: StreamOpts,

    #[clap(flatten)]
    pub ocr_opts: OcrOpts,

    /// Heuristic thresholds, as a TOML or JSON file.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// The `layout` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_layout(ui: &Ui, opts: &LayoutOpts) -> Result<()> {
    let config = StructureConfig::load(opts.config.as_deref()).await?;
    process_document_stream(
        ui,
        &opts.stream_opts,
        &opts.ocr_opts,
        &ProgressConfig {
            emoji: "📐",
            msg: "Analyzing layout",
            done_msg: "Analyzed layout",
        },
        LayoutScenario { config },
    )
    .await
}

//! The `ocr` subcommand.

use clap::Args;

use super::{StreamOpts, process_document_stream};
use crate::{
    ocr::OcrOpts,
    prelude::*,
    scenarios::ocr::OcrScenario,
    ui::{ProgressConfig, Ui},
};

/// Options for the `ocr` subcommand.
#[derive(Debug, Args)]
pub struct OcrCmdOpts {
    #[clap(flatten)]
    pub stream_opts: StreamOpts,

    #[clap(flatten)]
    pub ocr_opts: OcrOpts,
}

/// The `ocr` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_ocr(ui: &Ui, opts: &OcrCmdOpts) -> Result<()> {
    process_document_stream(
        ui,
        &opts.stream_opts,
        &opts.ocr_opts,
        &ProgressConfig {
            emoji: "📄",
            msg: "OCRing documents",
            done_msg: "OCRed documents",
        },
        OcrScenario,
    )
    .await
}

//! The `inspection-report` subcommand.

use clap::Args;

use super::{StreamOpts, process_document_stream};
use crate::{
    ocr::OcrOpts,
    prelude::*,
    reports::ReportRules,
    scenarios::inspection_report::InspectionReportScenario,
    ui::{ProgressConfig, Ui},
};

/// Options for the `inspection-report` subcommand.
#[derive(Debug, Args)]
pub struct InspectionReportOpts {
    #[clap(flatten)]
    pub stream_opts: StreamOpts,

    #[clap(flatten)]
    pub ocr_opts: OcrOpts,

    /// Report categories, field patterns and validation rules, as a TOML or
    /// JSON file. Defaults to built-in rules for NDT reports.
    #[clap(long)]
    pub rules: Option<PathBuf>,
}

/// The `inspection-report` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_inspection_report(ui: &Ui, opts: &InspectionReportOpts) -> Result<()> {
    let rules = ReportRules::load(opts.rules.as_deref()).await?;
    process_document_stream(
        ui,
        &opts.stream_opts,
        &opts.ocr_opts,
        &ProgressConfig {
            emoji: "🔍",
            msg: "Reading inspection reports",
            done_msg: "Read inspection reports",
        },
        InspectionReportScenario { rules },
    )
    .await
}

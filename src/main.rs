use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{prelude::*, ui::Ui};

mod async_utils;
mod cmd;
mod cpu_limit;
mod ocr;
mod page_iter;
mod prelude;
mod records;
mod reports;
mod scenarios;
mod structure;
mod ui;

/// Rebuild tables, page layout and report fields from OCR text blocks.
#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    after_help = r#"
External Tools:
  - pdfinfo and pdftocairo (Poppler): needed to read PDFs.
  - tesseract: needed by `--engine tesseract`, with the
    language models named by `--tesseract-lang`.

Environment Variables:
  - RUST_LOG (optional): Log filter, like `debug` or
    `idp_structure=trace`. Defaults to `info`.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: Cmd,
}

/// The subcommands we support. Document subcommands read records with `id`
/// and `path` fields.
#[derive(Debug, Subcommand)]
enum Cmd {
    /// OCR images and PDFs, returning text blocks for each page.
    Ocr(cmd::ocr::OcrCmdOpts),
    /// Detect tables on each page.
    Tables(cmd::tables::TablesOpts),
    /// Classify each text block as a header, footer, title or body text.
    Layout(cmd::layout::LayoutOpts),
    /// Detect tables and merge the ones that continue across pages.
    PaintingList(cmd::painting_list::PaintingListOpts),
    /// Classify NDT inspection reports and extract their fields.
    InspectionReport(cmd::inspection_report::InspectionReportOpts),
    /// Print schemas for input, output and config formats.
    Schema(cmd::schema::SchemaOpts),
}

impl Cmd {
    /// Are we using stdout for output?
    fn using_stdout_for_output(&self) -> bool {
        match self {
            Cmd::Ocr(opts) => opts.stream_opts.output_path.is_none(),
            Cmd::Tables(opts) => opts.stream_opts.output_path.is_none(),
            Cmd::Layout(opts) => opts.stream_opts.output_path.is_none(),
            Cmd::PaintingList(opts) => opts.stream_opts.output_path.is_none(),
            Cmd::InspectionReport(opts) => opts.stream_opts.output_path.is_none(),
            Cmd::Schema(opts) => opts.output_path.is_none(),
        }
    }
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);
    tracing_subscriber::registry().with(subscriber).init();

    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    // Hide the progress bar if we're using stdout for output.
    if opts.subcmd.using_stdout_for_output() {
        ui.hide_progress_bars();
    }

    match &opts.subcmd {
        Cmd::Ocr(opts) => cmd::ocr::cmd_ocr(&ui, opts).await,
        Cmd::Tables(opts) => cmd::tables::cmd_tables(&ui, opts).await,
        Cmd::Layout(opts) => cmd::layout::cmd_layout(&ui, opts).await,
        Cmd::PaintingList(opts) => cmd::painting_list::cmd_painting_list(&ui, opts).await,
        Cmd::InspectionReport(opts) => {
            cmd::inspection_report::cmd_inspection_report(&ui, opts).await
        }
        Cmd::Schema(schema_opts) => cmd::schema::cmd_schema(schema_opts).await,
    }
}

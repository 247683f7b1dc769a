//! The `schema` subcommand.

use clap::{Args, ValueEnum};
use schemars::schema_for;
use tokio::io::AsyncWriteExt as _;

use crate::{
    async_utils::io::create_writer,
    prelude::*,
    records::{DocumentInput, WorkOutput},
    reports::rules::RulesFile,
    scenarios::{
        inspection_report::InspectionReportOutput, layout::LayoutOutput, ocr::OcrOutput,
        painting_list::PaintingListOutput, tables::TablesOutput,
    },
    structure::StructureConfig,
};

/// The different schema types we support.
///
/// We parse these as PascalCase, because they represent type names.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "PascalCase")]
pub enum SchemaType {
    /// Input records for every document subcommand.
    DocumentInput,
    /// The `--config` file.
    StructureConfig,
    /// The `--rules` file.
    ReportRules,
    /// `ocr` output.
    OcrOutput,
    /// `tables` output.
    TablesOutput,
    /// `layout` output.
    LayoutOutput,
    /// `painting-list` output.
    PaintingListOutput,
    /// `inspection-report` output.
    InspectionReportOutput,
}

/// Schema command line arguments.
#[derive(Debug, Args)]
pub struct SchemaOpts {
    /// The schema type to generate.
    #[clap(value_enum, value_name = "TYPE")]
    pub schema_type: SchemaType,

    /// The output path to write the schema to.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// The `schema` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_schema(schema_opts: &SchemaOpts) -> Result<()> {
    // Output schemas include the record envelope.
    let schema = match schema_opts.schema_type {
        SchemaType::DocumentInput => schema_for!(DocumentInput),
        SchemaType::StructureConfig => schema_for!(StructureConfig),
        SchemaType::ReportRules => schema_for!(RulesFile),
        SchemaType::OcrOutput => schema_for!(WorkOutput<OcrOutput>),
        SchemaType::TablesOutput => schema_for!(WorkOutput<TablesOutput>),
        SchemaType::LayoutOutput => schema_for!(WorkOutput<LayoutOutput>),
        SchemaType::PaintingListOutput => schema_for!(WorkOutput<PaintingListOutput>),
        SchemaType::InspectionReportOutput => {
            schema_for!(WorkOutput<InspectionReportOutput>)
        }
    };

    // Write out our schema.
    let mut wtr = create_writer(schema_opts.output_path.as_deref()).await?;
    let schema_str =
        serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    wtr.write_all(schema_str.as_bytes())
        .await
        .context("failed to write schema")?;
    wtr.flush().await.context("failed to flush schema")?;
    Ok(())
}

//! Command-line entry points.

use std::sync::Arc;

use clap::Args;
use futures::StreamExt as _;

use crate::{
    async_utils::{BoxedStream, io::count_jsonl_or_csv_records},
    ocr::{OcrOpts, engine_for_opts},
    prelude::*,
    records::{DocumentInput, WorkOutput},
    scenarios::{DocumentProcessor, Scenario},
    ui::{ProgressConfig, Ui},
};

pub mod inspection_report;
pub mod layout;
pub mod ocr;
pub mod painting_list;
pub mod schema;
pub mod tables;

/// Common options for subcommands that process document streams.
#[derive(Debug, Clone, Args)]
pub struct StreamOpts {
    /// Input file, with `id` and `path` fields, in JSONL or CSV format.
    /// Reads standard input if omitted.
    pub input_path: Option<PathBuf>,

    /// Output file, in JSONL format. Writes standard output if omitted.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,

    /// Limit processing to the first N records.
    #[clap(long)]
    take_first: Option<usize>,

    /// Max number of documents to process at a time.
    #[clap(short = 'j', long = "jobs", default_value = "4")]
    job_count: usize,

    /// What portion of inputs should we allow to fail? Specified as a
    /// number between 0.0 and 1.0.
    #[clap(long, default_value = "0.01")]
    allowed_failure_rate: f32,

    /// Reject documents larger than this many bytes.
    #[clap(long, default_value = "104857600")]
    max_file_size: u64,
}

impl StreamOpts {
    /// Apply any necessary stream opts to our input stream.
    pub fn apply_stream_input_opts<T>(
        &self,
        input: BoxedStream<Result<T>>,
    ) -> BoxedStream<Result<T>>
    where
        T: 'static,
    {
        if let Some(take_first) = self.take_first {
            input.take(take_first).boxed()
        } else {
            input
        }
    }
}

/// Read documents, OCR them, run `scenario` on each and write the results.
#[instrument(level = "debug", skip_all)]
pub async fn process_document_stream<S: Scenario>(
    ui: &Ui,
    stream_opts: &StreamOpts,
    ocr_opts: &OcrOpts,
    progress: &ProgressConfig<'_>,
    scenario: S,
) -> Result<()> {
    if stream_opts.job_count == 0 {
        return Err(anyhow!("--jobs must be at least 1"));
    }
    let engine = engine_for_opts(ocr_opts)?;
    let processor = Arc::new(DocumentProcessor::new(
        engine,
        scenario,
        stream_opts.max_file_size,
    ));

    // Count our inputs, if we can, for the progress bar.
    let input_path = stream_opts.input_path.as_deref();
    let mut len = match input_path {
        Some(path) => count_jsonl_or_csv_records(ui, path).await?,
        None => None,
    };
    if let (Some(len), Some(take_first)) = (len.as_mut(), stream_opts.take_first) {
        *len = (*len).min(take_first);
    }
    let pb = ui.new_for_len(progress, len);

    let input = stream_opts.apply_stream_input_opts(DocumentInput::read_stream(input_path).await?);
    let output = input
        .map(move |input| {
            let processor = processor.clone();
            async move { Ok::<_, anyhow::Error>(processor.process(input?).await) }
        })
        .buffered(stream_opts.job_count);
    let output = pb.wrap_stream(output).boxed();

    WorkOutput::write_stream(
        ui,
        stream_opts.output_path.as_deref(),
        output,
        stream_opts.allowed_failure_rate,
    )
    .await
}

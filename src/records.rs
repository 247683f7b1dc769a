//! Input and output records.
//!
//! Every subcommand reads one [`DocumentInput`] per document, and writes one
//! [`WorkOutput`] per document, in the same order. A document that can't be
//! processed still produces an output record, with `success: false`.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::StreamExt as _;
use schemars::JsonSchema;

use crate::{
    async_utils::{
        BoxedStream,
        io::{read_jsonl_or_csv, write_output},
    },
    prelude::*,
    ui::Ui,
};

/// A document to process.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DocumentInput {
    /// The ID of the record. Copied to the output as-is.
    pub id: Value,

    /// The path to the document: a PDF or an image, or an OCR results JSON
    /// file when using `--engine precomputed`.
    pub path: PathBuf,
}

impl DocumentInput {
    /// Read a stream of inputs from a [`Path`] or from standard input.
    pub async fn read_stream(path: Option<&Path>) -> Result<BoxedStream<Result<Self>>> {
        Ok(read_jsonl_or_csv(path)
            .await?
            .map(|value| {
                serde_json::from_value::<Self>(value?).context("failed to deserialize input")
            })
            .boxed())
    }

    /// A short name for the document, for output records.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The result of processing one document.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// The document could not be processed. Holds a human-readable reason.
    Failure(String),
}

/// Output record for one document.
#[derive(Clone, Debug, JsonSchema, Serialize)]
pub struct WorkOutput<T>
where
    T: 'static,
{
    /// The ID of the input record.
    pub id: Value,

    /// Did we produce a result for this document?
    pub success: bool,

    /// The file name of the document.
    pub filename: String,

    /// Wall-clock seconds spent on this document, rounded to milliseconds.
    pub processing_time: f64,

    /// Why processing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Problems reported while splitting the document into pages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page_warnings: Vec<String>,

    /// The result, if we have one.
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> WorkOutput<T>
where
    T: Serialize + Send + 'static,
{
    /// Build an output record from a processing outcome.
    pub fn from_outcome(
        input: &DocumentInput,
        elapsed: Duration,
        page_warnings: Vec<String>,
        outcome: Outcome<T>,
    ) -> Self {
        let (data, error) = match outcome {
            Outcome::Success(data) => (Some(data), None),
            Outcome::Failure(error) => (None, Some(error)),
        };
        Self {
            id: input.id.clone(),
            success: error.is_none(),
            filename: input.filename(),
            processing_time: round_millis(elapsed),
            error,
            page_warnings,
            data,
        }
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).context("failed to serialize output")
    }

    /// Write a stream of outputs to a [`Path`] or to standard output, and
    /// fail if too many of them were failures.
    pub async fn write_stream(
        ui: &Ui,
        path: Option<&Path>,
        stream: BoxedStream<Result<Self>>,
        allowed_failure_rate: f32,
    ) -> Result<()> {
        let counters = Arc::new(Mutex::new(WorkOutputCounters::default()));
        let counters_clone = counters.clone();
        let output = stream
            .map(move |output| {
                let output = output?;
                counters_clone.update(&output);
                output.to_json()
            })
            .boxed();
        write_output(path, output).await?;
        counters.finish(ui, allowed_failure_rate)
    }
}

/// Seconds, rounded to 3 decimal places.
fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Running totals over the output stream.
#[derive(Clone, Debug, Default)]
pub struct WorkOutputCounters {
    /// How many records did we write?
    pub total_record_count: usize,

    /// How many of them failed?
    pub failure_count: usize,

    /// How many page warnings did successful records carry?
    pub page_warning_count: usize,
}

/// Methods on `Mutex<WorkOutputCounters>`, which is the type the output
/// stream actually shares.
pub trait WorkOutputCounterExt {
    /// Count one output record.
    fn update<T>(&self, output: &WorkOutput<T>);

    /// Report totals to the user, and check the failure rate.
    fn finish(self: Arc<Self>, ui: &Ui, allowed_failure_rate: f32) -> Result<()>;
}

impl WorkOutputCounterExt for Mutex<WorkOutputCounters> {
    fn update<T>(&self, output: &WorkOutput<T>) {
        let mut counters = self.lock().expect("lock poisoned");
        counters.total_record_count += 1;
        if !output.success {
            counters.failure_count += 1;
        } else {
            counters.page_warning_count += output.page_warnings.len();
        }
    }

    fn finish(self: Arc<Self>, ui: &Ui, allowed_failure_rate: f32) -> Result<()> {
        let counters = self.lock().expect("lock poisoned").to_owned();
        let failure_rate = if counters.total_record_count == 0 {
            0.0
        } else {
            counters.failure_count as f32 / counters.total_record_count as f32
        };
        if failure_rate > allowed_failure_rate {
            return Err(anyhow!(
                "{}/{} ({:.2}%) of outputs were failures, but only {:.2}% were allowed",
                counters.failure_count,
                counters.total_record_count,
                failure_rate * 100.0,
                allowed_failure_rate * 100.0
            ));
        }
        if counters.page_warning_count > 0 {
            ui.display_message(
                "⚠️",
                &format!("{} page warnings reported", counters.page_warning_count),
            );
        }
        if counters.failure_count > 0 {
            ui.display_message(
                "❌",
                &format!("{} records could not be processed", counters.failure_count),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt as _;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Clone, Debug, JsonSchema, Serialize)]
    struct Payload {
        total: usize,
    }

    fn input() -> DocumentInput {
        DocumentInput {
            id: json!(7),
            path: PathBuf::from("scans/report.pdf"),
        }
    }

    #[test]
    fn success_flattens_payload() -> Result<()> {
        let output = WorkOutput::from_outcome(
            &input(),
            Duration::from_micros(12_345),
            vec![],
            Outcome::Success(Payload { total: 3 }),
        );
        assert_eq!(
            output.to_json()?,
            json!({
                "id": 7,
                "success": true,
                "filename": "report.pdf",
                "processing_time": 0.012,
                "total": 3,
            })
        );
        Ok(())
    }

    #[test]
    fn failure_has_error_and_no_payload() -> Result<()> {
        let output = WorkOutput::<Payload>::from_outcome(
            &input(),
            Duration::ZERO,
            vec!["Syntax Warning: bad xref".to_owned()],
            Outcome::Failure("File too large: 10 bytes (max 5)".to_owned()),
        );
        assert_eq!(
            output.to_json()?,
            json!({
                "id": 7,
                "success": false,
                "filename": "report.pdf",
                "processing_time": 0.0,
                "error": "File too large: 10 bytes (max 5)",
                "page_warnings": ["Syntax Warning: bad xref"],
            })
        );
        Ok(())
    }

    #[test]
    fn unknown_input_fields_are_rejected() {
        let result = serde_json::from_value::<DocumentInput>(json!({
            "id": 1,
            "path": "a.pdf",
            "password": "secret",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn failure_rate_is_enforced() {
        let ui = Ui::init_for_tests();
        let counters = Arc::new(Mutex::new(WorkOutputCounters::default()));
        let ok = WorkOutput::from_outcome(
            &input(),
            Duration::ZERO,
            vec![],
            Outcome::Success(Payload { total: 0 }),
        );
        let failed = WorkOutput::<Payload>::from_outcome(
            &input(),
            Duration::ZERO,
            vec![],
            Outcome::Failure("nope".to_owned()),
        );
        counters.update(&ok);
        counters.update(&failed);
        assert!(counters.clone().finish(&ui, 0.5).is_ok());
        assert!(counters.finish(&ui, 0.1).is_err());
    }

    #[tokio::test]
    async fn reads_csv_inputs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "id,path\na,one.png\nb,two.pdf\n")?;
        let inputs = DocumentInput::read_stream(Some(&path))
            .await?
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].id, json!("b"));
        assert_eq!(inputs[1].filename(), "two.pdf");
        Ok(())
    }
}

//! Document processors, one per subcommand.
//!
//! A [`Scenario`] turns one OCRed document into an output payload. The
//! [`DocumentProcessor`] wraps it with everything that happens around it:
//! the file-size guard, OCR, timing, and converting errors into failed
//! records.

use std::{sync::Arc, time::Instant};

use schemars::JsonSchema;

use crate::{
    async_utils::blocking_iter_streams::spawn_blocking_propagating_panics,
    ocr::{OcrDocument, OcrEngine},
    prelude::*,
    records::{DocumentInput, Outcome, WorkOutput},
};

pub mod inspection_report;
pub mod layout;
pub mod ocr;
pub mod painting_list;
pub mod tables;

/// Turns an OCRed document into a result.
pub trait Scenario: Send + Sync + 'static {
    /// The payload of a successful output record.
    type Output: Serialize + JsonSchema + Send + 'static;

    /// Process one document. This is pure CPU work, and it runs on the
    /// blocking thread pool.
    fn process(&self, document: OcrDocument) -> Outcome<Self::Output>;
}

/// Runs a [`Scenario`] on documents from disk.
pub struct DocumentProcessor<S> {
    engine: Arc<dyn OcrEngine>,
    scenario: Arc<S>,
    max_file_size: u64,
}

impl<S: Scenario> DocumentProcessor<S> {
    /// Create a new processor. Documents larger than `max_file_size` bytes
    /// are rejected without being read.
    pub fn new(engine: Arc<dyn OcrEngine>, scenario: S, max_file_size: u64) -> Self {
        Self {
            engine,
            scenario: Arc::new(scenario),
            max_file_size,
        }
    }

    /// Process one document. Never fails: problems with the document become
    /// a failed output record.
    #[instrument(level = "debug", skip_all, fields(id = %input.id))]
    pub async fn process(&self, input: DocumentInput) -> WorkOutput<S::Output> {
        let start = Instant::now();
        let mut page_warnings = vec![];
        let outcome = match self.ocr_and_process(&input.path, &mut page_warnings).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(path = %input.path.display(), "Processing failed: {err:#}");
                Outcome::Failure(format!("{err:?}"))
            }
        };
        WorkOutput::from_outcome(&input, start.elapsed(), page_warnings, outcome)
    }

    async fn ocr_and_process(
        &self,
        path: &Path,
        page_warnings: &mut Vec<String>,
    ) -> Result<Outcome<S::Output>> {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to open {:?}", path.display()))?
            .len();
        if size > self.max_file_size {
            return Ok(Outcome::Failure(format!(
                "File too large: {size} bytes (max {})",
                self.max_file_size
            )));
        }

        let document = self.engine.ocr_file(path).await?;
        page_warnings.extend(document.warnings.iter().cloned());

        let scenario = self.scenario.clone();
        spawn_blocking_propagating_panics(move || scenario.process(document)).await
    }
}

//! Load OCR results that some other tool already produced.
//!
//! Any external OCR provider can feed us by writing one JSON file per
//! document. The `ocr` subcommand's output records are valid input, too.

use crate::{prelude::*, structure::OcrPage};

use super::{OcrDocument, OcrEngine};

/// The on-disk format. Extra fields, like `full_text` or `id`, are ignored.
#[derive(Debug, Deserialize)]
struct PrecomputedFile {
    pages: Vec<OcrPage>,
}

/// An "OCR engine" which reads JSON files of already-OCRed pages.
pub struct PrecomputedOcrEngine {
    max_pages: Option<usize>,
}

impl PrecomputedOcrEngine {
    /// Create a new engine, optionally keeping only the first `max_pages`.
    pub fn new(max_pages: Option<usize>) -> Self {
        Self { max_pages }
    }
}

#[async_trait]
impl OcrEngine for PrecomputedOcrEngine {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    async fn ocr_file(&self, path: &Path) -> Result<OcrDocument> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read OCR results from {:?}", path.display()))?;
        let file = serde_json::from_slice::<PrecomputedFile>(&data)
            .with_context(|| format!("Failed to parse OCR results from {:?}", path.display()))?;

        let mut pages = file.pages;
        let mut warnings = vec![];
        if let Some(max_pages) = self.max_pages
            && pages.len() > max_pages
        {
            warnings.push(format!(
                "Only {}/{} pages processed (because of --max-pages)",
                max_pages,
                pages.len(),
            ));
            pages.truncate(max_pages);
        }
        debug!(pages = pages.len(), "Loaded precomputed OCR results");
        Ok(OcrDocument { pages, warnings })
    }
}

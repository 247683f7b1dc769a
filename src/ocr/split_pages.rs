//! An OCR engine that splits a document into pages, and OCRs each page.

use std::sync::Arc;

use futures::{StreamExt as _, TryStreamExt as _};

use super::{
    OcrDocument, OcrEngine,
    page::{OcrPageEngine, OcrPageInput},
};
use crate::{
    async_utils::blocking_iter_streams::blocking_iter_stream,
    page_iter::{PageIter, PageIterOptions},
    prelude::*,
};

/// An OCR engine that splits a document into pages, and OCRs each page.
pub struct SplitPagesOcrEngine {
    page_iter_opts: PageIterOptions,
    concurrency_limit: usize,
    engine: Arc<dyn OcrPageEngine>,
}

impl SplitPagesOcrEngine {
    /// Create a new `SplitPagesOcrEngine`.
    pub fn new(
        page_iter_opts: PageIterOptions,
        concurrency_limit: usize,
        engine: Arc<dyn OcrPageEngine>,
    ) -> Self {
        Self {
            page_iter_opts,
            concurrency_limit,
            engine,
        }
    }
}

#[async_trait]
impl OcrEngine for SplitPagesOcrEngine {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    async fn ocr_file(&self, path: &Path) -> Result<OcrDocument> {
        let page_iter = PageIter::from_path(path, &self.page_iter_opts)
            .await
            .with_context(|| format!("Failed to separate {:?} into pages", path.display()))?;
        let mut warnings = page_iter.warnings().to_owned();
        if let Err(err) = page_iter.check_complete() {
            warnings.push(err.to_string());
        }

        // Reading a page blocks, so the iterator runs on the blocking pool.
        // Pages are read only as fast as OCR consumes them.
        let pages = blocking_iter_stream(page_iter)
            .enumerate()
            .map(|(idx, page)| {
                let engine = self.engine.clone();
                async move {
                    let input = OcrPageInput {
                        page_number: idx + 1,
                        page: page?,
                    };
                    engine.ocr_page(input).await
                }
            })
            .buffered(self.concurrency_limit)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(OcrDocument { pages, warnings })
    }
}

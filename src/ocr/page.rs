//! Interface for OCRing a single page.

use crate::{page_iter::Page, prelude::*, structure::OcrPage};

/// A page to OCR.
pub struct OcrPageInput {
    /// 1-based page number within the document.
    pub page_number: usize,

    /// The raster image of the page.
    pub page: Page,
}

/// Interface to an OCR engine that works one page at a time.
#[async_trait]
pub trait OcrPageEngine: Send + Sync + 'static {
    /// OCR a single page.
    async fn ocr_page(&self, input: OcrPageInput) -> Result<OcrPage>;
}

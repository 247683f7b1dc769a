//! OCR providers.
//!
//! We don't recognize text ourselves. An [`OcrEngine`] turns a document on
//! disk into [`OcrPage`]s of positioned text blocks, either by running an
//! external OCR tool page by page, or by loading blocks that some other
//! system already produced.

use std::sync::Arc;

use clap::{Args, ValueEnum};

use crate::{page_iter::PageIterOptions, prelude::*, structure::OcrPage};

pub mod page;
pub mod precomputed;
pub mod split_pages;
pub mod tesseract;

/// The OCR result for a whole document.
#[derive(Clone, Debug, Default)]
pub struct OcrDocument {
    /// Pages in document order.
    pub pages: Vec<OcrPage>,

    /// Non-fatal problems, like skipped pages or rasterizer complaints.
    pub warnings: Vec<String>,
}

/// Interface for OCRing a document.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// OCR every page of the document at `path`.
    async fn ocr_file(&self, path: &Path) -> Result<OcrDocument>;
}

/// The OCR providers we support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineName {
    /// Rasterize with Poppler and run the `tesseract` CLI on each page.
    #[default]
    Tesseract,
    /// Each input path is a JSON file of already-OCRed pages.
    Precomputed,
}

/// OCR options shared by every subcommand that reads documents.
#[derive(Args, Clone, Debug)]
pub struct OcrOpts {
    /// Which OCR provider to use.
    #[clap(long, value_enum, default_value_t)]
    pub engine: EngineName,

    /// Tesseract language models to use, joined with `+`.
    #[clap(long, default_value = "chi_sim+eng")]
    pub tesseract_lang: String,

    /// Max number of pages of one document to OCR at a time.
    #[clap(long, default_value = "1")]
    pub page_jobs: usize,

    #[clap(flatten)]
    pub page_iter_opts: PageIterOptions,
}

/// Create the OCR engine selected by `opts`.
pub fn engine_for_opts(opts: &OcrOpts) -> Result<Arc<dyn OcrEngine>> {
    if opts.page_jobs == 0 {
        return Err(anyhow!("--page-jobs must be at least 1"));
    }
    let engine: Arc<dyn OcrEngine> = match opts.engine {
        EngineName::Tesseract => Arc::new(split_pages::SplitPagesOcrEngine::new(
            opts.page_iter_opts.clone(),
            opts.page_jobs,
            Arc::new(tesseract::TesseractOcrPageEngine::new(
                &opts.tesseract_lang,
                opts.page_iter_opts.rasterize_dpi,
            )),
        )),
        EngineName::Precomputed => Arc::new(precomputed::PrecomputedOcrEngine::new(
            opts.page_iter_opts.max_pages,
        )),
    };
    debug!(engine = ?opts.engine, "Created OCR engine");
    Ok(engine)
}

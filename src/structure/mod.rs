//! Document structure recovered from OCR geometry.
//!
//! Everything in here is synchronous, deterministic and free of I/O. The
//! functions take OCRed pages and return plain values, so that the
//! `scenarios` can run them on any thread and tests can call them directly.

pub mod config;
pub mod layout;
pub mod merge;
pub mod rows;
pub mod tables;
pub mod text_block;

pub use self::{
    config::StructureConfig,
    layout::{LayoutPage, classify_page},
    merge::merge_cross_page_tables,
    tables::{TableResult, page_tables},
    text_block::{OcrPage, TextBlock, document_text},
};

/// Detect the tables on every page, in page order.
pub fn extract_tables(pages: &[OcrPage], config: &StructureConfig) -> Vec<TableResult> {
    pages
        .iter()
        .flat_map(|page| page_tables(page, &config.rows, &config.tables))
        .collect()
}

/// Classify the blocks of every page into layout regions.
pub fn analyze_layout(pages: &[OcrPage], config: &StructureConfig) -> Vec<LayoutPage> {
    pages
        .iter()
        .map(|page| classify_page(page, &config.layout))
        .collect()
}

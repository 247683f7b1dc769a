//! Plain OCR: blocks and text for every page.

use schemars::JsonSchema;

use super::Scenario;
use crate::{ocr::OcrDocument, prelude::*, records::Outcome, structure::OcrPage};

/// One OCRed page, with its text joined up for convenience.
#[derive(Clone, Debug, JsonSchema, Serialize)]
pub struct OcrPageOutput {
    #[serde(flatten)]
    pub page: OcrPage,

    /// The text of every block, one per line.
    pub full_text: String,
}

/// Output payload of the `ocr` subcommand.
#[derive(Clone, Debug, JsonSchema, Serialize)]
pub struct OcrOutput {
    pub pages: Vec<OcrPageOutput>,
    pub total_pages: usize,
}

/// Return the OCR results unchanged.
pub struct OcrScenario;

impl Scenario for OcrScenario {
    type Output = OcrOutput;

    fn process(&self, document: OcrDocument) -> Outcome<OcrOutput> {
        let pages = document
            .pages
            .into_iter()
            .map(|page| OcrPageOutput {
                full_text: page.full_text(),
                page,
            })
            .collect::<Vec<_>>();
        Outcome::Success(OcrOutput {
            total_pages: pages.len(),
            pages,
        })
    }
}

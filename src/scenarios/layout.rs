//! Page layout analysis.

use schemars::JsonSchema;

use super::Scenario;
use crate::{
    ocr::OcrDocument,
    prelude::*,
    records::Outcome,
    structure::{LayoutPage, StructureConfig, analyze_layout},
};

/// Output payload of the `layout` subcommand.
#[derive(Clone, Debug, JsonSchema, Serialize)]
pub struct LayoutOutput {
    pub pages: Vec<LayoutPage>,
}

/// Classify every block of every page.
pub struct LayoutScenario {
    pub config: StructureConfig,
}

impl Scenario for LayoutScenario {
    type Output = LayoutOutput;

    fn process(&self, document: OcrDocument) -> Outcome<LayoutOutput> {
        Outcome::Success(LayoutOutput {
            pages: analyze_layout(&document.pages, &self.config),
        })
    }
}

//! Table detection on every page.

use schemars::JsonSchema;

use super::Scenario;
use crate::{
    ocr::OcrDocument,
    prelude::*,
    records::Outcome,
    structure::{StructureConfig, TableResult, extract_tables},
};

/// Output payload of the `tables` subcommand.
#[derive(Clone, Debug, JsonSchema, PartialEq, Serialize)]
pub struct TablesOutput {
    pub tables: Vec<TableResult>,
    pub total_tables: usize,
}

/// Detect tables, page by page, without merging.
pub struct TablesScenario {
    pub config: StructureConfig,
}

impl Scenario for TablesScenario {
    type Output = TablesOutput;

    fn process(&self, document: OcrDocument) -> Outcome<TablesOutput> {
        let tables = extract_tables(&document.pages, &self.config);
        debug!(tables = tables.len(), "Detected tables");
        Outcome::Success(TablesOutput {
            total_tables: tables.len(),
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::structure::{OcrPage, text_block::tests::block_at};

    #[test]
    fn empty_document_has_no_tables() {
        let scenario = TablesScenario {
            config: StructureConfig::default(),
        };
        let document = OcrDocument {
            pages: vec![OcrPage {
                page: 1,
                width: 100,
                height: 100,
                blocks: vec![block_at("alone", 10, 10, 30, 10)],
            }],
            warnings: vec![],
        };
        assert_eq!(
            scenario.process(document),
            Outcome::Success(TablesOutput {
                tables: vec![],
                total_tables: 0,
            })
        );
    }
}

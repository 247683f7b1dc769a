//! Painting lists: long tables that run across several pages.

use schemars::JsonSchema;

use super::Scenario;
use crate::{
    ocr::OcrDocument,
    prelude::*,
    records::Outcome,
    structure::{StructureConfig, TableResult, extract_tables, merge_cross_page_tables},
};

/// A merged table, without per-cell details.
#[derive(Clone, Debug, JsonSchema, PartialEq, Serialize)]
pub struct PaintingTable {
    /// Page where the table starts.
    pub page: usize,
    pub table_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    /// The width of the header row.
    pub col_count: usize,
}

impl From<TableResult> for PaintingTable {
    fn from(table: TableResult) -> Self {
        Self {
            page: table.page,
            table_index: table.table_index,
            row_count: table.rows.len(),
            col_count: table.headers.len(),
            headers: table.headers,
            rows: table.rows,
        }
    }
}

/// Output payload of the `painting-list` subcommand.
#[derive(Clone, Debug, JsonSchema, PartialEq, Serialize)]
pub struct PaintingListOutput {
    pub tables: Vec<PaintingTable>,

    /// Tables after merging.
    pub total_tables: usize,

    /// Tables before merging.
    pub raw_tables_count: usize,

    /// How many tables were merged into the one before them.
    pub merged_count: usize,

    /// Set when there was nothing to merge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_info: Option<String>,
}

/// Detect tables, then join their continuations across page breaks.
pub struct PaintingListScenario {
    pub config: StructureConfig,
}

impl Scenario for PaintingListScenario {
    type Output = PaintingListOutput;

    fn process(&self, document: OcrDocument) -> Outcome<PaintingListOutput> {
        let raw_tables = extract_tables(&document.pages, &self.config);
        let raw_tables_count = raw_tables.len();
        if raw_tables.is_empty() {
            return Outcome::Success(PaintingListOutput {
                tables: vec![],
                total_tables: 0,
                raw_tables_count,
                merged_count: 0,
                merge_info: Some("No tables detected".to_owned()),
            });
        }

        let merged = merge_cross_page_tables(raw_tables, &self.config.merge);
        let merged_count = raw_tables_count - merged.len();
        info!(raw_tables_count, merged_count, "Merged painting list tables");
        Outcome::Success(PaintingListOutput {
            total_tables: merged.len(),
            tables: merged.into_iter().map(PaintingTable::from).collect(),
            raw_tables_count,
            merged_count,
            merge_info: None,
        })
    }
}

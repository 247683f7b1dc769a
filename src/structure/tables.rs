//! Finding table regions in grouped rows.
//!
//! We have no ruling lines and no ML model, only geometry. A table is a run
//! of consecutive rows that each have several blocks, with column counts that
//! stay roughly stable from one row to the next. OCR often splits or joins a
//! cell, so a drift of one column is tolerated.

use schemars::JsonSchema;

use super::{
    config::{RowConfig, TableConfig},
    rows::{Row, group_rows},
    text_block::OcrPage,
};
use crate::prelude::*;

/// One cell of a table, with its provenance.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct TableCell {
    /// Row index. Row 0 is the header.
    pub row: usize,
    /// Column index within the row.
    pub col: usize,
    pub text: String,
    pub confidence: f64,
}

/// A table detected on a page (or merged across several).
///
/// Rows are not guaranteed to be as wide as the header, because our column
/// detection is approximate.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct TableResult {
    /// 1-based page number where the table starts.
    pub page: usize,

    /// 0-based index of this table among the tables detected on its page.
    pub table_index: usize,

    /// The first row of the table.
    pub headers: Vec<String>,

    /// The remaining rows.
    pub rows: Vec<Vec<String>>,

    /// Every cell, header included, with its confidence.
    pub raw_cells: Vec<TableCell>,
}

impl TableResult {
    /// Build a table from a run of rows. The first row becomes the header.
    fn from_rows(rows: &[&Row<'_>], page: usize, table_index: usize) -> Self {
        let mut texts = rows
            .iter()
            .map(|row| row.iter().map(|b| b.text.clone()).collect::<Vec<_>>());
        let headers = texts.next().unwrap_or_default();
        let raw_cells = rows
            .iter()
            .enumerate()
            .flat_map(|(row_idx, row)| {
                row.iter().enumerate().map(move |(col, block)| TableCell {
                    row: row_idx,
                    col,
                    text: block.text.clone(),
                    confidence: block.confidence,
                })
            })
            .collect();
        Self {
            page,
            table_index,
            headers,
            rows: texts.collect(),
            raw_cells,
        }
    }

    /// Number of columns, judged by the header.
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }
}

/// Detect tables in a page's rows.
pub fn detect_tables(rows: &[Row<'_>], page: usize, config: &TableConfig) -> Vec<TableResult> {
    let mut detector = RunDetector {
        config,
        page,
        tables: vec![],
        run: vec![],
        run_width: 0,
    };
    for row in rows {
        detector.push(row);
    }
    detector.finish()
}

/// Group a page into rows, then detect tables.
#[instrument(level = "debug", skip_all, fields(page = page.page))]
pub fn page_tables(
    page: &OcrPage,
    row_config: &RowConfig,
    table_config: &TableConfig,
) -> Vec<TableResult> {
    let rows = group_rows(&page.blocks, row_config);
    let tables = detect_tables(&rows, page.page, table_config);
    debug!(rows = rows.len(), tables = tables.len(), "Detected tables");
    tables
}

/// State of our scan over one page's rows.
struct RunDetector<'r, 'b> {
    config: &'r TableConfig,
    page: usize,
    tables: Vec<TableResult>,
    /// The rows of the currently open run.
    run: Vec<&'r Row<'b>>,
    /// Column count of the last row added to `run`.
    run_width: usize,
}

impl<'r, 'b> RunDetector<'r, 'b> {
    fn push(&mut self, row: &'r Row<'b>) {
        let width = row.len();
        if width < self.config.min_columns {
            self.close_run();
            return;
        }
        if !self.run.is_empty() && width.abs_diff(self.run_width) > self.config.column_drift {
            self.close_run();
        }
        self.run.push(row);
        self.run_width = width;
    }

    /// Materialize the open run if it's long enough, then reset.
    fn close_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        self.run_width = 0;
        if run.len() >= self.config.min_rows {
            let table = TableResult::from_rows(&run, self.page, self.tables.len());
            self.tables.push(table);
        }
    }

    fn finish(mut self) -> Vec<TableResult> {
        self.close_run();
        self.tables
    }
}

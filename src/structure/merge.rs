//! Joining tables that continue across a page break.
//!
//! Scanned documents split long tables over several pages. The continuation
//! either repeats the header row, or starts straight into data that our
//! detector mistook for a header. We handle both, comparing each table only
//! with the table accumulated so far.

use std::collections::HashMap;

use super::{
    config::MergeConfig,
    tables::{TableCell, TableResult},
};
use crate::prelude::*;

/// Why two tables were judged to be one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeKind {
    /// The second table repeats the first one's header row.
    DuplicateHeader,
    /// The second table's "header" is really a data row.
    Continuation,
}

/// Merge each table into its predecessor where it looks like a continuation.
///
/// Returns tables in their input order. The output is shorter than the input
/// by the number of merges performed.
#[instrument(level = "debug", skip_all, fields(tables = tables.len()))]
pub fn merge_cross_page_tables(
    tables: Vec<TableResult>,
    config: &MergeConfig,
) -> Vec<TableResult> {
    let mut tables = tables.into_iter();
    let Some(mut current) = tables.next() else {
        return vec![];
    };

    let mut merged = vec![];
    for next in tables {
        match should_merge(&current, &next, config) {
            Some(kind) => {
                info!(
                    from_page = next.page,
                    into_page = current.page,
                    ?kind,
                    "Merged table across page break"
                );
                current = merge_two(&current, &next, kind, config);
            }
            None => merged.push(std::mem::replace(&mut current, next)),
        }
    }
    merged.push(current);
    merged
}

/// Decide whether `curr` continues `prev`, and how.
pub fn should_merge(
    prev: &TableResult,
    curr: &TableResult,
    config: &MergeConfig,
) -> Option<MergeKind> {
    if curr.page != prev.page + 1 {
        return None;
    }
    if prev.col_count().abs_diff(curr.col_count()) > config.column_drift {
        return None;
    }
    if is_duplicate_header(&prev.headers, &curr.headers, config) {
        Some(MergeKind::DuplicateHeader)
    } else if prev.col_count() == curr.col_count() && !looks_like_header(&curr.headers, config)
    {
        Some(MergeKind::Continuation)
    } else {
        None
    }
}

/// Does `curr` repeat `prev`? Enough cells must match exactly, ignoring
/// surrounding whitespace. Only positions present in both rows are compared,
/// so a repeat that lost a trailing cell to OCR still counts.
pub fn is_duplicate_header(prev: &[String], curr: &[String], config: &MergeConfig) -> bool {
    let matches = prev
        .iter()
        .zip(curr)
        .filter(|(a, b)| a.trim() == b.trim())
        .count();
    let threshold = (config.duplicate_header_ratio * prev.len() as f64).ceil() as usize;
    matches >= threshold.max(1)
}

/// Does this row read like column headings?
pub fn looks_like_header(row: &[String], config: &MergeConfig) -> bool {
    let keywords = config
        .header_keywords
        .iter()
        .map(|kw| kw.to_lowercase())
        .collect::<Vec<_>>();
    let hits = row
        .iter()
        .filter(|cell| {
            let cell = cell.trim().to_lowercase();
            keywords.iter().any(|kw| cell.contains(kw.as_str()))
        })
        .count();
    let needed = (config.header_keyword_ratio * row.len() as f64).max(1.0);
    hits as f64 >= needed
}

/// Build a new table from `prev` followed by the body of `curr`.
fn merge_two(
    prev: &TableResult,
    curr: &TableResult,
    kind: MergeKind,
    config: &MergeConfig,
) -> TableResult {
    let prev_confidences = CellConfidences::new(prev);
    let curr_confidences = CellConfidences::new(curr);

    // Each output data row, with the confidences of the table and the row
    // index it came from.
    let mut sources: Vec<(&CellConfidences, usize, &Vec<String>)> = vec![];
    sources.extend(
        prev.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (&prev_confidences, i + 1, r)),
    );
    if kind == MergeKind::Continuation {
        sources.push((&curr_confidences, 0, &curr.headers));
    }
    sources.extend(
        curr.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (&curr_confidences, i + 1, r)),
    );

    let mut raw_cells = prev
        .headers
        .iter()
        .enumerate()
        .map(|(col, text)| TableCell {
            row: 0,
            col,
            text: text.clone(),
            confidence: prev_confidences
                .get(0, col)
                .unwrap_or(config.default_cell_confidence),
        })
        .collect::<Vec<_>>();
    for (out_row, (confidences, src_row, cells)) in sources.iter().enumerate() {
        raw_cells.extend(cells.iter().enumerate().map(|(col, text)| TableCell {
            row: out_row + 1,
            col,
            text: text.clone(),
            confidence: confidences
                .get(*src_row, col)
                .unwrap_or(config.default_cell_confidence),
        }));
    }

    TableResult {
        page: prev.page,
        table_index: prev.table_index,
        headers: prev.headers.clone(),
        rows: sources.into_iter().map(|(_, _, row)| row.clone()).collect(),
        raw_cells,
    }
}

/// Cell confidences of one source table, indexed by `(row, col)`.
struct CellConfidences(HashMap<(usize, usize), f64>);

impl CellConfidences {
    fn new(table: &TableResult) -> Self {
        let mut confidences = HashMap::with_capacity(table.raw_cells.len());
        for cell in &table.raw_cells {
            // Keep the first cell at each position.
            confidences
                .entry((cell.row, cell.col))
                .or_insert(cell.confidence);
        }
        Self(confidences)
    }

    fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.0.get(&(row, col)).copied()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|&c| c.to_owned()).collect()
    }

    /// A table with no `raw_cells`, so every rebuilt cell gets the default.
    fn table(page: usize, headers: &[&str], rows: &[&[&str]]) -> TableResult {
        TableResult {
            page,
            table_index: 0,
            headers: strings(headers),
            rows: rows.iter().map(|r| strings(r)).collect(),
            raw_cells: vec![],
        }
    }

    fn merge(tables: Vec<TableResult>) -> Vec<TableResult> {
        merge_cross_page_tables(tables, &MergeConfig::default())
    }

    const HEADER: &[&str] = &["序号", "名称", "数量"];

    #[test]
    fn repeated_header_is_dropped() {
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "底漆", "3"]]),
            table(2, HEADER, &[&["4", "漆", "5"]]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].headers, strings(HEADER));
        assert_eq!(
            merged[0].rows,
            vec![strings(&["1", "底漆", "3"]), strings(&["4", "漆", "5"])]
        );
    }

    #[test]
    fn data_row_header_becomes_data() {
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "底漆", "3"]]),
            table(2, &["5", "油漆B", "10"], &[&["6", "面漆", "2"]]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].rows,
            vec![
                strings(&["1", "底漆", "3"]),
                strings(&["5", "油漆B", "10"]),
                strings(&["6", "面漆", "2"]),
            ]
        );
    }

    #[test]
    fn tables_must_be_on_adjacent_pages() {
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "a", "2"]]),
            table(3, HEADER, &[&["2", "b", "3"]]),
        ]);
        assert_eq!(merged.len(), 2);

        let merged = merge(vec![
            table(2, HEADER, &[&["1", "a", "2"]]),
            table(2, HEADER, &[&["2", "b", "3"]]),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn new_header_on_next_page_starts_a_new_table() {
        // Same width, not a repeat, and looks like a header.
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "a", "2"]]),
            table(2, &["编号", "颜色", "面积"], &[&["x", "y", "z"]]),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn width_mismatch_blocks_continuation() {
        // Off by one and not a repeated header: data rows of a different
        // width don't continue the table.
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "a", "2"]]),
            table(2, &["5", "b"], &[&["6", "c"]]),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn repeated_header_missing_a_cell_still_merges() {
        // OCR lost the last header cell on page 2. Three of four match, which
        // meets ceil(0.7 * 4) = 3.
        let full = &["序号", "名称", "数量", "单位"];
        let prev = table(1, full, &[&["1", "底漆", "3", "桶"]]);
        let curr = table(2, HEADER, &[&["2", "面漆", "5"]]);
        assert_eq!(
            should_merge(&prev, &curr, &MergeConfig::default()),
            Some(MergeKind::DuplicateHeader)
        );

        let merged = merge(vec![prev, curr]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].headers, strings(full));
        assert_eq!(
            merged[0].rows,
            vec![strings(&["1", "底漆", "3", "桶"]), strings(&["2", "面漆", "5"])]
        );
    }

    #[test]
    fn repeated_header_too_far_off_is_not_merged() {
        // Two columns short is beyond the drift allowance, even though every
        // shared cell matches.
        let prev = table(1, &["序号", "名称", "数量", "单位"], &[]);
        let curr = table(2, &["序号", "名称"], &[]);
        assert_eq!(should_merge(&prev, &curr, &MergeConfig::default()), None);
    }

    #[test]
    fn single_table_is_unchanged() {
        let tables = vec![table(1, HEADER, &[&["1", "a", "2"]])];
        assert_eq!(merge(tables.clone()), tables);
        assert!(merge(vec![]).is_empty());
    }

    #[test]
    fn accumulator_keeps_its_first_page() {
        // Page 2 merges into page 1. The merged table still reports page 1,
        // so page 3 is not adjacent to it and starts a new table.
        let merged = merge(vec![
            table(1, HEADER, &[&["1", "a", "2"]]),
            table(2, HEADER, &[&["2", "b", "3"]]),
            table(3, &["3", "c", "4"], &[&["4", "d", "5"]]),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].page, 1);
        assert_eq!(merged[0].rows.len(), 2);
        assert_eq!(merged[1].page, 3);
        assert_eq!(merged[1].headers, strings(&["3", "c", "4"]));
    }

    #[test]
    fn duplicate_header_threshold_rounds_up() {
        let config = MergeConfig::default();
        let prev = strings(&["a", "b", "c"]);
        // ceil(0.7 * 3) = 3 matches needed.
        assert!(!is_duplicate_header(&prev, &strings(&["a", "b", "x"]), &config));
        assert!(is_duplicate_header(&prev, &strings(&[" a", "b ", "c"]), &config));
        // A single column needs its one cell to match.
        assert!(!is_duplicate_header(&strings(&["a"]), &strings(&["b"]), &config));
    }

    #[test]
    fn long_merge_chains_keep_confidences() {
        // Fold forty repeats of one table together, as a document whose
        // table runs over forty pages would.
        let tables = (1..=40)
            .map(|page| {
                let mut t = table(page, HEADER, &[&["1", "a", "2"]]);
                t.raw_cells = vec![TableCell {
                    row: 1,
                    col: 0,
                    text: "1".into(),
                    confidence: 0.5,
                }];
                t
            })
            .collect::<Vec<_>>();
        let mut merged = tables[0].clone();
        for next in &tables[1..] {
            merged = merge_two(&merged, next, MergeKind::DuplicateHeader, &MergeConfig::default());
        }
        assert_eq!(merged.rows.len(), 40);
        let low = merged
            .raw_cells
            .iter()
            .filter(|c| c.confidence == 0.5)
            .count();
        assert_eq!(low, 40);
    }

    #[test]
    fn header_likeness_counts_keyword_cells() {
        let config = MergeConfig::default();
        assert!(looks_like_header(&strings(&["序号", "1", "2"]), &config));
        assert!(looks_like_header(&strings(&["Unit Price", "x"]), &config));
        assert!(!looks_like_header(&strings(&["5", "油漆B", "10"]), &config));
        assert!(!looks_like_header(&[], &config));
    }

    #[test]
    fn rebuilt_cells_keep_known_confidences() {
        let mut prev = table(1, &["序号", "名称"], &[&["1", "a"]]);
        prev.raw_cells = vec![
            TableCell { row: 0, col: 0, text: "序号".into(), confidence: 0.99 },
            TableCell { row: 1, col: 1, text: "a".into(), confidence: 0.5 },
        ];
        let mut curr = table(2, &["2", "b"], &[]);
        curr.raw_cells = vec![TableCell { row: 0, col: 0, text: "2".into(), confidence: 0.7 }];

        let merged = merge(vec![prev, curr]);
        let confidences = merged[0]
            .raw_cells
            .iter()
            .map(|c| (c.row, c.col, c.confidence))
            .collect::<Vec<_>>();
        assert_eq!(
            confidences,
            vec![
                (0, 0, 0.99),
                (0, 1, 0.9),
                (1, 0, 0.9),
                (1, 1, 0.5),
                (2, 0, 0.7),
                (2, 1, 0.9),
            ]
        );
    }
}

//! Grouping text blocks into horizontal rows.

use super::{config::RowConfig, text_block::TextBlock};

/// A row of blocks, left to right. Borrows from the page's block list.
pub type Row<'a> = Vec<&'a TextBlock>;

/// Group a page's blocks into rows, top to bottom.
///
/// Blocks are scanned in (y, x) order of their anchor points. Each row
/// remembers the y of its first block, and a block joins the row only while
/// it stays within `gap_px` of that anchor, so slowly drifting baselines
/// still split eventually.
pub fn group_rows<'a>(blocks: &'a [TextBlock], config: &RowConfig) -> Vec<Row<'a>> {
    let mut sorted = blocks.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|b| {
        let (x, y) = b.anchor();
        (y, x)
    });

    let mut rows = vec![];
    let mut current: Row<'a> = vec![];
    let mut anchor_y = 0;
    for block in sorted {
        let (_, y) = block.anchor();
        if !current.is_empty() && (y - anchor_y).abs() < config.gap_px {
            current.push(block);
        } else {
            close_row(&mut rows, current);
            current = vec![block];
            anchor_y = y;
        }
    }
    close_row(&mut rows, current);
    rows
}

/// Sort a finished row left to right and push it, unless it's empty.
fn close_row<'a>(rows: &mut Vec<Row<'a>>, mut row: Row<'a>) {
    if row.is_empty() {
        return;
    }
    row.sort_by_key(|b| b.anchor().0);
    rows.push(row);
}

//! Writes resolved codes back into a copy of the target table.

use log::debug;

use super::record::{Resolution, TargetRecord};
use crate::table::{Cell, CellPatch, Table};

/// The enriched table together with the cell edits that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub table: Table,
    /// Edits relative to the source table, in absolute sheet coordinates.
    pub patches: Vec<CellPatch>,
    pub code_column: usize,
    pub added_code_column: bool,
}

/// Copy `source` and fill the code column from `records`.
///
/// Only cells that were blank receive a value, and only for records resolved by the
/// index or the catalog. When the code column does not exist it is appended after the
/// last header, but only if at least one code lands in it. Rows keep their count and order.
pub fn merge(source: &Table, records: &[TargetRecord], code_column: &str) -> MergedTable {
    let existing = source.column_index(code_column);
    let lookup_col = existing.unwrap_or(source.column_count());

    let fills: Vec<(usize, &str)> = records
        .iter()
        .filter(|record| {
            matches!(
                record.resolution,
                Some(Resolution::Index) | Some(Resolution::Catalog)
            )
        })
        .filter(|record| source.cell(record.row, lookup_col).is_empty())
        .filter_map(|record| Some((record.row, record.resolved_code.as_deref()?)))
        .collect();

    let mut table = source.clone();
    let mut patches = Vec::with_capacity(fills.len() + 1);

    let (code_col, added_code_column) = match existing {
        Some(col) => (col, false),
        None if fills.is_empty() => (lookup_col, false),
        None => {
            let col = table.push_column(code_column);
            let (row, col_pos) = table.header_position(col);
            patches.push(CellPatch::new(row, col_pos, code_column));
            (col, true)
        }
    };

    for &(row, code) in &fills {
        table.set(row, code_col, Cell::text(code));
        let (sheet_row, sheet_col) = table.sheet_position(row, code_col);
        patches.push(CellPatch::new(sheet_row, sheet_col, code));
    }

    debug!(
        "Merged {} codes into column '{}'{}",
        fills.len(),
        code_column,
        if added_code_column { " (new column)" } else { "" }
    );

    MergedTable {
        table,
        patches,
        code_column: code_col,
        added_code_column,
    }
}

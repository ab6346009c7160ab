use calamine::{Data, Range, Reader, open_workbook_auto};
use log::debug;
use std::path::Path;

use crate::error::{ReconcileError, Result};
use crate::table::{Cell, Table};

/// Sheet names in workbook order.
pub fn sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path)?;
    let sheets = workbook.sheet_names().to_owned();

    if sheets.is_empty() {
        return Err(ReconcileError::EmptyWorkbook(path.display().to_string()));
    }

    Ok(sheets)
}

/// Read one sheet; its first used row becomes the header row.
pub fn read_table<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(ReconcileError::SheetNotFound {
            sheet: sheet_name.to_string(),
            path: path.display().to_string(),
        });
    }

    let range = workbook.worksheet_range(sheet_name)?;
    let table = range_to_table(&range);
    debug!(
        "Read sheet '{}' from {}: {} rows, {} columns",
        sheet_name,
        path.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Read every sheet in workbook order.
pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Table)>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, range_to_table(&range)));
    }
    Ok(sheets)
}

fn range_to_table(range: &Range<Data>) -> Table {
    let Some((start_row, start_col)) = range.start() else {
        return Table::default();
    };
    if range.is_empty() {
        return Table::default().with_origin(start_row, start_col);
    }

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|cell| to_cell(cell).as_text()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    Table::new(headers, rows).with_origin(start_row, start_col)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

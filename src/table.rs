//! In-memory sheet model shared by the workbook adapters and the matching pipeline.

use serde::Serialize;

/// A single cell value as read from a worksheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text<S: Into<String>>(value: S) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell the way a user sees it in the sheet.
    ///
    /// Whole numbers lose their fractional part so that `12345.0` reads as `12345`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
        }
    }

    /// Numeric view of the cell. Text cells are parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A text value to place at an absolute zero-based sheet position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPatch {
    pub row: u32,
    pub col: u32,
    pub text: String,
}

impl CellPatch {
    pub fn new(row: u32, col: u32, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            text: text.into(),
        }
    }
}

/// A rectangular block of cells whose first row holds the column headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Zero-based (row, column) of the header row's first cell within the sheet.
    pub origin: (u32, u32),
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            rows,
            origin: (0, 0),
        }
    }

    /// Build a table from string literals, mostly useful in tests and fixtures.
    pub fn from_strings(headers: &[&str], rows: Vec<Vec<&str>>) -> Self {
        let headers = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| if v.is_empty() { Cell::Empty } else { Cell::text(v) })
                    .collect()
            })
            .collect();
        Self::new(headers, rows)
    }

    pub fn with_origin(mut self, row: u32, col: u32) -> Self {
        self.origin = (row, col);
        self
    }

    /// Find a column by name, ignoring whitespace around the stored header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers.iter().position(|h| h.trim() == wanted)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Names from `required` that have no matching header, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }

    /// Text of a cell, `None` when the cell is blank.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        let cell = self.cell(row, col);
        if matches!(cell, Cell::Empty) {
            None
        } else {
            Some(cell.as_text())
        }
    }

    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).as_number()
    }

    /// Overwrite a cell, growing the row if it is shorter than `col`.
    pub fn set(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= col {
                cells.resize(col + 1, Cell::Empty);
            }
            cells[col] = value;
        }
    }

    /// Append a header and return its index. Existing rows are padded lazily by `set`.
    pub fn push_column(&mut self, name: &str) -> usize {
        self.headers.push(name.to_string());
        self.headers.len() - 1
    }

    /// Absolute zero-based sheet coordinates of a data cell.
    pub fn sheet_position(&self, row: usize, col: usize) -> (u32, u32) {
        (self.origin.0 + 1 + row as u32, self.origin.1 + col as u32)
    }

    /// Absolute zero-based sheet coordinates of a header cell.
    pub fn header_position(&self, col: usize) -> (u32, u32) {
        (self.origin.0, self.origin.1 + col as u32)
    }
}

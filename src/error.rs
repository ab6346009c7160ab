use std::fmt;
use thiserror::Error;

/// Which input table a schema problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Target,
    Index,
    Catalog,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Target => write!(f, "target sheet"),
            SourceKind::Index => write!(f, "index table"),
            SourceKind::Catalog => write!(f, "product catalog"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{source_kind} is missing required columns: {}", missing.join(", "))]
    Schema {
        source_kind: SourceKind,
        missing: Vec<String>,
    },

    #[error("index key '{key}' appears on rows {first_row} and {second_row}")]
    DuplicateIndexKey {
        key: String,
        first_row: usize,
        second_row: usize,
    },

    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { sheet: String, path: String },

    #[error("workbook {0} contains no sheets")]
    EmptyWorkbook(String),

    #[error("invalid workbook package: {0}")]
    Package(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("xlsx writer error: {0}")]
    XlsxWriter(#[from] rust_xlsxwriter::XlsxError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    pub fn schema(source_kind: SourceKind, missing: Vec<String>) -> Self {
        ReconcileError::Schema {
            source_kind,
            missing,
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, ReconcileError::Schema { .. })
    }
}

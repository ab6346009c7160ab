pub mod config;
pub mod error;
pub mod job;
pub mod matching;
pub mod table;
pub mod workbook;

pub use error::{ReconcileError, Result, SourceKind};
pub use table::{Cell, CellPatch, Table};

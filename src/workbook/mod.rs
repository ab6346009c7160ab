//! Spreadsheet adapters around the matching pipeline.
//!
//! Reading goes through calamine for every supported format. Writing patches the
//! target worksheet inside the xlsx package and copies every other part untouched.

pub mod package;
pub mod patch;
pub mod reader;
pub mod writer;

pub use reader::{read_all, read_table, sheet_names};
pub use writer::{WriteOutcome, default_destination, is_patchable, write_back};

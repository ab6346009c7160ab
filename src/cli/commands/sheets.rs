use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use log::info;
use std::path::PathBuf;

use code_reconcile::workbook::read_all;

#[derive(Args)]
pub struct SheetsCommands {
    /// Workbook to inspect (xlsx, xlsm, xls or ods)
    pub file: PathBuf,
}

pub async fn handle_sheets_command(args: SheetsCommands) -> Result<()> {
    info!("Listing sheets of {}", args.file.display());

    if !args.file.is_file() {
        bail!("Workbook not found: {}", args.file.display());
    }

    let sheets = read_all(&args.file)?;

    println!("Sheets in {}", args.file.display().to_string().bright_white());
    for (name, table) in &sheets {
        println!(
            "  {} {} ({} rows, {} columns)",
            "•".bright_blue(),
            name.bright_green(),
            table.row_count(),
            table.column_count()
        );
    }

    Ok(())
}

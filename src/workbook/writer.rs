use log::{debug, info};
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::package::worksheet_part;
use super::patch::patch_worksheet_xml;
use super::reader::read_all;
use crate::error::{ReconcileError, Result};
use crate::table::{Cell, CellPatch, Table};

/// How the enriched sheet reached disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The worksheet part was patched in place; every other part was copied raw.
    Patched { path: PathBuf, cells: usize },
    /// The source format cannot be patched, so all sheets were rewritten into a new xlsx.
    Rewritten { path: PathBuf, sheets: usize },
    /// Nothing changed and the destination is the source itself.
    Unchanged,
}

/// Whether the workbook is an OOXML package whose parts can be patched individually.
pub fn is_patchable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"))
        .unwrap_or(false)
}

/// Where results go when no explicit output path is given.
pub fn default_destination(source: &Path) -> PathBuf {
    if is_patchable(source) {
        source.to_path_buf()
    } else {
        source.with_extension("xlsx")
    }
}

/// Persist the enriched target sheet.
///
/// xlsx/xlsm sources get `patches` applied to the one worksheet part; other formats are
/// converted to a new xlsx holding every sheet's values with `enriched` replacing the
/// target sheet. The destination is replaced atomically, so a failure leaves it untouched.
pub fn write_back(
    source: &Path,
    destination: &Path,
    sheet: &str,
    patches: &[CellPatch],
    enriched: &Table,
) -> Result<WriteOutcome> {
    if patches.is_empty() && source == destination {
        debug!("No cell changes for {}, skipping write", source.display());
        return Ok(WriteOutcome::Unchanged);
    }

    if is_patchable(source) {
        patch_package(source, destination, sheet, patches)?;
        info!(
            "Patched {} cells of sheet '{}' into {}",
            patches.len(),
            sheet,
            destination.display()
        );
        Ok(WriteOutcome::Patched {
            path: destination.to_path_buf(),
            cells: patches.len(),
        })
    } else {
        let sheets = rewrite_as_xlsx(source, destination, sheet, enriched)?;
        info!(
            "Rewrote {} sheets from {} into {}",
            sheets,
            source.display(),
            destination.display()
        );
        Ok(WriteOutcome::Rewritten {
            path: destination.to_path_buf(),
            sheets,
        })
    }
}

fn temp_file_beside(destination: &Path) -> Result<NamedTempFile> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

fn patch_package(source: &Path, destination: &Path, sheet: &str, patches: &[CellPatch]) -> Result<()> {
    let mut temp = temp_file_beside(destination)?;

    {
        let mut archive = ZipArchive::new(BufReader::new(File::open(source)?))?;
        let part = worksheet_part(&mut archive, sheet)?;
        debug!("Sheet '{}' lives in {}", sheet, part);

        let mut zip = ZipWriter::new(temp.as_file_mut());
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
        let mut patched = false;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.name() == part {
                let mut xml = Vec::new();
                file.read_to_end(&mut xml)?;
                let updated = patch_worksheet_xml(&xml, patches)?;
                zip.start_file(part.clone(), options)?;
                zip.write_all(&updated)?;
                patched = true;
            } else {
                zip.raw_copy_file(file)?;
            }
        }

        if !patched {
            return Err(ReconcileError::Package(format!("worksheet part {} not found", part)));
        }
        zip.finish()?;
    }

    temp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

fn rewrite_as_xlsx(source: &Path, destination: &Path, sheet: &str, enriched: &Table) -> Result<usize> {
    let sheets = read_all(source)?;
    if !sheets.iter().any(|(name, _)| name == sheet) {
        return Err(ReconcileError::SheetNotFound {
            sheet: sheet.to_string(),
            path: source.display().to_string(),
        });
    }

    let mut workbook = Workbook::new();
    for (name, table) in &sheets {
        let table = if name == sheet { enriched } else { table };
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_table(worksheet, table)?;
    }

    let mut temp = temp_file_beside(destination)?;
    workbook.save_to_writer(temp.as_file_mut())?;
    temp.persist(destination).map_err(|e| e.error)?;
    Ok(sheets.len())
}

fn write_table(worksheet: &mut rust_xlsxwriter::Worksheet, table: &Table) -> Result<()> {
    let column = |col: usize| -> Result<u16> {
        u16::try_from(table.origin.1 as usize + col)
            .map_err(|_| ReconcileError::Package(format!("column {} out of range", col)))
    };

    for (col, header) in table.headers.iter().enumerate() {
        if !header.is_empty() {
            worksheet.write_string(table.origin.0, column(col)?, header)?;
        }
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let (row_num, _) = table.sheet_position(row_idx, 0);
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, column(col)?, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, column(col)?, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, column(col)?, *b)?;
                }
            }
        }
    }

    Ok(())
}

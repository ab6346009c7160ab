//! Typed views over the three input tables.

use log::debug;
use serde::Serialize;

use super::dimensions::{Dimensions, extract_dimensions};
use super::normalize::normalize_mark;
use super::schema::{CatalogColumns, IndexColumns, KeyTrim, TargetColumns};
use crate::error::{ReconcileError, Result, SourceKind};
use crate::table::Table;

/// Which stage supplied a record's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The code was already present in the source sheet.
    Existing,
    Index,
    Catalog,
}

/// One production row being enriched.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    /// Zero-based data row in the target table.
    pub row: usize,
    pub item_label: String,
    pub mark_label: String,
    pub resolved_code: Option<String>,
    pub unit_weight: Option<f64>,
    pub compound_key: String,
    pub normalized_mark: String,
    pub resolution: Option<Resolution>,
}

impl TargetRecord {
    pub fn new(row: usize, item_label: &str, mark_label: &str, key_trim: KeyTrim) -> Self {
        let compound_key = match key_trim {
            KeyTrim::Verbatim => format!("{}{}", item_label, mark_label),
            KeyTrim::Trim => format!("{}{}", item_label.trim(), mark_label.trim()),
        };

        Self {
            row,
            item_label: item_label.to_string(),
            mark_label: mark_label.to_string(),
            resolved_code: None,
            unit_weight: None,
            compound_key,
            normalized_mark: normalize_mark(Some(mark_label)),
            resolution: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.assign(code, Resolution::Existing);
        self
    }

    pub fn with_unit_weight(mut self, weight: f64) -> Self {
        self.unit_weight = Some(weight);
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    /// Set the code unless one is already present. Returns whether the record changed.
    pub fn assign(&mut self, code: &str, resolution: Resolution) -> bool {
        if self.is_resolved() || code.trim().is_empty() {
            return false;
        }
        self.resolved_code = Some(code.to_string());
        self.resolution = Some(resolution);
        true
    }
}

/// One row of the compound-key index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub row: usize,
    pub compound_key: String,
    pub code: String,
}

/// One product catalog row with its derived match attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub row: usize,
    pub spec_text: String,
    pub mark_label: Option<String>,
    pub net_weight: Option<f64>,
    pub code: String,
    pub dimensions: Option<Dimensions>,
    pub normalized_mark: String,
}

impl CatalogEntry {
    pub fn new(row: usize, spec_text: &str, code: &str) -> Self {
        Self {
            row,
            spec_text: spec_text.to_string(),
            mark_label: None,
            net_weight: None,
            code: code.to_string(),
            dimensions: extract_dimensions(Some(spec_text)),
            normalized_mark: normalize_mark(None),
        }
    }

    pub fn with_mark(mut self, mark: &str) -> Self {
        self.normalized_mark = normalize_mark(Some(mark));
        self.mark_label = Some(mark.to_string());
        self
    }

    pub fn with_net_weight(mut self, weight: f64) -> Self {
        self.net_weight = Some(weight);
        self
    }
}

fn require(table: &Table, source_kind: SourceKind, names: &[&str]) -> Result<Vec<usize>> {
    let missing = table.missing_columns(names);
    if !missing.is_empty() {
        return Err(ReconcileError::schema(source_kind, missing));
    }
    Ok(names
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect())
}

/// Read target records, failing when the item or mark column is absent.
///
/// `require_weight` adds the unit weight column to the required set.
pub fn target_records(
    table: &Table,
    columns: &TargetColumns,
    key_trim: KeyTrim,
    require_weight: bool,
) -> Result<Vec<TargetRecord>> {
    let mut required = vec![columns.item_label.as_str(), columns.mark_label.as_str()];
    if require_weight {
        required.push(columns.unit_weight.as_str());
    }
    let indices = require(table, SourceKind::Target, &required)?;
    let (item_col, mark_col) = (indices[0], indices[1]);
    let code_col = table.column_index(&columns.resolved_code);
    let weight_col = table.column_index(&columns.unit_weight);

    let records = (0..table.row_count())
        .map(|row| {
            let item = table.text(row, item_col).unwrap_or_default();
            let mark = table.text(row, mark_col).unwrap_or_default();
            let mut record = TargetRecord::new(row, &item, &mark, key_trim);

            if let Some(code) = code_col.and_then(|col| table.text(row, col)) {
                record.assign(&code, Resolution::Existing);
            }
            record.unit_weight = weight_col.and_then(|col| table.number(row, col));
            record
        })
        .collect::<Vec<_>>();

    debug!("Loaded {} target records", records.len());
    Ok(records)
}

/// Read index rows. Rows with a blank key or a blank code carry nothing to look up and are skipped.
pub fn index_entries(table: &Table, columns: &IndexColumns) -> Result<Vec<IndexEntry>> {
    let indices = require(
        table,
        SourceKind::Index,
        &[columns.compound_key.as_str(), columns.code.as_str()],
    )?;
    let (key_col, code_col) = (indices[0], indices[1]);

    let entries = (0..table.row_count())
        .filter_map(|row| {
            let compound_key = table.text(row, key_col).filter(|k| !k.is_empty())?;
            let code = table.text(row, code_col).filter(|c| !c.trim().is_empty())?;
            Some(IndexEntry {
                row,
                compound_key,
                code,
            })
        })
        .collect::<Vec<_>>();

    debug!("Loaded {} index entries", entries.len());
    Ok(entries)
}

/// Which optional catalog attribute to read alongside spec text and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAttribute {
    Mark,
    NetWeight,
}

/// Read catalog rows and precompute their dimensions and normalized marks.
///
/// Rows without a code are skipped since they can never resolve anything.
pub fn catalog_entries(
    table: &Table,
    columns: &CatalogColumns,
    attribute: CatalogAttribute,
) -> Result<Vec<CatalogEntry>> {
    let attribute_column = match attribute {
        CatalogAttribute::Mark => columns.mark_label.as_str(),
        CatalogAttribute::NetWeight => columns.net_weight.as_str(),
    };
    let indices = require(
        table,
        SourceKind::Catalog,
        &[columns.spec_text.as_str(), columns.code.as_str(), attribute_column],
    )?;
    let (spec_col, code_col, attr_col) = (indices[0], indices[1], indices[2]);

    let entries = (0..table.row_count())
        .filter_map(|row| {
            let code = table.text(row, code_col).filter(|c| !c.trim().is_empty())?;
            let spec = table.text(row, spec_col).unwrap_or_default();
            let entry = CatalogEntry::new(row, &spec, &code);
            Some(match attribute {
                CatalogAttribute::Mark => {
                    entry.with_mark(&table.text(row, attr_col).unwrap_or_default())
                }
                CatalogAttribute::NetWeight => match table.number(row, attr_col) {
                    Some(weight) => entry.with_net_weight(weight),
                    None => entry,
                },
            })
        })
        .collect::<Vec<_>>();

    let sized = entries.iter().filter(|e| e.dimensions.is_some()).count();
    debug!(
        "Loaded {} catalog entries ({} with parseable dimensions)",
        entries.len(),
        sized
    );
    Ok(entries)
}

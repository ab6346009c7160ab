use log::info;

use super::exact::{IndexMap, resolve_by_key};
use super::fallback::{Catalog, SecondaryPredicate, resolve_by_attributes};
use super::merge::{MergedTable, merge};
use super::record::{catalog_entries, index_entries, target_records};
use super::schema::MatchOptions;
use super::stats::{MatchReport, MatchStats};
use crate::error::Result;
use crate::table::Table;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub merged: MergedTable,
    pub report: MatchReport,
}

impl Reconciliation {
    pub fn table(&self) -> &Table {
        &self.merged.table
    }
}

/// Run the full matching cascade over in-memory tables.
///
/// Every schema check happens before any record is touched, so a
/// [`crate::ReconcileError::Schema`] leaves nothing half done.
pub fn run(
    target: &Table,
    index: &Table,
    catalog: &Table,
    options: &MatchOptions,
) -> Result<Reconciliation> {
    let schema = &options.schema;

    let predicate = SecondaryPredicate::select(options.fallback, catalog, &schema.catalog_columns)?;
    let mut records = target_records(
        target,
        &schema.target_columns,
        options.key_trim,
        predicate.requires_unit_weight(),
    )?;
    let index_entries = index_entries(index, &schema.index_columns)?;
    let catalog_entries =
        catalog_entries(catalog, &schema.catalog_columns, predicate.catalog_attribute())?;

    let index_map = IndexMap::build(&index_entries, options.duplicate_keys)?;
    let catalog = Catalog::new(catalog_entries);
    info!(
        "Matching {} records against {} index keys and {} catalog entries",
        records.len(),
        index_map.len(),
        catalog.len()
    );

    let by_key = resolve_by_key(&mut records, &index_map);
    info!("Index key stage resolved {} records", by_key);

    let mut stats = MatchStats::default();
    resolve_by_attributes(&mut records, &catalog, predicate, &mut stats);
    info!(
        "Catalog stage: {} entered, {} resolved, {} still unresolved",
        stats.entered_fallback,
        stats.resolved_in_fallback,
        stats.still_unresolved()
    );

    let merged = merge(target, &records, &schema.target_columns.resolved_code);
    let mut report = stats.report(&records);
    report.unresolved_rows = report
        .unresolved_rows
        .iter()
        .map(|&row| target.sheet_position(row, 0).0 as usize + 1)
        .collect();

    Ok(Reconciliation { merged, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReconcileError, SourceKind};

    #[test]
    fn test_schema_error_names_catalog_columns() {
        let target = Table::from_strings(&["货号", "标记", "料号"], vec![]);
        let index = Table::from_strings(&["索引字段", "料号"], vec![]);
        let catalog = Table::from_strings(&["规格型号", "标记"], vec![]);

        let err = run(&target, &index, &catalog, &MatchOptions::default()).unwrap_err();
        match err {
            ReconcileError::Schema {
                source_kind,
                missing,
            } => {
                assert_eq!(source_kind, SourceKind::Catalog);
                assert_eq!(missing, vec!["产品编号".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

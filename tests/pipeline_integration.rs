//! End-to-end runs of the matching cascade over in-memory tables.

use code_reconcile::matching::{DuplicateKeys, FallbackPolicy, KeyTrim, MatchOptions, run};
use code_reconcile::{ReconcileError, SourceKind, Table};
use pretty_assertions::assert_eq;

fn target(rows: Vec<Vec<&str>>) -> Table {
    Table::from_strings(&["货号", "标记", "料号", "单重"], rows)
}

fn index(rows: Vec<Vec<&str>>) -> Table {
    Table::from_strings(&["索引字段", "料号"], rows)
}

fn catalog(rows: Vec<Vec<&str>>) -> Table {
    Table::from_strings(&["规格型号", "产品编号", "标记"], rows)
}

fn codes(table: &Table) -> Vec<Option<String>> {
    let col = table.column_index("料号").unwrap();
    (0..table.row_count()).map(|row| table.text(row, col)).collect()
}

#[test]
fn test_no_mark_aliases_resolve_through_catalog() {
    let target = target(vec![vec!["200x100x50", "", "", ""]]);
    let index = index(vec![]);
    let catalog = catalog(vec![vec!["SKU-200X100X50", "P-001", "无标记"]]);

    let result = run(&target, &index, &catalog, &MatchOptions::default()).unwrap();

    assert_eq!(codes(result.table()), vec![Some("P-001".to_string())]);
    assert_eq!(result.report.resolved_in_fallback, 1);
    assert_eq!(result.report.entered_fallback, 1);
    assert_eq!(result.report.still_unresolved, 0);
}

#[test]
fn test_existing_code_wins_over_index() {
    let target = target(vec![vec!["A-1", "红", "P-999", ""]]);
    let index = index(vec![vec!["A-1红", "P-000"]]);
    let catalog = catalog(vec![]);

    let result = run(&target, &index, &catalog, &MatchOptions::default()).unwrap();

    assert_eq!(codes(result.table()), vec![Some("P-999".to_string())]);
    assert_eq!(result.report.already_populated, 1);
    assert_eq!(result.report.resolved_by_key, 0);
    assert!(result.merged.patches.is_empty());
}

#[test]
fn test_index_runs_before_catalog() {
    let target = target(vec![
        vec!["100x50x20", "红", "", ""],
        vec!["100x50x20", "蓝", "", ""],
        vec!["no size", "", "", ""],
    ]);
    let index = index(vec![vec!["100x50x20红", "K-1"]]);
    let catalog = catalog(vec![
        vec!["BOX 100*50*20", "C-RED", "红"],
        vec!["BOX 100x50x20", "C-BLUE-1", "蓝"],
        vec!["BOX 100X50X20", "C-BLUE-2", "蓝"],
    ]);

    let result = run(&target, &index, &catalog, &MatchOptions::default()).unwrap();

    assert_eq!(
        codes(result.table()),
        vec![Some("K-1".to_string()), Some("C-BLUE-1".to_string()), None]
    );
    let report = &result.report;
    assert_eq!(report.resolved_by_key, 1);
    assert_eq!(report.entered_fallback, 2);
    assert_eq!(report.resolved_in_fallback, 1);
    assert_eq!(report.still_unresolved, 1);
    assert_eq!(
        report.still_unresolved,
        report.entered_fallback - report.resolved_in_fallback
    );
    // Header is sheet row 1, so the third data row is sheet row 4.
    assert_eq!(report.unresolved_rows, vec![4]);
}

#[test]
fn test_row_count_and_order_are_preserved() {
    let target = target(vec![
        vec!["c", "", "", ""],
        vec!["a", "", "", ""],
        vec!["b", "", "", ""],
    ]);
    let index = index(vec![vec!["a", "X"]]);

    let result = run(&target, &index, &catalog(vec![]), &MatchOptions::default()).unwrap();
    let table = result.table();

    assert_eq!(table.row_count(), 3);
    let items: Vec<_> = (0..3).map(|row| table.text(row, 0).unwrap()).collect();
    assert_eq!(items, vec!["c", "a", "b"]);
    assert_eq!(codes(table), vec![None, Some("X".to_string()), None]);
}

#[test]
fn test_second_run_changes_nothing() {
    let target = target(vec![
        vec!["100x50x20", "红", "", ""],
        vec!["A-1", "", "", ""],
    ]);
    let index = index(vec![vec!["A-1", "K-1"]]);
    let catalog = catalog(vec![vec!["100x50x20", "C-1", "红"]]);
    let options = MatchOptions::default();

    let first = run(&target, &index, &catalog, &options).unwrap();
    let second = run(first.table(), &index, &catalog, &options).unwrap();

    assert_eq!(second.table(), first.table());
    assert!(second.merged.patches.is_empty());
    assert_eq!(second.report.already_populated, 2);
    assert_eq!(second.report.newly_resolved(), 0);
}

#[test]
fn test_missing_code_column_is_appended() {
    let target = Table::from_strings(&["货号", "标记"], vec![vec!["A-1", ""]]);
    let index = index(vec![vec!["A-1", "K-1"]]);

    let result = run(&target, &index, &catalog(vec![]), &MatchOptions::default()).unwrap();

    assert!(result.merged.added_code_column);
    assert_eq!(result.table().headers, vec!["货号", "标记", "料号"]);
    assert_eq!(codes(result.table()), vec![Some("K-1".to_string())]);
    // Header cell plus one code cell.
    assert_eq!(result.merged.patches.len(), 2);
}

#[test]
fn test_weight_fallback_needs_exact_weight() {
    let target = target(vec![
        vec!["200x100x50", "", "", "1.5"],
        vec!["200x100x50", "", "", "1.6"],
    ]);
    let catalog = Table::from_strings(
        &["规格型号", "产品编号", "净重"],
        vec![vec!["200x100x50", "W-1", "1.5"]],
    );

    let result = run(&target, &index(vec![]), &catalog, &MatchOptions::default()).unwrap();

    assert_eq!(codes(result.table()), vec![Some("W-1".to_string()), None]);
    assert_eq!(result.report.resolved_in_fallback, 1);
}

#[test]
fn test_weight_policy_requires_unit_weight_column() {
    let target = Table::from_strings(&["货号", "标记", "料号"], vec![vec!["1x2x3", "", ""]]);
    let catalog = Table::from_strings(
        &["规格型号", "产品编号", "净重"],
        vec![vec!["1x2x3", "W-1", "1"]],
    );
    let options = MatchOptions::builder()
        .fallback(FallbackPolicy::Weight)
        .build();

    let err = run(&target, &index(vec![]), &catalog, &options).unwrap_err();
    match err {
        ReconcileError::Schema {
            source_kind,
            missing,
        } => {
            assert_eq!(source_kind, SourceKind::Target);
            assert_eq!(missing, vec!["单重".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_index_column_is_schema_error() {
    let bad_index = Table::from_strings(&["索引字段"], vec![vec!["A-1"]]);
    let target = target(vec![vec!["A-1", "", "", ""]]);

    let err = run(&target, &bad_index, &catalog(vec![]), &MatchOptions::default()).unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn test_strict_index_rejects_duplicate_keys() {
    let target = target(vec![vec!["A-1", "", "", ""]]);
    let index = index(vec![vec!["A-1", "K-1"], vec!["A-1", "K-2"]]);

    let lenient = run(&target, &index, &catalog(vec![]), &MatchOptions::default()).unwrap();
    assert_eq!(codes(lenient.table()), vec![Some("K-2".to_string())]);

    let strict = MatchOptions::builder()
        .duplicate_keys(DuplicateKeys::Reject)
        .build();
    let err = run(&target, &index, &catalog(vec![]), &strict).unwrap_err();
    assert!(matches!(err, ReconcileError::DuplicateIndexKey { .. }));
}

#[test]
fn test_trimmed_keys_match_padded_labels() {
    let target = target(vec![vec![" A-1 ", "红 ", "", ""]]);
    let index = index(vec![vec!["A-1红", "K-1"]]);

    let verbatim = run(&target, &index, &catalog(vec![]), &MatchOptions::default()).unwrap();
    assert_eq!(codes(verbatim.table()), vec![None]);

    let trimmed = MatchOptions::builder().key_trim(KeyTrim::Trim).build();
    let result = run(&target, &index, &catalog(vec![]), &trimmed).unwrap();
    assert_eq!(codes(result.table()), vec![Some("K-1".to_string())]);
}

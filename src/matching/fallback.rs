//! Catalog fallback: dimension triple plus one secondary attribute.
//!
//! Records the key lookup could not resolve get their dimensions parsed from the item
//! label. Catalog entries with the same dimensions are then narrowed by a secondary
//! predicate, and the first survivor in catalog order supplies the code.

use log::{debug, trace};
use std::collections::HashMap;

use super::dimensions::{Dimensions, extract_dimensions};
use super::record::{CatalogAttribute, CatalogEntry, Resolution, TargetRecord};
use super::schema::{CatalogColumns, FallbackPolicy};
use super::stats::MatchStats;
use crate::error::{ReconcileError, Result, SourceKind};
use crate::table::Table;

/// Second condition a catalog entry must meet after its dimensions match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryPredicate {
    /// Normalized mark labels are equal.
    MarkEquals,
    /// Catalog net weight equals the record's unit weight exactly.
    WeightEquals,
}

impl SecondaryPredicate {
    /// Pick the predicate for a run from the policy and the columns the catalog provides.
    pub fn select(policy: FallbackPolicy, catalog: &Table, columns: &CatalogColumns) -> Result<Self> {
        let has_mark = catalog.has_column(&columns.mark_label);
        let has_weight = catalog.has_column(&columns.net_weight);

        let predicate = match policy {
            FallbackPolicy::Mark => SecondaryPredicate::MarkEquals,
            FallbackPolicy::Weight => SecondaryPredicate::WeightEquals,
            FallbackPolicy::Auto if has_mark => SecondaryPredicate::MarkEquals,
            FallbackPolicy::Auto if has_weight => SecondaryPredicate::WeightEquals,
            FallbackPolicy::Auto => {
                return Err(ReconcileError::schema(
                    SourceKind::Catalog,
                    vec![
                        format!("{} or {}", columns.mark_label.trim(), columns.net_weight.trim()),
                    ],
                ));
            }
        };

        debug!("Catalog fallback uses {:?}", predicate);
        Ok(predicate)
    }

    pub fn catalog_attribute(&self) -> CatalogAttribute {
        match self {
            SecondaryPredicate::MarkEquals => CatalogAttribute::Mark,
            SecondaryPredicate::WeightEquals => CatalogAttribute::NetWeight,
        }
    }

    pub fn requires_unit_weight(&self) -> bool {
        matches!(self, SecondaryPredicate::WeightEquals)
    }

    pub fn matches(&self, record: &TargetRecord, entry: &CatalogEntry) -> bool {
        match self {
            SecondaryPredicate::MarkEquals => entry.normalized_mark == record.normalized_mark,
            SecondaryPredicate::WeightEquals => match (entry.net_weight, record.unit_weight) {
                (Some(net), Some(unit)) => net == unit,
                _ => false,
            },
        }
    }
}

/// Catalog entries grouped by dimension triple, each group in load order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_dimensions: HashMap<Dimensions, Vec<usize>>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut by_dimensions: HashMap<Dimensions, Vec<usize>> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            if let Some(dimensions) = entry.dimensions {
                by_dimensions.entry(dimensions).or_default().push(position);
            }
        }

        Self {
            entries,
            by_dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with exactly these dimensions, in catalog order.
    pub fn with_dimensions(&self, dimensions: Dimensions) -> impl Iterator<Item = &CatalogEntry> {
        self.by_dimensions
            .get(&dimensions)
            .into_iter()
            .flatten()
            .map(|&position| &self.entries[position])
    }

    /// First entry with matching dimensions that also satisfies `predicate`.
    pub fn find(
        &self,
        record: &TargetRecord,
        dimensions: Dimensions,
        predicate: SecondaryPredicate,
    ) -> Option<&CatalogEntry> {
        self.with_dimensions(dimensions)
            .find(|entry| predicate.matches(record, entry))
    }
}

/// Resolve the records that are still missing a code. Returns the number resolved.
pub fn resolve_by_attributes(
    records: &mut [TargetRecord],
    catalog: &Catalog,
    predicate: SecondaryPredicate,
    stats: &mut MatchStats,
) -> usize {
    let mut resolved = 0;

    for record in records.iter_mut().filter(|r| !r.is_resolved()) {
        stats.record_entry();

        let Some(dimensions) = extract_dimensions(Some(&record.item_label)) else {
            trace!("Row {}: no dimensions in '{}'", record.row, record.item_label);
            continue;
        };

        let Some(entry) = catalog.find(record, dimensions, predicate) else {
            trace!("Row {}: no catalog entry for {}", record.row, dimensions);
            continue;
        };

        let code = entry.code.clone();
        if record.assign(&code, Resolution::Catalog) {
            trace!("Row {}: {} → {} (catalog row {})", record.row, dimensions, code, entry.row);
            stats.record_resolution();
            resolved += 1;
        }
    }

    debug!(
        "Catalog stage resolved {} of {} records",
        stats.resolved_in_fallback, stats.entered_fallback
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::schema::KeyTrim;

    fn record(row: usize, item: &str, mark: &str) -> TargetRecord {
        TargetRecord::new(row, item, mark, KeyTrim::Verbatim)
    }

    #[test]
    fn test_mark_fallback_resolves_no_mark_variants() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(0, "SKU-200X100X50", "P-001").with_mark("无标记"),
        ]);
        let mut records = vec![record(0, "200x100x50", "")];
        let mut stats = MatchStats::default();

        let resolved =
            resolve_by_attributes(&mut records, &catalog, SecondaryPredicate::MarkEquals, &mut stats);

        assert_eq!(resolved, 1);
        assert_eq!(records[0].resolved_code.as_deref(), Some("P-001"));
        assert_eq!(stats.entered_fallback, 1);
        assert_eq!(stats.resolved_in_fallback, 1);
    }

    #[test]
    fn test_first_catalog_entry_wins() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(0, "10x20x30", "FIRST").with_mark("红"),
            CatalogEntry::new(1, "X-10*20*30", "SECOND").with_mark("红"),
        ]);
        let mut records = vec![record(0, "A-10x20x30", "红")];
        let mut stats = MatchStats::default();

        resolve_by_attributes(&mut records, &catalog, SecondaryPredicate::MarkEquals, &mut stats);
        assert_eq!(records[0].resolved_code.as_deref(), Some("FIRST"));
    }

    #[test]
    fn test_dimension_permutation_does_not_match() {
        let catalog = Catalog::new(vec![CatalogEntry::new(0, "30x20x10", "P").with_mark("")]);
        let mut records = vec![record(0, "10x20x30", "")];
        let mut stats = MatchStats::default();

        assert_eq!(
            resolve_by_attributes(&mut records, &catalog, SecondaryPredicate::MarkEquals, &mut stats),
            0
        );
        assert_eq!(stats.still_unresolved(), 1);
    }

    #[test]
    fn test_weight_fallback_requires_exact_weight() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(0, "10x20x30", "LIGHT").with_net_weight(1.5),
            CatalogEntry::new(1, "10x20x30", "HEAVY").with_net_weight(2.25),
        ]);
        let mut records = vec![
            record(0, "10x20x30", "").with_unit_weight(2.25),
            record(1, "10x20x30", "").with_unit_weight(2.2500001),
            record(2, "10x20x30", ""),
        ];
        let mut stats = MatchStats::default();

        let resolved = resolve_by_attributes(
            &mut records,
            &catalog,
            SecondaryPredicate::WeightEquals,
            &mut stats,
        );

        assert_eq!(resolved, 1);
        assert_eq!(records[0].resolved_code.as_deref(), Some("HEAVY"));
        assert!(!records[1].is_resolved());
        assert!(!records[2].is_resolved());
        assert_eq!(stats.entered_fallback, 3);
    }

    #[test]
    fn test_records_without_dimensions_still_count_as_entered() {
        let catalog = Catalog::new(vec![CatalogEntry::new(0, "10x20x30", "P").with_mark("")]);
        let mut records = vec![record(0, "no size here", ""), record(1, "x", "").with_code("C")];
        let mut stats = MatchStats::default();

        resolve_by_attributes(&mut records, &catalog, SecondaryPredicate::MarkEquals, &mut stats);
        assert_eq!(stats.entered_fallback, 1);
        assert_eq!(stats.resolved_in_fallback, 0);
    }

    #[test]
    fn test_select_policy_from_catalog_shape() {
        let columns = CatalogColumns::default();
        let with_mark = Table::from_strings(&["规格型号", "产品编号", "标记"], vec![]);
        let with_weight = Table::from_strings(&["规格型号", "产品编号", "净重"], vec![]);
        let bare = Table::from_strings(&["规格型号", "产品编号"], vec![]);

        assert_eq!(
            SecondaryPredicate::select(FallbackPolicy::Auto, &with_mark, &columns).unwrap(),
            SecondaryPredicate::MarkEquals
        );
        assert_eq!(
            SecondaryPredicate::select(FallbackPolicy::Auto, &with_weight, &columns).unwrap(),
            SecondaryPredicate::WeightEquals
        );
        assert!(
            SecondaryPredicate::select(FallbackPolicy::Auto, &bare, &columns)
                .unwrap_err()
                .is_schema()
        );
    }
}

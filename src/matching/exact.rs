//! Exact compound-key lookup against the index table.

use log::{debug, warn};
use std::collections::HashMap;

use super::record::{IndexEntry, Resolution, TargetRecord};
use super::schema::DuplicateKeys;
use crate::error::{ReconcileError, Result};

/// Compound key → code lookup built once from the index table.
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    codes: HashMap<String, String>,
    duplicates: usize,
}

impl IndexMap {
    /// Build the map in load order.
    ///
    /// With [`DuplicateKeys::LastWins`] a repeated key replaces the earlier code; with
    /// [`DuplicateKeys::Reject`] the first repeat aborts with [`ReconcileError::DuplicateIndexKey`].
    pub fn build(entries: &[IndexEntry], policy: DuplicateKeys) -> Result<Self> {
        let mut codes = HashMap::with_capacity(entries.len());
        let mut first_rows: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
        let mut duplicates = 0;

        for entry in entries {
            if let Some(&first_row) = first_rows.get(entry.compound_key.as_str()) {
                duplicates += 1;
                if policy == DuplicateKeys::Reject {
                    return Err(ReconcileError::DuplicateIndexKey {
                        key: entry.compound_key.clone(),
                        first_row,
                        second_row: entry.row,
                    });
                }
                debug!(
                    "Index key '{}' repeated on row {}, keeping the later code",
                    entry.compound_key, entry.row
                );
            } else {
                first_rows.insert(entry.compound_key.as_str(), entry.row);
            }
            codes.insert(entry.compound_key.clone(), entry.code.clone());
        }

        if duplicates > 0 {
            warn!("Index table contains {} repeated keys; last occurrence wins", duplicates);
        }

        Ok(Self { codes, duplicates })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.codes.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}

/// Fill every unresolved record whose compound key is in the index. Returns the number filled.
pub fn resolve_by_key(records: &mut [TargetRecord], index: &IndexMap) -> usize {
    let mut resolved = 0;

    for record in records.iter_mut().filter(|r| !r.is_resolved()) {
        if let Some(code) = index.get(&record.compound_key) {
            if record.assign(code, Resolution::Index) {
                resolved += 1;
            }
        }
    }

    debug!("Exact key stage resolved {} records", resolved);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::schema::KeyTrim;

    fn entry(row: usize, key: &str, code: &str) -> IndexEntry {
        IndexEntry {
            row,
            compound_key: key.to_string(),
            code: code.to_string(),
        }
    }

    #[test]
    fn test_last_write_wins() {
        let map = IndexMap::build(
            &[entry(0, "A红", "C1"), entry(1, "A红", "C2")],
            DuplicateKeys::LastWins,
        )
        .unwrap();
        assert_eq!(map.get("A红"), Some("C2"));
        assert_eq!(map.duplicate_count(), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_reject_duplicates() {
        let err = IndexMap::build(
            &[entry(0, "A红", "C1"), entry(4, "A红", "C2")],
            DuplicateKeys::Reject,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::DuplicateIndexKey { first_row: 0, second_row: 4, .. }
        ));
    }

    #[test]
    fn test_resolve_skips_populated_records() {
        let map = IndexMap::build(
            &[entry(0, "A", "P-000"), entry(1, "B", "P-002")],
            DuplicateKeys::LastWins,
        )
        .unwrap();
        let mut records = vec![
            TargetRecord::new(0, "A", "", KeyTrim::Verbatim).with_code("P-999"),
            TargetRecord::new(1, "B", "", KeyTrim::Verbatim),
            TargetRecord::new(2, "C", "", KeyTrim::Verbatim),
        ];

        assert_eq!(resolve_by_key(&mut records, &map), 1);
        assert_eq!(records[0].resolved_code.as_deref(), Some("P-999"));
        assert_eq!(records[1].resolved_code.as_deref(), Some("P-002"));
        assert_eq!(records[1].resolution, Some(Resolution::Index));
        assert!(!records[2].is_resolved());
    }

    #[test]
    fn test_key_match_is_case_sensitive() {
        let map = IndexMap::build(&[entry(0, "abc", "P-1")], DuplicateKeys::LastWins).unwrap();
        let mut records = vec![TargetRecord::new(0, "ABC", "", KeyTrim::Verbatim)];
        assert_eq!(resolve_by_key(&mut records, &map), 0);
    }
}

use serde::Serialize;

use super::record::{Resolution, TargetRecord};

/// Counters collected while the fallback stage runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub entered_fallback: usize,
    pub resolved_in_fallback: usize,
}

impl MatchStats {
    pub fn record_entry(&mut self) {
        self.entered_fallback += 1;
    }

    pub fn record_resolution(&mut self) {
        self.resolved_in_fallback += 1;
    }

    pub fn still_unresolved(&self) -> usize {
        self.entered_fallback - self.resolved_in_fallback
    }

    /// Summarize a finished run.
    pub fn report(&self, records: &[TargetRecord]) -> MatchReport {
        let count = |resolution: Resolution| {
            records
                .iter()
                .filter(|r| r.resolution == Some(resolution))
                .count()
        };

        MatchReport {
            total_records: records.len(),
            already_populated: count(Resolution::Existing),
            resolved_by_key: count(Resolution::Index),
            entered_fallback: self.entered_fallback,
            resolved_in_fallback: self.resolved_in_fallback,
            still_unresolved: self.still_unresolved(),
            unresolved_rows: records
                .iter()
                .filter(|r| !r.is_resolved())
                .map(|r| r.row)
                .collect(),
        }
    }
}

/// Outcome summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MatchReport {
    pub total_records: usize,
    pub already_populated: usize,
    pub resolved_by_key: usize,
    pub entered_fallback: usize,
    pub resolved_in_fallback: usize,
    pub still_unresolved: usize,
    /// Records still missing a code. [`MatchStats::report`] lists data-row indices;
    /// the pipeline turns them into 1-based sheet row numbers.
    pub unresolved_rows: Vec<usize>,
}

impl MatchReport {
    pub fn newly_resolved(&self) -> usize {
        self.resolved_by_key + self.resolved_in_fallback
    }

    pub fn summary(&self) -> String {
        format!(
            "Match Summary:\n\
             • Records: {}\n\
             • Already populated: {}\n\
             • Resolved by index key: {}\n\
             • Entered catalog fallback: {}\n\
             • Resolved by catalog: {}\n\
             • Still unresolved: {}",
            self.total_records,
            self.already_populated,
            self.resolved_by_key,
            self.entered_fallback,
            self.resolved_in_fallback,
            self.still_unresolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::schema::KeyTrim;

    #[test]
    fn test_still_unresolved_is_difference() {
        let stats = MatchStats {
            entered_fallback: 7,
            resolved_in_fallback: 3,
        };
        assert_eq!(stats.still_unresolved(), 4);
    }

    #[test]
    fn test_report_counts_by_resolution() {
        let mut records = vec![
            TargetRecord::new(0, "a", "", KeyTrim::Verbatim).with_code("P-1"),
            TargetRecord::new(1, "b", "", KeyTrim::Verbatim),
            TargetRecord::new(2, "c", "", KeyTrim::Verbatim),
        ];
        records[1].assign("P-2", Resolution::Index);

        let stats = MatchStats {
            entered_fallback: 1,
            resolved_in_fallback: 0,
        };
        let report = stats.report(&records);
        assert_eq!(report.already_populated, 1);
        assert_eq!(report.resolved_by_key, 1);
        assert_eq!(report.still_unresolved, 1);
        assert_eq!(report.unresolved_rows, vec![2]);
        assert_eq!(report.newly_resolved(), 1);
    }
}

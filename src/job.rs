//! One end-to-end reconciliation: load the three sheets, match, persist.
//!
//! The job itself is synchronous. Callers that must stay responsive run it on a
//! blocking worker and read [`JobEvent`]s from the channel they pass in.

use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::matching::{MatchOptions, MatchReport, run};
use crate::table::Table;
use crate::workbook::{self, WriteOutcome};

/// Progress notifications sent while a job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Loading { path: PathBuf, sheet: String },
    Loaded { sheet: String, rows: usize },
    Matching { records: usize },
    Writing { path: PathBuf },
    Finished { newly_resolved: usize, still_unresolved: usize },
}

/// Input locations for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileJob {
    pub target: PathBuf,
    pub target_sheet: String,
    pub index: PathBuf,
    pub index_sheet: String,
    pub catalog: PathBuf,
    pub catalog_sheet: String,
    /// Defaults to the target workbook itself (or a sibling `.xlsx` for formats that cannot be patched).
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

/// What a finished job did.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub report: MatchReport,
    /// Path written to, `None` for dry runs and runs without changes.
    pub written: Option<PathBuf>,
    pub patched_cells: usize,
}

impl ReconcileJob {
    pub fn destination(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| workbook::default_destination(&self.target))
    }

    /// Whether running would replace a file that already exists: the target itself,
    /// or whatever currently sits at the destination.
    pub fn needs_confirmation(&self) -> bool {
        if self.dry_run {
            return false;
        }
        let destination = self.destination();
        destination == self.target || destination.exists()
    }

    pub fn run(&self, options: &MatchOptions, events: &UnboundedSender<JobEvent>) -> Result<JobOutcome> {
        let target = load(&self.target, &self.target_sheet, events)?;
        let index = load(&self.index, &self.index_sheet, events)?;
        let catalog = load(&self.catalog, &self.catalog_sheet, events)?;

        notify(events, JobEvent::Matching {
            records: target.row_count(),
        });
        let reconciliation = run(&target, &index, &catalog, options)?;
        let report = reconciliation.report.clone();
        let patches = &reconciliation.merged.patches;

        let written = if self.dry_run {
            info!("Dry run: {} cell changes not written", patches.len());
            None
        } else {
            let destination = self.destination();
            notify(events, JobEvent::Writing {
                path: destination.clone(),
            });
            match workbook::write_back(
                &self.target,
                &destination,
                &self.target_sheet,
                patches,
                reconciliation.table(),
            )? {
                WriteOutcome::Patched { path, .. } | WriteOutcome::Rewritten { path, .. } => Some(path),
                WriteOutcome::Unchanged => None,
            }
        };

        notify(events, JobEvent::Finished {
            newly_resolved: report.newly_resolved(),
            still_unresolved: report.still_unresolved,
        });

        Ok(JobOutcome {
            report,
            written,
            patched_cells: patches.len(),
        })
    }
}

fn load(path: &Path, sheet: &str, events: &UnboundedSender<JobEvent>) -> Result<Table> {
    notify(events, JobEvent::Loading {
        path: path.to_path_buf(),
        sheet: sheet.to_string(),
    });
    let table = workbook::read_table(path, sheet)?;
    notify(events, JobEvent::Loaded {
        sheet: sheet.to_string(),
        rows: table.row_count(),
    });
    Ok(table)
}

fn notify(events: &UnboundedSender<JobEvent>, event: JobEvent) {
    if let Err(e) = events.send(event) {
        warn!("Job event dropped: {:?}", e.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(target: PathBuf, output: Option<PathBuf>) -> ReconcileJob {
        ReconcileJob {
            target,
            target_sheet: "07".to_string(),
            index: PathBuf::from("index.xlsx"),
            index_sheet: "Sheet1".to_string(),
            catalog: PathBuf::from("catalog.xlsx"),
            catalog_sheet: "Sheet".to_string(),
            output,
            dry_run: false,
        }
    }

    #[test]
    fn test_in_place_write_needs_confirmation() {
        let job = job(PathBuf::from("production.xlsx"), None);
        assert!(job.needs_confirmation());
    }

    #[test]
    fn test_existing_converted_sibling_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("production.xls");
        let job = job(target.clone(), None);
        assert_eq!(job.destination(), dir.path().join("production.xlsx"));
        assert!(!job.needs_confirmation());

        std::fs::write(dir.path().join("production.xlsx"), b"old").unwrap();
        assert!(job.needs_confirmation());
    }

    #[test]
    fn test_new_output_or_dry_run_needs_no_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = job(
            dir.path().join("production.xlsx"),
            Some(dir.path().join("out.xlsx")),
        );
        assert!(!fresh.needs_confirmation());

        let mut dry = job(dir.path().join("production.xlsx"), None);
        dry.dry_run = true;
        assert!(!dry.needs_confirmation());
    }
}

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use log::{info, warn};
use std::path::PathBuf;
use tokio::sync::mpsc;

use code_reconcile::config::Config;
use code_reconcile::job::{JobEvent, JobOutcome, ReconcileJob};
use code_reconcile::matching::{DuplicateKeys, FallbackPolicy, KeyTrim, MatchOptions};

use crate::cli::ui::Spinner;
use crate::cli::ui::prompts::{is_interactive, prompt_overwrite_confirmation, prompt_path, prompt_sheet};

/// Unresolved rows listed in the text summary before it is cut short.
const UNRESOLVED_PREVIEW: usize = 20;

#[derive(Args)]
pub struct RunCommands {
    /// Production workbook whose code column gets filled
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Sheet of the production workbook (defaults to the configured target sheet)
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Workbook holding the compound-key index
    #[arg(short, long)]
    pub index: Option<PathBuf>,

    #[arg(long)]
    pub index_sheet: Option<String>,

    /// Product catalog workbook
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    #[arg(long)]
    pub catalog_sheet: Option<String>,

    /// Write the result here instead of back into the target workbook
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Match and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Secondary catalog attribute: auto, mark or weight
    #[arg(long)]
    pub fallback: Option<FallbackPolicy>,

    /// Trim whitespace from the target's item and mark labels before building keys (index keys are used as-is)
    #[arg(long)]
    pub trim_keys: bool,

    /// Fail when the index holds the same key twice
    #[arg(long)]
    pub strict_index: bool,

    /// Output format: text or json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Overwrite the target workbook without asking
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn handle_run_command(args: RunCommands, config: &Config) -> Result<()> {
    info!("Executing run command");

    let target = prompt_path(args.target, "Production workbook", "--target")?;
    let target_sheet = prompt_sheet(args.sheet, "Target sheet", &config.sheets.target)?;
    let index = prompt_path(args.index, "Index workbook", "--index")?;
    let index_sheet = prompt_sheet(args.index_sheet, "Index sheet", &config.sheets.index)?;
    let catalog = prompt_path(args.catalog, "Catalog workbook", "--catalog")?;
    let catalog_sheet = prompt_sheet(args.catalog_sheet, "Catalog sheet", &config.sheets.catalog)?;

    for path in [&target, &index, &catalog] {
        if !path.is_file() {
            bail!("Workbook not found: {}", path.display());
        }
    }

    let mut options = config.match_options();
    if let Some(fallback) = args.fallback {
        options.fallback = fallback;
    }
    if args.trim_keys {
        options.key_trim = KeyTrim::Trim;
    }
    if args.strict_index {
        options.duplicate_keys = DuplicateKeys::Reject;
    }

    let job = ReconcileJob {
        target,
        target_sheet,
        index,
        index_sheet,
        catalog,
        catalog_sheet,
        output: args.output,
        dry_run: args.dry_run,
    };

    if !args.yes && job.needs_confirmation() {
        let destination = job.destination();
        if !is_interactive() {
            bail!(
                "Refusing to overwrite {} without confirmation (pass --yes or a new --output)",
                destination.display()
            );
        }
        if !prompt_overwrite_confirmation(&job, &destination)? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let json = args.format == "json";
    let outcome = execute(job.clone(), options, !json).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize run outcome")?
        );
    } else {
        print_summary(&job, &outcome);
    }

    Ok(())
}

/// Run the job on a blocking worker, following its progress on a spinner.
async fn execute(
    job: ReconcileJob,
    options: MatchOptions,
    show_progress: bool,
) -> Result<JobOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || job.run(&options, &tx));

    let spinner = show_progress.then(|| Spinner::start("Starting..."));
    while let Some(event) = rx.recv().await {
        info!("Job event: {:?}", event);
        if let Some(spinner) = &spinner {
            spinner.set_message(describe(&event));
        }
    }
    drop(spinner);

    let outcome = handle.await.context("Reconciliation worker panicked")??;
    Ok(outcome)
}

fn describe(event: &JobEvent) -> String {
    match event {
        JobEvent::Loading { path, sheet } => {
            format!("Loading sheet '{}' from {}", sheet, path.display())
        }
        JobEvent::Loaded { sheet, rows } => format!("Loaded {} rows from '{}'", rows, sheet),
        JobEvent::Matching { records } => format!("Matching {} records", records),
        JobEvent::Writing { path } => format!("Writing {}", path.display()),
        JobEvent::Finished {
            newly_resolved,
            still_unresolved,
        } => format!("Done: {} resolved, {} unresolved", newly_resolved, still_unresolved),
    }
}

fn print_summary(job: &ReconcileJob, outcome: &JobOutcome) {
    let report = &outcome.report;

    println!("{}", report.summary());
    println!();

    match &outcome.written {
        Some(path) => println!(
            "{} Wrote {} cells to {}",
            "✓".bright_green(),
            outcome.patched_cells,
            path.display().to_string().bright_white()
        ),
        None if job.dry_run => println!(
            "{} Dry run: {} cells would change",
            "○".bright_blue(),
            outcome.patched_cells
        ),
        None => println!("{} Nothing to write", "○".bright_blue()),
    }

    if report.unresolved_rows.is_empty() {
        return;
    }

    warn!("{} records left without a code", report.unresolved_rows.len());
    let preview: Vec<String> = report
        .unresolved_rows
        .iter()
        .take(UNRESOLVED_PREVIEW)
        .map(|row| row.to_string())
        .collect();
    let more = report.unresolved_rows.len().saturating_sub(UNRESOLVED_PREVIEW);
    let suffix = if more > 0 {
        format!(" (+{} more)", more)
    } else {
        String::new()
    };
    println!(
        "{} Unresolved rows in '{}': {}{}",
        "⚠".bright_yellow(),
        job.target_sheet,
        preview.join(", ").yellow(),
        suffix
    );
}

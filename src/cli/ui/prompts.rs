use anyhow::{Result, bail};
use code_reconcile::job::ReconcileJob;
use colored::Colorize;
use dialoguer::{Input, Select};
use is_terminal::IsTerminal;
use std::path::{Path, PathBuf};

/// Whether we can ask the user anything.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Use `value` when given, otherwise ask for a file path until an existing file is entered.
pub fn prompt_path(value: Option<PathBuf>, prompt: &str, flag: &str) -> Result<PathBuf> {
    if let Some(path) = value {
        return Ok(path);
    }
    if !is_interactive() {
        bail!("{} is required (pass {})", prompt, flag);
    }

    loop {
        let input = Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()?;
        let path = PathBuf::from(input.trim());
        if path.is_file() {
            return Ok(path);
        }
        println!("{} File not found: {}", "✗".bright_red(), path.display());
    }
}

/// Use `value` when given, otherwise ask with `default` pre-filled.
pub fn prompt_sheet(value: Option<String>, prompt: &str, default: &str) -> Result<String> {
    if let Some(sheet) = value {
        return Ok(sheet);
    }
    if !is_interactive() {
        return Ok(default.to_string());
    }

    let sheet = Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(sheet)
}

/// Interactive confirmation prompt using arrow-key navigable selection
///
/// # Arguments
/// * `prompt` - The question to ask the user
/// * `default_yes` - Whether "Yes" should be the default selection (index 0)
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_overwrite_confirmation(job: &ReconcileJob, destination: &Path) -> Result<bool> {
    let prompt = if destination == job.target {
        format!(
            "Write codes into sheet '{}' of {}?",
            job.target_sheet,
            destination.display()
        )
    } else {
        format!("{} already exists. Overwrite it?", destination.display())
    };
    prompt_confirmation(&prompt, destination == job.target)
}

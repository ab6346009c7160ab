use super::commands::config::ConfigCommands;
use super::commands::run::RunCommands;
use super::commands::sheets::SheetsCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "code-reconcile")]
#[command(about = "Fill missing product codes in a production workbook from an index table and a product catalog")]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match records and write resolved codes back into the target sheet
    Run(RunCommands),
    /// List the sheets of a workbook
    Sheets(SheetsCommands),
    /// Configuration management
    Config(ConfigCommands),
}

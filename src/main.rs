use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;

use cli::commands::{handle_config_command, handle_run_command, handle_sheets_command};
use cli::{Cli, Commands};
use code_reconcile::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("code-reconcile.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting code-reconcile");

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run(args) => handle_run_command(args, &config).await?,
        Commands::Sheets(args) => handle_sheets_command(args).await?,
        Commands::Config(args) => handle_config_command(args, &config, cli.config.clone()).await?,
    }

    Ok(())
}

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use log::info;
use std::path::PathBuf;

use code_reconcile::config::Config;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the location of the config file
    Path,
    /// Write the default configuration to disk
    Init {
        /// Replace an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_config_command(
    args: ConfigCommands,
    config: &Config,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::get_config_path()?,
    };

    match args.command {
        ConfigSubcommands::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigSubcommands::Path => {
            println!("{}", path.display());
        }
        ConfigSubcommands::Init { force } => {
            info!("Initializing config at {:?}", path);
            if path.exists() && !force {
                bail!(
                    "Config already exists at {} (use --force to replace it)",
                    path.display()
                );
            }
            Config::default().save_to(&path)?;
            println!(
                "{} Wrote default config to {}",
                "✓".bright_green(),
                path.display()
            );
        }
    }

    Ok(())
}

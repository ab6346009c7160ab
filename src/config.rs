use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::matching::{DuplicateKeys, FallbackPolicy, KeyTrim, MatchOptions, SchemaMapping};

/// Default sheet names for the three workbooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDefaults {
    #[serde(default = "default_target_sheet")]
    pub target: String,
    #[serde(default = "default_index_sheet")]
    pub index: String,
    #[serde(default = "default_catalog_sheet")]
    pub catalog: String,
}

fn default_target_sheet() -> String {
    "07".to_string()
}

fn default_index_sheet() -> String {
    "Sheet1".to_string()
}

fn default_catalog_sheet() -> String {
    "Sheet".to_string()
}

impl Default for SheetDefaults {
    fn default() -> Self {
        Self {
            target: default_target_sheet(),
            index: default_index_sheet(),
            catalog: default_catalog_sheet(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub key_trim: KeyTrim,
    #[serde(default)]
    pub duplicate_keys: DuplicateKeys,
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheets: SheetDefaults,
    #[serde(default)]
    pub schema: SchemaMapping,
    #[serde(default)]
    pub matching: MatchingSettings,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("code-reconcile")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".code-reconcile")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user config, or defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!(
            "Loaded config: target sheet '{}', fallback {:?}",
            config.sheets.target, config.matching.fallback
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
                info!("Created config directory: {:?}", parent);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Pipeline options described by this config.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::builder()
            .schema(self.schema.clone())
            .key_trim(self.matching.key_trim)
            .duplicate_keys(self.matching.duplicate_keys)
            .fallback(self.matching.fallback)
            .build()
    }
}

#![allow(deprecated)]
use std::{
    env::home_dir,
    io::Write,
    path::{Path, PathBuf},
};

use crate::constants::{
    CONFIG_DIR, CONFIG_FILE, ENV_PREFIX, GREEN_ANSI_COLOR, PURPLE_ANSI_COLOR, RESET_ANSI_COLOR,
};
use alloy::primitives::Address;
use eyre::{eyre, OptionExt, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The [`Configuration`] struct represents the configuration of the CLI.
///
/// Every value is optional. Values set here are defaults for the matching subcommand flags.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Whether `prestate` reports only the changed state.
    pub diff_mode: Option<bool>,

    /// Whether `balance` attributes contracts to their top contract.
    pub top_contracts: Option<bool>,

    /// Comma separated callers whose callees `balance` never attributes.
    pub excluded_addresses: Option<String>,
}

#[allow(deprecated)]
impl Configuration {
    /// The path of the configuration file, `~/.statetrace/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        let mut config_path = home_dir().ok_or_eyre("failed to get home directory")?;
        config_path.push(CONFIG_DIR);
        config_path.push(CONFIG_FILE);
        Ok(config_path)
    }

    /// Returns the current configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Returns the configuration stored at `config_path`, with environment overrides applied.
    /// A missing file is an empty configuration.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = Self::load_file_from(config_path)?;

        // now load from env, env should override config values
        Ok(Self::load_from_env()?.or(config))
    }

    /// Returns the configuration stored at `config_path` alone, ignoring the environment.
    /// This is what edits start from, so overrides are never written back.
    pub fn load_file_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("no configuration at {}, using defaults", config_path.display());
            return Ok(Configuration::default());
        }

        let config = std::fs::read_to_string(config_path)?;
        serde_json::from_str(&config)
            .map_err(|e| eyre!("invalid configuration at {}: {}", config_path.display(), e))
    }

    /// Loads configuration from `STATETRACE_`-prefixed env variables with envy
    fn load_from_env() -> Result<Self> {
        envy::prefixed(ENV_PREFIX).from_env::<Configuration>().map_err(Into::into)
    }

    /// Fills every value unset in `self` from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Configuration {
            diff_mode: self.diff_mode.or(fallback.diff_mode),
            top_contracts: self.top_contracts.or(fallback.top_contracts),
            excluded_addresses: self.excluded_addresses.or(fallback.excluded_addresses),
        }
    }

    /// Saves the configuration to disk.
    fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Saves the configuration to `config_path`, creating its directory if needed.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // build the directory if it doesn't exist
        if let Some(dir) = config_path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let config = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, config)?;

        Ok(())
    }

    /// Sets a value in the configuration stored at `config_path` and persists it. Environment
    /// overrides are neither applied nor saved.
    pub fn update(config_path: &Path, key: &str, value: &str) -> Result<Self> {
        let mut config = Self::load_file_from(config_path)?;
        config.set_value(key, value)?;
        config.save_to(config_path)?;
        Ok(config)
    }

    /// Set a value, validating it first.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "diff_mode" => self.diff_mode = Some(parse_bool(key, value)?),
            "top_contracts" => self.top_contracts = Some(parse_bool(key, value)?),
            "excluded_addresses" => {
                let addresses = parse_addresses(value)?
                    .iter()
                    .map(|address| address.to_string())
                    .collect::<Vec<_>>();
                self.excluded_addresses = Some(addresses.join(","));
            }
            _ => return Err(eyre!("invalid key '{}'", key)),
        };

        Ok(())
    }

    /// The configured excluded addresses.
    pub fn excluded(&self) -> Result<Vec<Address>> {
        self.excluded_addresses.as_deref().map(parse_addresses).unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Starts blocking interactive mode for configuration.
    pub fn from_interactive() -> Result<Self> {
        let mut config = Self::default_path()
            .and_then(|path| Self::load_file_from(&path))
            .unwrap_or_default();

        println!(
            "{PURPLE_ANSI_COLOR}Welcome to the statetrace CLI configuration wizard!{RESET_ANSI_COLOR}\n\nI'll help walk you through configuring the CLI. If you wish to use an existing configuration value, just press enter.\nYou can exit this wizard at any time by pressing `Ctrl+C`.\n",
        );

        if let Some(value) =
            prompt(1, "Report only changed state in `prestate`", &config.diff_mode)?
        {
            config.set_value("diff_mode", &value)?;
        }
        if let Some(value) =
            prompt(2, "Attribute top contracts in `balance`", &config.top_contracts)?
        {
            config.set_value("top_contracts", &value)?;
        }
        if let Some(value) = prompt(
            3,
            "Set the comma separated excluded addresses",
            &config.excluded_addresses,
        )? {
            config.set_value("excluded_addresses", &value)?;
        }

        println!(
            "\n{GREEN_ANSI_COLOR}Configuration set!{RESET_ANSI_COLOR}\n{}",
            serde_json::to_string_pretty(&config)?
        );

        config.save()?;

        Ok(config)
    }
}

/// Prints a numbered question and reads the answer. An empty answer keeps the current value.
fn prompt<T: std::fmt::Debug>(
    index: usize,
    question: &str,
    current: &T,
) -> Result<Option<String>> {
    print!("{GREEN_ANSI_COLOR}{index}.{RESET_ANSI_COLOR} {question} (default: {current:?}): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| eyre!("'{}' must be `true` or `false`, got '{}'", key, value))
}

fn parse_addresses(value: &str) -> Result<Vec<Address>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(|address| {
            address.parse::<Address>().map_err(|e| eyre!("invalid address '{}': {}", address, e))
        })
        .collect()
}

//! Configuration loading for the recitation reader.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back
//! to sensible defaults so the player can still launch.

mod defaults;
mod models;

pub use models::{AppConfig, LogLevel};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Load configuration from `path`, falling back to defaults when the file is
/// missing or malformed.
pub fn load_config(path: &Path) -> AppConfig {
    match try_load_config(path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        Err(err) => {
            warn!(path = %path.display(), "Using default configuration: {err:#}");
            AppConfig::default()
        }
    }
}

fn try_load_config(path: &Path) -> Result<AppConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Reading config {}", path.display()))?;
    parse_config(&data)
}

pub fn parse_config(data: &str) -> Result<AppConfig> {
    toml::from_str(data).context("Parsing config TOML")
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string(config).context("Serializing config TOML")
}

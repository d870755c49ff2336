//! # Configuration Loader
//!
//! Reads the TOML file into [`EngineConfig`]. Pure data loading: whatever is
//! in the file is accepted, missing keys keep their defaults and no value is
//! validated here.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ps_core::config::EngineConfig;

const CONFIG_ENV: &str = "PAGESYNC_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`EngineConfig`].
pub fn load_config(config_path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config as TOML: {}", config_path.display()))
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(config_path: &Path) -> anyhow::Result<EngineConfig> {
    if !config_path.exists() {
        return Ok(EngineConfig::default());
    }
    load_config(config_path)
}

/// `$PAGESYNC_CONFIG`, else `<config dir>/pagesync/config.toml`, else
/// `./config.toml`.
pub fn resolve_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("pagesync").join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

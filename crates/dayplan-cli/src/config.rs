//! Configuration file discovery and loading.
//!
//! Lookup order: `--config`, `$DAYPLAN_CONFIG`, then
//! `<config_dir>/dayplan/config.toml`. An explicitly named file must exist;
//! the default location is optional and falls back to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dayplan_core::DayplanConfig;
use tracing::debug;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DAYPLAN_CONFIG";

/// Effective configuration and where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: DayplanConfig,
    pub path: Option<PathBuf>,
}

/// Resolve and load the configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from));

    if let Some(path) = named {
        let config = load_from_path(&path)?;
        return Ok(LoadedConfig {
            config,
            path: Some(path),
        });
    }

    if let Some(path) = default_path().filter(|p| p.exists()) {
        let config = load_from_path(&path)?;
        return Ok(LoadedConfig {
            config,
            path: Some(path),
        });
    }

    debug!("No config file found, using defaults");
    Ok(LoadedConfig {
        config: DayplanConfig::default(),
        path: None,
    })
}

/// `<config_dir>/dayplan/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dayplan").join("config.toml"))
}

/// Read, parse and validate one config file.
pub fn load_from_path(path: &Path) -> Result<DayplanConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse TOML into a validated config. Missing keys take their defaults.
pub fn parse_config(contents: &str) -> Result<DayplanConfig> {
    let config: DayplanConfig = toml::from_str(contents).context("Failed to parse TOML")?;
    config.validate()?;
    Ok(config)
}

/// Render a config as TOML.
pub fn to_toml(config: &DayplanConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

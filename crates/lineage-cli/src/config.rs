//! Optional YAML configuration for the CLI

use anyhow::{Context, Result};
use lineage_parser::Dialect;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{GlobalArgs, OutputFormat};

/// Contents of a `sqllineage.yml` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dialect used when `--dialect` is not given
    #[serde(default)]
    pub dialect: Dialect,

    /// Replace literals with `?` in reported queries
    #[serde(default = "default_mask_queries")]
    pub mask_queries: bool,

    /// Output format used when `--output` is not given
    #[serde(default)]
    pub default_output: OutputFormat,
}

fn default_mask_queries() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            mask_queries: default_mask_queries(),
            default_output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }
}

/// Effective settings after applying CLI overrides to the config file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dialect: Dialect,
    pub mask_queries: bool,
    pub output: OutputFormat,
}

impl Settings {
    /// Resolve settings; flags win over the config file, which wins over defaults
    pub fn resolve(global: &GlobalArgs, output: Option<OutputFormat>) -> Result<Self> {
        let config = match &global.config {
            Some(path) => Config::load(Path::new(path))?,
            None => Config::default(),
        };
        Ok(Self::from_config(&config, global, output))
    }

    fn from_config(config: &Config, global: &GlobalArgs, output: Option<OutputFormat>) -> Self {
        Self {
            dialect: global
                .dialect
                .as_deref()
                .map(Dialect::from_name)
                .unwrap_or(config.dialect),
            mask_queries: config.mask_queries,
            output: output.unwrap_or(config.default_output),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

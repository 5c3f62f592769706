//! TOML configuration parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub convert: ConvertConfig,
}

/// How converted notebooks are delivered.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// A single `.dbc` archive named after the input.
    #[default]
    Dbc,
    /// The converted tree itself, one `.<language>` file per notebook.
    #[serde(alias = "dir")]
    #[value(alias = "dir")]
    Directory,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Dbc => f.write_str("dbc"),
            OutputType::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    #[serde(default)]
    pub output_type: OutputType,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_skip_hidden_dirs")]
    pub skip_hidden_dirs: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_type: OutputType::Dbc,
            strict: false,
            skip_hidden_dirs: default_skip_hidden_dirs(),
        }
    }
}

fn default_skip_hidden_dirs() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    Ok(config)
}

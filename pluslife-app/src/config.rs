use crate::plotting::PlotOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// Settings for the harness commands, read from an optional YAML file.
/// Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub plot: PlotOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `check` saves the rendered plot.
    pub plot_path: PathBuf,
    /// Appended to the input path for the re-encoded copy.
    pub tested_suffix: String,
    /// How far in the past a testrun start must lie for `check` to pass.
    pub min_start_age_secs: i64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot_path: PathBuf::from("current_plot.png"),
            tested_suffix: ".tested".to_string(),
            min_start_age_secs: 300,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file parses as YAML null rather than an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Uses the file when one is given and present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::warn!(path = ?path, "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

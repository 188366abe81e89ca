//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tonnostat.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset loading settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// FAO zone name overrides (code → display name).
    #[serde(default)]
    pub zones: HashMap<String, String>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "tonnostat_report.md".to_string()
}

/// Dataset loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Header names for the required columns.
    #[serde(default)]
    pub columns: ColumnMap,

    /// Accepted capture-date formats, tried in order.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Fail loading when the invalid-row ratio exceeds this value (0-1).
    ///
    /// Unset means no threshold: invalid rows are skipped and reported
    /// but never abort the load.
    #[serde(default)]
    pub max_invalid_ratio: Option<f64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            date_formats: default_date_formats(),
            max_invalid_ratio: None,
        }
    }
}

fn default_date_formats() -> Vec<String> {
    // ISO first, then the day-first form common in Italian exports.
    vec!["%Y-%m-%d".to_string(), "%d/%m/%Y".to_string()]
}

/// Header names for the required CSV columns.
///
/// Defaults are the English names; the loader also recognizes the
/// Italian headers of the original dataset as built-in aliases, so
/// most deployments never need to set these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_capture_date")]
    pub capture_date: String,
    #[serde(default = "default_weight_kg")]
    pub weight_kg: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_fao_zone")]
    pub fao_zone: String,
    #[serde(default = "default_vessel_id")]
    pub vessel_id: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            capture_date: default_capture_date(),
            weight_kg: default_weight_kg(),
            region: default_region(),
            fao_zone: default_fao_zone(),
            vessel_id: default_vessel_id(),
        }
    }
}

fn default_capture_date() -> String {
    "capture_date".to_string()
}

fn default_weight_kg() -> String {
    "weight_kg".to_string()
}

fn default_region() -> String {
    "region".to_string()
}

fn default_fao_zone() -> String {
    "fao_zone".to_string()
}

fn default_vessel_id() -> String {
    "vessel_id".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the per-month seasonality table.
    #[serde(default = "default_true")]
    pub include_seasonality: bool,

    /// Include the per-zone rollup table.
    #[serde(default = "default_true")]
    pub include_zones: bool,

    /// Maximum number of skipped rows listed in the report.
    #[serde(default = "default_max_invalid_listed")]
    pub max_invalid_listed: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_seasonality: true,
            include_zones: true,
            max_invalid_listed: default_max_invalid_listed(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_invalid_listed() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".tonnostat.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Invalid-row threshold - only override if explicitly provided
        if let Some(ratio) = args.max_invalid_ratio {
            self.dataset.max_invalid_ratio = Some(ratio);
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "tonnostat_report.md");
        assert_eq!(config.dataset.columns.capture_date, "capture_date");
        assert_eq!(config.dataset.date_formats[0], "%Y-%m-%d");
        assert!(config.dataset.max_invalid_ratio.is_none());
        assert!(config.report.include_seasonality);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "stagione.md"
verbose = true

[dataset]
max_invalid_ratio = 0.25
date_formats = ["%d/%m/%Y"]

[dataset.columns]
capture_date = "data_cattura"
weight_kg = "peso_kg"
region = "regione"

[report]
include_zones = false

[zones]
"37.2.2" = "Mar Ionio"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "stagione.md");
        assert!(config.general.verbose);
        assert_eq!(config.dataset.max_invalid_ratio, Some(0.25));
        assert_eq!(config.dataset.date_formats, vec!["%d/%m/%Y"]);
        assert_eq!(config.dataset.columns.capture_date, "data_cattura");
        assert_eq!(config.dataset.columns.weight_kg, "peso_kg");
        // Unset columns keep their defaults.
        assert_eq!(config.dataset.columns.vessel_id, "vessel_id");
        assert!(!config.report.include_zones);
        assert_eq!(config.zones.get("37.2.2").map(String::as_str), Some("Mar Ionio"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[dataset]"));
        assert!(toml_str.contains("[report]"));
    }
}

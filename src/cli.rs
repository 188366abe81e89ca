//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Tonnostat - statistics for recreational bluefin tuna catch records
///
/// Reads a CSV of catch records, computes per-region and per-year
/// totals, shares, seasonality and growth, and writes a Markdown or
/// JSON report.
///
/// Examples:
///   tonnostat --input pescaTonnoRosso.csv
///   tonnostat --input catches.csv --years 2020,2021 --regions Sicilia
///   tonnostat --input catches.csv --format json --output stats.json
///   tonnostat --input catches.csv --validate-only
///   tonnostat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the catch-record CSV file
    ///
    /// Required columns: capture_date, weight_kg, region, fao_zone,
    /// vessel_id (Italian headers are recognized automatically).
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, default_value = "tonnostat_report.md", value_name = "FILE")]
    pub output: PathBuf,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Years to include (comma-separated)
    ///
    /// Example: --years 2020,2021. Omit to include every year.
    #[arg(long, value_name = "YEARS", value_delimiter = ',')]
    pub years: Option<Vec<i32>>,

    /// Regions to include (comma-separated)
    ///
    /// Example: --regions Sicilia,Sardegna. Omit to include every region.
    #[arg(long, value_name = "REGIONS", value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Fail when more than this fraction of rows is invalid (0.0 - 1.0)
    ///
    /// Useful for CI-style checks on exported data. Exit code 2 when
    /// the threshold is exceeded. Default: no threshold.
    #[arg(long, value_name = "RATIO", env = "TONNOSTAT_MAX_INVALID_RATIO")]
    pub max_invalid_ratio: Option<f64>,

    /// Load and validate the input without writing a report
    ///
    /// Prints record and reject counts and exits.
    #[arg(long)]
    pub validate_only: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tonnostat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .tonnostat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate the input path
        match self.input {
            Some(ref input) => {
                if !input.exists() {
                    return Err(format!("Input file does not exist: {}", input.display()));
                }
                if !input.is_file() {
                    return Err(format!("Input path is not a file: {}", input.display()));
                }
            }
            None => return Err("An input file is required".to_string()),
        }

        // Validate the invalid-row threshold
        if let Some(ratio) = self.max_invalid_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err("Max invalid ratio must be between 0.0 and 1.0".to_string());
            }
        }

        // Empty filter lists select nothing; reject them early
        if let Some(ref years) = self.years {
            if years.is_empty() {
                return Err("--years was given but no years were listed".to_string());
            }
        }
        if let Some(ref regions) = self.regions {
            if regions.is_empty() || regions.iter().any(|r| r.trim().is_empty()) {
                return Err("--regions was given but no regions were listed".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Human-readable description of the active filter, for the report.
    pub fn filter_description(&self) -> String {
        match (&self.years, &self.regions) {
            (None, None) => "all records".to_string(),
            (Some(years), None) => format!("years: {}", join_i32(years)),
            (None, Some(regions)) => format!("regions: {}", regions.join(", ")),
            (Some(years), Some(regions)) => format!(
                "years: {}; regions: {}",
                join_i32(years),
                regions.join(", ")
            ),
        }
    }
}

fn join_i32(values: &[i32]) -> String {
    values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

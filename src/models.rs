//! Data models for the catch-record statistics engine.
//!
//! This module contains the core data structures used throughout the
//! application: the raw catch record, the derived statistics rows, and
//! the report types.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One validated catch record: a single logged specimen landing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchRecord {
    /// Calendar date of the catch.
    pub capture_date: NaiveDate,
    /// Weight of the specimen in kilograms. Always positive after validation.
    pub weight_kg: f64,
    /// Administrative region where the catch was landed.
    pub region: String,
    /// FAO/GFCM fishing-zone code (e.g. "37.2.1").
    pub fao_zone: String,
    /// Opaque vessel identifier, display only.
    pub vessel_id: String,
}

impl CatchRecord {
    /// Calendar year of the capture date.
    pub fn year(&self) -> i32 {
        self.capture_date.year()
    }

    /// Year as a text label.
    ///
    /// Derived tables carry the year as a discrete category, never a
    /// number, so a categorical axis can never render "2004.5".
    pub fn year_label(&self) -> String {
        self.capture_date.year().to_string()
    }

    /// Month of the capture date (1-12).
    pub fn month(&self) -> u32 {
        self.capture_date.month()
    }

    /// Year-month bucket key, e.g. "2021-06".
    pub fn year_month(&self) -> String {
        self.capture_date.format("%Y-%m").to_string()
    }
}

/// Canonical English month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// All-time totals for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOverallStat {
    /// Region name.
    pub region: String,
    /// Sum of all catch weights for the region.
    pub total_weight_kg: f64,
    /// Share of the all-time grand total, in percent.
    pub share_pct: f64,
}

/// Totals, counts and mean weight for one (year, region) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionYearStat {
    /// Year as a text label (see [`CatchRecord::year_label`]).
    pub year: String,
    /// Region name.
    pub region: String,
    /// Sum of catch weights in the group.
    pub total_weight_kg: f64,
    /// Number of catches in the group.
    pub count: usize,
    /// Mean catch weight in the group.
    pub mean_weight_kg: f64,
    /// Share of the year's total, in percent.
    pub share_pct: f64,
}

/// Seasonality rollup for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthStat {
    /// Canonical English month name.
    pub month: String,
    /// Month number, 1-12.
    pub month_number: u32,
    /// Sum of catch weights in the month, across all years.
    pub total_weight_kg: f64,
    /// Number of catches in the month.
    pub count: usize,
    /// Mean catch weight in the month.
    pub mean_weight_kg: f64,
}

/// Rollup for one FAO fishing zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStat {
    /// Raw zone code as it appeared in the input.
    pub zone_code: String,
    /// Human-readable zone name; the raw code when no mapping exists.
    pub zone_name: String,
    /// Sum of catch weights in the zone.
    pub total_weight_kg: f64,
    /// Number of catches in the zone.
    pub count: usize,
    /// Share of the all-time grand total, in percent.
    pub share_pct: f64,
}

/// Total catch weight for one year, input to the growth series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    /// Calendar year.
    pub year: i32,
    /// Year as a text label, carried alongside for table output.
    pub label: String,
    /// Sum of catch weights in the year.
    pub total_weight_kg: f64,
    /// Number of catches in the year.
    pub count: usize,
}

/// Year-over-year growth for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearGrowth {
    /// Year as a text label.
    pub year: String,
    /// Sum of catch weights in the year.
    pub total_weight_kg: f64,
    /// Percentage change relative to the preceding year.
    ///
    /// `None` for the first year in the series: growth is undefined
    /// there, not zero.
    pub growth_pct: Option<f64>,
}

/// Why a single input row was rejected during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// A required field was empty.
    MissingField(String),
    /// The capture date could not be parsed with any accepted format.
    BadDate(String),
    /// The weight was missing, non-numeric, NaN, or not positive.
    NonPositiveWeight(String),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingField(field) => write!(f, "missing field `{}`", field),
            InvalidReason::BadDate(value) => write!(f, "unparseable date `{}`", value),
            InvalidReason::NonPositiveWeight(value) => {
                write!(f, "non-positive weight `{}`", value)
            }
        }
    }
}

/// One rejected input row, kept for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRecord {
    /// 1-based line number in the source file (header is line 1).
    pub line: u64,
    /// Why the row was rejected.
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// A loaded dataset: the valid records plus the rejects.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Records that passed validation.
    pub records: Vec<CatchRecord>,
    /// Rows that were skipped, with line numbers and reasons.
    pub invalid: Vec<InvalidRecord>,
    /// Path the dataset was loaded from, for display.
    pub source: String,
    /// When the dataset was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Fraction of parsed rows that failed validation, in [0, 1].
    pub fn invalid_ratio(&self) -> f64 {
        let parsed = self.records.len() + self.invalid.len();
        if parsed == 0 {
            0.0
        } else {
            self.invalid.len() as f64 / parsed as f64
        }
    }
}

/// Metadata about a generated statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the analyzed CSV file.
    pub input_path: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of valid records loaded from the file.
    pub records_loaded: usize,
    /// Number of rows skipped during validation.
    pub records_invalid: usize,
    /// Number of records left after the year/region filter.
    pub records_aggregated: usize,
    /// Human-readable description of the applied filter.
    pub filter: String,
    /// Wall-clock duration of the run, in seconds.
    pub duration_seconds: f64,
}

/// The complete statistics report: metadata plus every derived table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// All-time totals and shares per region.
    pub regions: Vec<RegionOverallStat>,
    /// Totals, counts, means and within-year shares per (year, region).
    pub by_year_and_region: Vec<RegionYearStat>,
    /// Seasonality rollup per calendar month.
    pub seasonality: Vec<MonthStat>,
    /// Rollup per FAO fishing zone.
    pub zones: Vec<ZoneStat>,
    /// Year totals with year-over-year growth.
    pub growth: Vec<YearGrowth>,
    /// Skipped rows, for diagnostic display.
    pub invalid_records: Vec<InvalidRecord>,
}

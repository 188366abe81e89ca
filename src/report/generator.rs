//! Markdown report generation.
//!
//! This module renders the derived statistics tables into a Markdown
//! report, one section per table. Shares and means are formatted with
//! two decimals for display only; every number is computed upstream
//! from the raw floats.

use crate::config::ReportConfig;
use crate::models::{
    InvalidRecord, MonthStat, RegionOverallStat, RegionYearStat, Report, ReportMetadata,
    YearGrowth, ZoneStat,
};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Bluefin Tuna Catch Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_regions_section(&report.regions));
    output.push_str(&generate_year_region_section(&report.by_year_and_region));

    if config.include_seasonality {
        output.push_str(&generate_seasonality_section(&report.seasonality));
    }
    if config.include_zones {
        output.push_str(&generate_zones_section(&report.zones));
    }

    output.push_str(&generate_growth_section(&report.growth));
    output.push_str(&generate_invalid_section(
        &report.invalid_records,
        config.max_invalid_listed,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        metadata.records_loaded
    ));
    if metadata.records_invalid > 0 {
        section.push_str(&format!(
            "- **Rows Skipped:** {}\n",
            metadata.records_invalid
        ));
    }
    section.push_str(&format!("- **Filter:** {}\n", metadata.filter));
    section.push_str(&format!(
        "- **Records Aggregated:** {}\n",
        metadata.records_aggregated
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the all-time regional totals table.
fn generate_regions_section(regions: &[RegionOverallStat]) -> String {
    let mut section = String::new();

    section.push_str("## Regional Totals (All Time)\n\n");
    section.push_str("| Region | Total (kg) | Share |\n");
    section.push_str("|:---|---:|---:|\n");

    for stat in regions {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2}% |\n",
            stat.region, stat.total_weight_kg, stat.share_pct
        ));
    }
    section.push('\n');

    section
}

/// Generate the year-by-region table.
fn generate_year_region_section(stats: &[RegionYearStat]) -> String {
    let mut section = String::new();

    section.push_str("## Regional Share of Annual Total\n\n");
    section.push_str("| Year | Region | Total (kg) | Catches | Mean (kg) | Share |\n");
    section.push_str("|:---|:---|---:|---:|---:|---:|\n");

    for stat in stats {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {} | {:.2} | {:.2}% |\n",
            stat.year,
            stat.region,
            stat.total_weight_kg,
            stat.count,
            stat.mean_weight_kg,
            stat.share_pct
        ));
    }
    section.push('\n');

    section
}

/// Generate the seasonality table.
fn generate_seasonality_section(months: &[MonthStat]) -> String {
    let mut section = String::new();

    section.push_str("## Seasonality\n\n");
    section.push_str("| Month | Total (kg) | Catches | Mean (kg) |\n");
    section.push_str("|:---|---:|---:|---:|\n");

    for stat in months {
        section.push_str(&format!(
            "| {} | {:.2} | {} | {:.2} |\n",
            stat.month, stat.total_weight_kg, stat.count, stat.mean_weight_kg
        ));
    }
    section.push('\n');

    section
}

/// Generate the FAO zone table.
fn generate_zones_section(zones: &[ZoneStat]) -> String {
    let mut section = String::new();

    section.push_str("## FAO Zones\n\n");
    section.push_str("| Zone | Name | Total (kg) | Catches | Share |\n");
    section.push_str("|:---|:---|---:|---:|---:|\n");

    for stat in zones {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {} | {:.2}% |\n",
            stat.zone_code, stat.zone_name, stat.total_weight_kg, stat.count, stat.share_pct
        ));
    }
    section.push('\n');

    section
}

/// Generate the year-over-year growth table.
fn generate_growth_section(growth: &[YearGrowth]) -> String {
    let mut section = String::new();

    section.push_str("## Year-over-Year Growth\n\n");
    section.push_str("| Year | Total (kg) | Growth |\n");
    section.push_str("|:---|---:|---:|\n");

    for stat in growth {
        let growth_cell = match stat.growth_pct {
            Some(pct) => format!("{:+.2}%", pct),
            None => "n/a".to_string(),
        };
        section.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            stat.year, stat.total_weight_kg, growth_cell
        ));
    }
    section.push('\n');

    section
}

/// Generate the skipped-rows section, capped at `max_listed` entries.
fn generate_invalid_section(invalid: &[InvalidRecord], max_listed: usize) -> String {
    if invalid.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Rows\n\n");
    section.push_str(&format!(
        "{} rows failed validation and were excluded from every table:\n\n",
        invalid.len()
    ));

    for record in invalid.iter().take(max_listed) {
        section.push_str(&format!("- {}\n", record));
    }
    if invalid.len() > max_listed {
        section.push_str(&format!("- … and {} more\n", invalid.len() - max_listed));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by tonnostat*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered report to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvalidReason;
    use chrono::Utc;

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            input_path: "pescaTonnoRosso.csv".to_string(),
            generated_at: Utc::now(),
            records_loaded: 4,
            records_invalid: 1,
            records_aggregated: 4,
            filter: "all records".to_string(),
            duration_seconds: 0.2,
        };

        Report {
            metadata,
            regions: vec![
                RegionOverallStat {
                    region: "Sicilia".to_string(),
                    total_weight_kg: 300.0,
                    share_pct: 75.0,
                },
                RegionOverallStat {
                    region: "Sardegna".to_string(),
                    total_weight_kg: 100.0,
                    share_pct: 25.0,
                },
            ],
            by_year_and_region: vec![RegionYearStat {
                year: "2021".to_string(),
                region: "Sicilia".to_string(),
                total_weight_kg: 300.0,
                count: 2,
                mean_weight_kg: 150.0,
                share_pct: 75.0,
            }],
            seasonality: vec![MonthStat {
                month: "June".to_string(),
                month_number: 6,
                total_weight_kg: 400.0,
                count: 3,
                mean_weight_kg: 133.33,
            }],
            zones: vec![ZoneStat {
                zone_code: "37.2.2".to_string(),
                zone_name: "Ionian".to_string(),
                total_weight_kg: 400.0,
                count: 3,
                share_pct: 100.0,
            }],
            growth: vec![
                YearGrowth {
                    year: "2020".to_string(),
                    total_weight_kg: 100.0,
                    growth_pct: None,
                },
                YearGrowth {
                    year: "2021".to_string(),
                    total_weight_kg: 300.0,
                    growth_pct: Some(200.0),
                },
            ],
            invalid_records: vec![InvalidRecord {
                line: 3,
                reason: InvalidReason::BadDate("31/31/2020".to_string()),
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Bluefin Tuna Catch Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Regional Totals (All Time)"));
        assert!(markdown.contains("| Sicilia | 300.00 | 75.00% |"));
        assert!(markdown.contains("## Seasonality"));
        assert!(markdown.contains("## FAO Zones"));
        assert!(markdown.contains("Ionian"));
        assert!(markdown.contains("## Skipped Rows"));
        assert!(markdown.contains("31/31/2020"));
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let report = create_test_report();
        let config = ReportConfig {
            include_seasonality: false,
            include_zones: false,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &config);

        assert!(!markdown.contains("## Seasonality"));
        assert!(!markdown.contains("## FAO Zones"));
        assert!(markdown.contains("## Regional Totals"));
    }

    #[test]
    fn test_growth_section_marks_first_year_missing() {
        let report = create_test_report();
        let section = generate_growth_section(&report.growth);

        assert!(section.contains("| 2020 | 100.00 | n/a |"));
        assert!(section.contains("| 2021 | 300.00 | +200.00% |"));
    }

    #[test]
    fn test_invalid_section_is_capped() {
        let invalid: Vec<InvalidRecord> = (0..30)
            .map(|i| InvalidRecord {
                line: i + 2,
                reason: InvalidReason::NonPositiveWeight("0".to_string()),
            })
            .collect();

        let section = generate_invalid_section(&invalid, 20);
        assert!(section.contains("30 rows failed validation"));
        assert!(section.contains("… and 10 more"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"regions\""));
        assert!(json.contains("\"by_year_and_region\""));
        assert!(json.contains("\"growth\""));
        // The first year's growth is serialized as missing, not zero.
        assert!(json.contains("\"growth_pct\": null"));
    }
}

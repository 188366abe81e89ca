//! Tonnostat - Bluefin Tuna Catch Statistics
//!
//! A CLI tool that reads recreational bluefin-tuna catch records from
//! a CSV file and produces per-region, per-year, per-month and
//! per-zone statistics as Markdown or JSON reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, bad schema, empty dataset, etc.)
//!   2 - Invalid rows above the --max-invalid-ratio threshold

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;
mod zones;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use dataset::DatasetCache;
use error::DatasetError;
use models::{Report, ReportMetadata};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zones::ZoneTable;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Tonnostat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tonnostat.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".tonnostat.toml");

    if path.exists() {
        eprintln!("⚠️  .tonnostat.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .tonnostat.toml")?;

    println!("✅ Created .tonnostat.toml with default settings.");
    println!("   Edit it to customize column names, date formats, and zones.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete workflow. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let zone_table = ZoneTable::with_overrides(config.zones.clone());

    let input = args
        .input
        .clone()
        .context("An input file is required")?;

    // Step 1: Load and validate the dataset
    println!("📥 Loading dataset: {}", input.display());

    let mut cache = DatasetCache::new();
    let dataset = match cache.get_or_load(&input, &config.dataset, !args.quiet) {
        Ok(dataset) => dataset,
        Err(e @ DatasetError::InvalidRatioExceeded { .. }) => {
            eprintln!("\n⛔ {}. Failing (exit code 2).", e);
            return Ok(2);
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "   {} records loaded, {} rows skipped",
        dataset.records.len(),
        dataset.invalid.len()
    );

    if !dataset.invalid.is_empty() && !args.quiet {
        for record in dataset.invalid.iter().take(5) {
            println!("   ⚠️  {}", record);
        }
        if dataset.invalid.len() > 5 {
            println!("   ⚠️  … and {} more", dataset.invalid.len() - 5);
        }
    }

    // Handle --validate-only: counts are printed, nothing is written
    if args.validate_only {
        println!("\n✅ Validation complete. No report was written.");
        return Ok(0);
    }

    // Step 2: Apply the year/region filter
    let filtered = analysis::filter_records(
        &dataset.records,
        args.years.as_deref(),
        args.regions.as_deref(),
    );
    info!(
        "{} of {} records match the filter ({})",
        filtered.len(),
        dataset.records.len(),
        args.filter_description()
    );

    if filtered.is_empty() {
        eprintln!(
            "\n⚠️  No data: no records match the selected filter ({}).",
            args.filter_description()
        );
        return Err(DatasetError::EmptyDataset.into());
    }

    // Step 3: Compute the derived tables
    println!("📊 Computing statistics...");

    let regions = analysis::overall_by_region(&filtered)?;
    let by_year_and_region = analysis::by_year_and_region(&filtered)?;
    let seasonality = analysis::by_month(&filtered)?;
    let zone_stats = analysis::by_zone(&filtered, &zone_table)?;
    let totals = analysis::year_totals(&filtered)?;
    let growth = analysis::year_over_year_growth(&totals);

    // Step 4: Build the report
    let duration = start_time.elapsed().as_secs_f64();

    let metadata = ReportMetadata {
        input_path: input.display().to_string(),
        generated_at: Utc::now(),
        records_loaded: dataset.records.len(),
        records_invalid: dataset.invalid.len(),
        records_aggregated: filtered.len(),
        filter: args.filter_description(),
        duration_seconds: duration,
    };

    let report = Report {
        metadata,
        regions,
        by_year_and_region,
        seasonality,
        zones: zone_stats,
        growth,
        invalid_records: dataset.invalid.clone(),
    };

    // Step 5: Render and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    report::generator::write_report(&output, &args.output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    // Print summary
    println!("\n📈 Summary:");
    if let Some(top) = report.regions.first() {
        println!(
            "   Top region: {} ({:.2} kg, {:.1}% of the total)",
            top.region, top.total_weight_kg, top.share_pct
        );
    }
    println!(
        "   Years covered: {}",
        report
            .growth
            .iter()
            .map(|g| g.year.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Report saved to: {}",
        args.output.display()
    );

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .tonnostat.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

//! CSV dataset loading and validation.
//!
//! This module reads catch records from a CSV file, checks the header
//! against the required schema, validates each row, and accumulates
//! rejects instead of aborting: a bad date on line 814 must not throw
//! away the other ten thousand rows.
//!
//! It also owns [`DatasetCache`], the caller-side load-once layer keyed
//! by file identity. The aggregator itself stays stateless; whoever
//! drives it decides when a reload is warranted.

use crate::config::DatasetConfig;
use crate::error::DatasetError;
use crate::models::{CatchRecord, Dataset, InvalidReason, InvalidRecord};
use chrono::{NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Built-in header aliases, matched after the configured name.
///
/// The original dataset is an Italian export; recognizing its headers
/// out of the box means most deployments need no column config at all.
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("capture_date", &["data_cattura"]),
    ("weight_kg", &["peso_kg"]),
    ("region", &["regione"]),
    ("fao_zone", &["zona_fao"]),
    ("vessel_id", &["barca_id", "imbarcazione"]),
];

/// Resolved column indices for one CSV header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    capture_date: usize,
    weight_kg: usize,
    region: usize,
    fao_zone: usize,
    vessel_id: usize,
}

/// Load and validate a catch-record dataset from a CSV file.
///
/// Fails with [`DatasetError::Schema`] when a required column is
/// absent, and with [`DatasetError::InvalidRatioExceeded`] when the
/// configured reject threshold is crossed. Individual bad rows are
/// collected on the returned [`Dataset`] and never abort the load.
pub fn load_dataset(
    path: &Path,
    config: &DatasetConfig,
    show_progress: bool,
) -> Result<Dataset, DatasetError> {
    info!("Loading dataset: {}", path.display());

    let file = fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let columns = resolve_columns(&headers, config)?;
    debug!("Resolved columns: {:?}", columns);

    let progress = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {pos} rows read")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Some(pb)
    } else {
        None
    };

    let mut records = Vec::new();
    let mut invalid = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let line = row.position().map_or(0, |p| p.line());

        match parse_row(&row, line, columns, config) {
            Ok(record) => records.push(record),
            Err(reject) => {
                debug!("Skipping row: {}", reject);
                invalid.push(reject);
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let dataset = Dataset {
        records,
        invalid,
        source: path.display().to_string(),
        loaded_at: Utc::now(),
    };

    if !dataset.invalid.is_empty() {
        warn!(
            "Skipped {} invalid rows out of {} ({:.1}%)",
            dataset.invalid.len(),
            dataset.records.len() + dataset.invalid.len(),
            dataset.invalid_ratio() * 100.0
        );
    }

    if let Some(max_ratio) = config.max_invalid_ratio {
        let ratio = dataset.invalid_ratio();
        if ratio > max_ratio {
            return Err(DatasetError::InvalidRatioExceeded {
                invalid: dataset.invalid.len(),
                parsed: dataset.records.len() + dataset.invalid.len(),
                ratio: ratio * 100.0,
                max_pct: max_ratio * 100.0,
            });
        }
    }

    info!(
        "Loaded {} records ({} skipped) from {}",
        dataset.records.len(),
        dataset.invalid.len(),
        path.display()
    );

    Ok(dataset)
}

/// Resolve the index of every required column, or fail with the first
/// missing one.
fn resolve_columns(
    headers: &StringRecord,
    config: &DatasetConfig,
) -> Result<ColumnIndices, DatasetError> {
    let find = |configured: &str, logical: &str| -> Result<usize, DatasetError> {
        // Configured name first, then the built-in aliases.
        if let Some(index) = header_index(headers, configured) {
            return Ok(index);
        }
        let aliases = HEADER_ALIASES
            .iter()
            .find(|(name, _)| *name == logical)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[]);
        for alias in aliases {
            if let Some(index) = header_index(headers, alias) {
                return Ok(index);
            }
        }
        Err(DatasetError::Schema {
            column: logical.to_string(),
        })
    };

    Ok(ColumnIndices {
        capture_date: find(&config.columns.capture_date, "capture_date")?,
        weight_kg: find(&config.columns.weight_kg, "weight_kg")?,
        region: find(&config.columns.region, "region")?,
        fao_zone: find(&config.columns.fao_zone, "fao_zone")?,
        vessel_id: find(&config.columns.vessel_id, "vessel_id")?,
    })
}

fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

/// Validate a single CSV row into a catch record.
fn parse_row(
    row: &StringRecord,
    line: u64,
    columns: ColumnIndices,
    config: &DatasetConfig,
) -> Result<CatchRecord, InvalidRecord> {
    let reject = |reason: InvalidReason| InvalidRecord { line, reason };

    let field = |index: usize| row.get(index).unwrap_or("").trim();

    let date_raw = field(columns.capture_date);
    if date_raw.is_empty() {
        return Err(reject(InvalidReason::MissingField("capture_date".to_string())));
    }
    let capture_date = parse_date(date_raw, &config.date_formats)
        .ok_or_else(|| reject(InvalidReason::BadDate(date_raw.to_string())))?;

    let weight_raw = field(columns.weight_kg);
    let weight_kg: f64 = weight_raw
        .parse()
        .ok()
        .filter(|w: &f64| w.is_finite() && *w > 0.0)
        .ok_or_else(|| reject(InvalidReason::NonPositiveWeight(weight_raw.to_string())))?;

    let region = field(columns.region);
    if region.is_empty() {
        return Err(reject(InvalidReason::MissingField("region".to_string())));
    }

    // Zone and vessel are enrichment/display fields; blanks are allowed.
    Ok(CatchRecord {
        capture_date,
        weight_kg,
        region: region.to_string(),
        fao_zone: field(columns.fao_zone).to_string(),
        vessel_id: field(columns.vessel_id).to_string(),
    })
}

/// Try each configured date format in order; first match wins.
fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// File identity: modification time plus size.
///
/// Size is part of the key so that a rewrite within the filesystem's
/// mtime granularity still invalidates the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    size: u64,
}

impl FileStamp {
    fn for_path(path: &Path) -> Result<Self, DatasetError> {
        let metadata = fs::metadata(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            modified,
            size: metadata.len(),
        })
    }
}

struct CacheEntry {
    stamp: FileStamp,
    dataset: Dataset,
}

/// Caller-owned load-once cache keyed by file identity.
///
/// A hit returns a clone of the cached dataset; a stale or missing
/// entry triggers a reload. Owning the cache here, outside the
/// aggregator, keeps the aggregation itself a pure function.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl DatasetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached dataset for `path`, reloading when the file
    /// changed on disk since it was cached.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        config: &DatasetConfig,
        show_progress: bool,
    ) -> Result<Dataset, DatasetError> {
        let stamp = FileStamp::for_path(path)?;
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        if let Some(entry) = self.entries.get(&key) {
            if entry.stamp == stamp {
                debug!("Dataset cache hit: {}", path.display());
                return Ok(entry.dataset.clone());
            }
            debug!("Dataset cache stale: {}", path.display());
        }

        let dataset = load_dataset(path, config, show_progress)?;
        self.entries.insert(
            key,
            CacheEntry {
                stamp,
                dataset: dataset.clone(),
            },
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ENGLISH_CSV: &str = "\
capture_date,weight_kg,region,fao_zone,vessel_id
2020-05-01,120.5,Sicilia,37.2.2,IT-001
2020-06-12,88.0,Sardegna,37.1.3,IT-002
2021-07-03,150.25,Sicilia,37.2.2,IT-001
";

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_dataset() {
        let file = write_csv(ENGLISH_CSV);
        let dataset = load_dataset(file.path(), &DatasetConfig::default(), false).unwrap();

        assert_eq!(dataset.records.len(), 3);
        assert!(dataset.invalid.is_empty());
        assert_eq!(dataset.records[0].region, "Sicilia");
        assert!((dataset.records[0].weight_kg - 120.5).abs() < 1e-9);
        assert_eq!(dataset.records[0].year(), 2020);
    }

    #[test]
    fn test_italian_headers_and_dates() {
        let file = write_csv(
            "\
data_cattura,peso_kg,regione,zona_fao,barca_id
15/06/2021,95.5,Calabria,37.2.2,IT-099
",
        );
        let dataset = load_dataset(file.path(), &DatasetConfig::default(), false).unwrap();

        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].region, "Calabria");
        assert_eq!(dataset.records[0].year_label(), "2021");
        assert_eq!(dataset.records[0].month(), 6);
    }

    #[test]
    fn test_missing_column_is_a_schema_error() {
        let file = write_csv(
            "\
capture_date,region,fao_zone,vessel_id
2020-05-01,Sicilia,37.2.2,IT-001
",
        );
        let err = load_dataset(file.path(), &DatasetConfig::default(), false).unwrap_err();

        match err {
            DatasetError::Schema { column } => assert_eq!(column, "weight_kg"),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rows_are_skipped_not_fatal() {
        let file = write_csv(
            "\
capture_date,weight_kg,region,fao_zone,vessel_id
2020-05-01,120.5,Sicilia,37.2.2,IT-001
not-a-date,80.0,Sicilia,37.2.2,IT-001
2020-06-01,-5,Sardegna,37.1.3,IT-002
2020-07-01,50.0,,37.2.1,IT-003
2021-07-03,150.25,Sicilia,37.2.2,IT-001
",
        );
        let dataset = load_dataset(file.path(), &DatasetConfig::default(), false).unwrap();

        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.invalid.len(), 3);

        assert_eq!(
            dataset.invalid[0].reason,
            InvalidReason::BadDate("not-a-date".to_string())
        );
        assert_eq!(
            dataset.invalid[1].reason,
            InvalidReason::NonPositiveWeight("-5".to_string())
        );
        assert_eq!(
            dataset.invalid[2].reason,
            InvalidReason::MissingField("region".to_string())
        );

        // The excluded -5 row contributes to no sum.
        let total: f64 = dataset.records.iter().map(|r| r.weight_kg).sum();
        assert!((total - 270.75).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ratio_threshold() {
        let csv = "\
capture_date,weight_kg,region,fao_zone,vessel_id
2020-05-01,120.5,Sicilia,37.2.2,IT-001
bad,80.0,Sicilia,37.2.2,IT-001
";
        let file = write_csv(csv);

        let strict = DatasetConfig {
            max_invalid_ratio: Some(0.2),
            ..DatasetConfig::default()
        };
        let err = load_dataset(file.path(), &strict, false).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidRatioExceeded { invalid: 1, parsed: 2, .. }));

        // Without a threshold the same file loads.
        let dataset = load_dataset(file.path(), &DatasetConfig::default(), false).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.invalid.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_dataset(
            Path::new("/nonexistent/pesca.csv"),
            &DatasetConfig::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_cache_hit_and_invalidation() {
        let mut file = write_csv(ENGLISH_CSV);
        let mut cache = DatasetCache::new();
        let config = DatasetConfig::default();

        let first = cache.get_or_load(file.path(), &config, false).unwrap();
        assert_eq!(first.records.len(), 3);
        assert_eq!(cache.len(), 1);

        // Same stamp: served from cache, still one entry.
        let second = cache.get_or_load(file.path(), &config, false).unwrap();
        assert_eq!(second.records.len(), 3);
        assert_eq!(second.loaded_at, first.loaded_at);
        assert_eq!(cache.len(), 1);

        // Appending a row changes the file size, which invalidates the entry.
        file.write_all(b"2022-08-09,44.0,Puglia,37.2.1,IT-004\n")
            .unwrap();
        file.flush().unwrap();

        let third = cache.get_or_load(file.path(), &config, false).unwrap();
        assert_eq!(third.records.len(), 4);
        assert_eq!(cache.len(), 1);
    }
}

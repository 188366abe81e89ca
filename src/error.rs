//! Error taxonomy for dataset loading and aggregation.
//!
//! Dataset-level failures (missing column, nothing left to aggregate)
//! abort the call and propagate to the caller. Row-level validation
//! failures never appear here: they are accumulated on the `Dataset`
//! as `InvalidRecord` entries and loading continues.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or aggregating catch records.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A required input column is absent from the CSV header.
    #[error("required column `{column}` is missing from the input header")]
    Schema { column: String },

    /// No records to aggregate (empty file, or everything filtered out).
    #[error("no valid records to aggregate")]
    EmptyDataset,

    /// The configured invalid-row threshold was exceeded.
    #[error("{invalid} of {parsed} rows are invalid ({ratio:.1}%), above the configured maximum of {max_pct:.1}%")]
    InvalidRatioExceeded {
        invalid: usize,
        parsed: usize,
        ratio: f64,
        max_pct: f64,
    },

    /// Guard against computing a percentage share over a zero total.
    ///
    /// Unreachable when `EmptyDataset` is checked first and weights are
    /// validated positive; kept as an assertion rather than a panic.
    #[error("cannot compute shares over a zero weight total")]
    DivisionUndefined,

    /// The input file could not be read.
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader reported a structural error.
    #[error("malformed CSV in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_the_column() {
        let err = DatasetError::Schema {
            column: "weight_kg".to_string(),
        };
        assert!(err.to_string().contains("weight_kg"));
    }

    #[test]
    fn test_ratio_error_message() {
        let err = DatasetError::InvalidRatioExceeded {
            invalid: 3,
            parsed: 10,
            ratio: 30.0,
            max_pct: 20.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 of 10"));
        assert!(msg.contains("30.0%"));
    }
}

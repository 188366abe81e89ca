//! FAO/GFCM fishing-zone name lookup.
//!
//! Maps the 37.x.x Mediterranean subarea codes found in the catch data
//! to human-readable names. Unknown codes pass through unchanged: an
//! unmapped zone must never make a row unusable.

use std::collections::HashMap;

/// Built-in GFCM subarea names for FAO major area 37.
const BUILTIN_ZONES: &[(&str, &str)] = &[
    ("37", "Mediterranean and Black Sea"),
    ("37.1", "Western Mediterranean"),
    ("37.1.1", "Balearic"),
    ("37.1.2", "Gulf of Lion"),
    ("37.1.3", "Sardinia"),
    ("37.2", "Central Mediterranean"),
    ("37.2.1", "Adriatic"),
    ("37.2.2", "Ionian"),
    ("37.3", "Eastern Mediterranean"),
    ("37.3.1", "Aegean"),
    ("37.3.2", "Levant"),
];

/// Zone code→name lookup table with per-deployment overrides.
#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    overrides: HashMap<String, String>,
}

impl ZoneTable {
    /// Create a table with config-supplied overrides layered on top of
    /// the built-in GFCM names. Overrides win on conflict.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Look up the name for a zone code, if one is known.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        if let Some(name) = self.overrides.get(code) {
            return Some(name.as_str());
        }
        BUILTIN_ZONES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    /// Display name for a zone code.
    ///
    /// Falls open: an unknown code is returned unchanged rather than
    /// rejected or replaced with a placeholder.
    pub fn display_name(&self, code: &str) -> String {
        self.name_for(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }
}

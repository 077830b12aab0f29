//! Dashboard settings
//! User-tunable options for loading and summarising a sales file.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of entries kept in "top N" tables.
pub const DEFAULT_TOP_N: usize = 10;

/// Default file name offered for the product summary export.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "summary.csv";

/// Settings for a dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Number of entries in top-N tables (products, customers).
    pub top_n: usize,
    /// CSV field separator.
    pub separator: char,
    /// Extra `chrono` format strings tried after the built-in date formats.
    pub extra_date_formats: Vec<String>,
    /// Suggested file name for the product summary export.
    pub export_file_name: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            separator: ',',
            extra_date_formats: Vec::new(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl DashboardSettings {
    /// Parse settings from a JSON document. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Separator as the single byte polars expects. Non-ASCII falls back to a comma.
    pub fn separator_byte(&self) -> u8 {
        if self.separator.is_ascii() {
            self.separator as u8
        } else {
            log::warn!(
                "Separator {:?} is not a single-byte character, using ','",
                self.separator
            );
            b','
        }
    }
}

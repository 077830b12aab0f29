//! CSV Data Loader Module
//! Reads an uploaded sales file with Polars and validates its schema.

use crate::data::model::REQUIRED_COLUMNS;
use crate::error::{DashboardError, Result};
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Raw uploaded table: every column read as text, names trimmed.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
    columns: Vec<String>,
}

impl RawTable {
    pub fn new(df: DataFrame) -> Self {
        let columns = df
            .get_column_names()
            .iter()
            .map(|s| s.trim().to_string())
            .collect();
        Self { df, columns }
    }

    /// Column names as discovered at load time (trimmed).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// A column cast to text, or `None` when the file does not carry it.
    pub fn text_column(&self, name: &str) -> Result<Option<Series>> {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return Ok(None);
        };
        let series = self.df.get_columns()[idx]
            .as_materialized_series()
            .cast(&DataType::String)?;
        Ok(Some(series))
    }
}

/// Handles CSV intake with Polars.
pub struct DataLoader {
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DataLoader {
    pub fn new(separator: u8) -> Self {
        Self { separator }
    }

    /// Read CSV bytes (UTF-8, header row). No type inference: coercion
    /// happens later, value by value.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<RawTable> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DashboardError::EmptyDataset);
        }

        let parse_options = CsvParseOptions::default()
            .with_separator(self.separator)
            .with_missing_is_null(true);

        let result = CsvReadOptions::default()
            .with_parse_options(parse_options)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish();

        match result {
            Ok(df) => {
                log::debug!("Read CSV with shape {:?}", df.shape());
                Ok(RawTable::new(drop_blank_rows(df)?))
            }
            Err(PolarsError::NoData(_)) => Err(DashboardError::EmptyDataset),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a CSV file from disk.
    pub fn read_path(&self, path: &Path) -> Result<RawTable> {
        let bytes = fs::read(path)?;
        log::info!("Reading {} ({} bytes)", path.display(), bytes.len());
        self.read_bytes(&bytes)
    }
}

/// Remove rows where every cell is null, as produced by blank lines.
fn drop_blank_rows(df: DataFrame) -> Result<DataFrame> {
    let mut keep = BooleanChunked::full("keep".into(), false, df.height());
    for column in df.get_columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }

    let kept = df.filter(&keep)?;
    if kept.height() < df.height() {
        log::debug!("Dropped {} blank rows", df.height() - kept.height());
    }
    Ok(kept)
}

/// Check that the table has rows and carries every required column.
///
/// Fails with `EmptyDataset` before looking at columns, so an empty upload
/// never reaches aggregation.
pub fn validate(table: RawTable) -> Result<RawTable> {
    if table.height() == 0 {
        return Err(DashboardError::EmptyDataset);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::MissingColumns { missing });
    }

    log::info!(
        "Validated {} rows, {} columns",
        table.height(),
        table.columns().len()
    );
    Ok(table)
}

//! Error types for the sales pipeline.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("The uploaded file is empty. Please upload a valid CSV file.")]
    EmptyDataset,
    #[error("Missing columns: {}. Please upload a valid file.", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("No data available for the selected filters. Please adjust your filters.")]
    NoDataAfterFilter,
    #[error("Not enough data to generate a forecast: {months} month(s) of history, at least {required} required")]
    InsufficientHistory { months: usize, required: usize },
    #[error("No dataset loaded")]
    NoDataset,
    #[error("The uploaded file has no '{column}' column")]
    ColumnUnavailable { column: &'static str },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl DashboardError {
    /// Validation errors abort the whole pipeline and are shown verbatim.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DashboardError::EmptyDataset | DashboardError::MissingColumns { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_names() {
        let err = DashboardError::MissingColumns {
            missing: vec!["Sales".to_string(), "Quantity".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing columns: Sales, Quantity. Please upload a valid file."
        );
        assert!(err.is_validation());
    }

    #[test]
    fn filter_emptiness_is_recoverable() {
        assert!(!DashboardError::NoDataAfterFilter.is_validation());
        assert!(!DashboardError::InsufficientHistory { months: 3, required: 6 }.is_validation());
    }
}

//! Product summary export
//! Writes per-product sales and profit totals as CSV.

use crate::data::model::PRODUCT;
use crate::data::{Dimension, FilteredView};
use crate::error::{DashboardError, Result};
use crate::stats::{AggregateSummary, Aggregator, Measure, SummaryOrder};
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Per-product Sales and Profit, highest sales first.
///
/// Unavailable when the file has no product column.
pub fn product_summary(view: &FilteredView<'_>) -> Result<AggregateSummary> {
    if !view.dataset().has_dimension(Dimension::Product) {
        return Err(DashboardError::ColumnUnavailable { column: PRODUCT });
    }
    Aggregator::group_by(
        view,
        Dimension::Product,
        &[Measure::Sales, Measure::Profit],
        SummaryOrder::ByPrimaryDescending,
    )
}

/// Build the export frame: `Product,Sales,Profit`.
pub fn summary_frame(summary: &AggregateSummary) -> Result<DataFrame> {
    let names: Vec<String> = summary.rows.iter().map(|r| r.key.clone()).collect();
    let column = |measure: Measure| -> Vec<f64> {
        summary
            .rows
            .iter()
            .map(|r| summary.value(r, measure).unwrap_or(0.0))
            .collect()
    };

    let df = DataFrame::new(vec![
        Column::new(PRODUCT.into(), names),
        Column::new("Sales".into(), column(Measure::Sales)),
        Column::new("Profit".into(), column(Measure::Profit)),
    ])?;
    Ok(df)
}

/// Encode the product summary of a view as CSV bytes.
pub fn product_summary_csv(view: &FilteredView<'_>) -> Result<Vec<u8>> {
    let summary = product_summary(view)?;
    let mut df = summary_frame(&summary)?;

    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)?;

    log::debug!("Encoded product summary: {} rows, {} bytes", df.height(), buf.len());
    Ok(buf)
}

/// Write the product summary of a view to a CSV file.
pub fn write_product_summary(path: &Path, view: &FilteredView<'_>) -> Result<()> {
    let bytes = product_summary_csv(view)?;
    fs::write(path, bytes)?;
    log::info!("Wrote product summary to {}", path.display());
    Ok(())
}

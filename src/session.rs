//! Dashboard session
//! Owns the uploaded dataset and the active filters for one user session.

use crate::data::{
    validate, CoercionReport, DataLoader, DataProcessor, Dataset, Dimension, FilterCriteria,
    FilteredView,
};
use crate::error::{DashboardError, Result};
use crate::export;
use crate::settings::DashboardSettings;
use crate::stats::{
    AggregateSummary, Aggregator, CorrelationMatrix, ForecastSeries, Forecaster, Measure, Rollup,
    SalesProfitPoint, StatsCalculator, SummaryOrder,
};
use serde::Serialize;
use std::path::Path;

/// Read, validate and normalise an uploaded CSV.
pub fn load_dataset(bytes: &[u8], settings: &DashboardSettings) -> Result<Dataset> {
    let table = DataLoader::new(settings.separator_byte()).read_bytes(bytes)?;
    let table = validate(table)?;
    DataProcessor::normalize(&table, &settings.extra_date_formats)
}

/// Forecast result scoped to the forecast panel; other outputs do not
/// depend on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Ready(ForecastSeries),
    Unavailable { reason: String },
}

impl ForecastOutcome {
    pub fn series(&self) -> Option<&ForecastSeries> {
        match self {
            ForecastOutcome::Ready(series) => Some(series),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }
}

/// Everything the presentation surface renders for the current filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub row_count: usize,
    pub metrics: Rollup,
    /// Monthly Sales and Profit, chronological.
    pub monthly_trend: AggregateSummary,
    /// Sales, Profit and Quantity per product, highest sales first.
    pub products: Option<AggregateSummary>,
    pub top_products: Option<AggregateSummary>,
    pub regions: Option<AggregateSummary>,
    pub top_customers: Option<AggregateSummary>,
    pub correlation: CorrelationMatrix,
    /// Sales against Profit per row, with the category for colouring.
    pub sales_vs_profit: Vec<SalesProfitPoint>,
    pub forecast: ForecastOutcome,
    pub coercion: CoercionReport,
}

impl DashboardSnapshot {
    /// Compute every output for a filtered view.
    pub fn build(view: &FilteredView<'_>, settings: &DashboardSettings) -> Result<Self> {
        if view.is_empty() {
            log::warn!("No data available for the selected filters");
            return Err(DashboardError::NoDataAfterFilter);
        }

        let dataset = view.dataset();
        let products = ranked(view, Dimension::Product, &Measure::ALL)?;
        let top_products = products.as_ref().map(|s| s.head(settings.top_n));
        let regions = ranked(view, Dimension::Region, &[Measure::Sales, Measure::Profit])?;
        let top_customers = ranked(view, Dimension::Customer, &[Measure::Sales, Measure::Profit])?
            .map(|s| s.head(settings.top_n));

        let forecast = match Forecaster::forecast(view) {
            Ok(series) => ForecastOutcome::Ready(series),
            Err(err @ DashboardError::InsufficientHistory { .. }) => {
                log::warn!("{err}");
                ForecastOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            row_count: view.len(),
            metrics: Aggregator::rollup(view)?,
            monthly_trend: Aggregator::group_by(
                view,
                Dimension::Month,
                &[Measure::Sales, Measure::Profit],
                SummaryOrder::ByDimension,
            )?,
            products,
            top_products,
            regions,
            top_customers,
            correlation: StatsCalculator::correlation_matrix(view),
            sales_vs_profit: StatsCalculator::sales_profit_points(view),
            forecast,
            coercion: dataset.coercion,
        })
    }
}

/// Ranked summary for an optional dimension; `None` when the file lacks it.
fn ranked(
    view: &FilteredView<'_>,
    dimension: Dimension,
    measures: &[Measure],
) -> Result<Option<AggregateSummary>> {
    if !view.dataset().has_dimension(dimension) {
        return Ok(None);
    }
    Aggregator::group_by(view, dimension, measures, SummaryOrder::ByPrimaryDescending).map(Some)
}

/// Per-session state: created empty, filled on upload, replaced on
/// re-upload, dropped when the session ends.
#[derive(Debug, Default)]
pub struct DashboardSession {
    settings: DashboardSettings,
    dataset: Option<Dataset>,
    criteria: FilterCriteria,
}

impl DashboardSession {
    pub fn new(settings: DashboardSettings) -> Self {
        Self {
            settings,
            dataset: None,
            criteria: FilterCriteria::default(),
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Replace the dataset with a new upload and reset the filters.
    ///
    /// On failure the session is left without a dataset.
    pub fn load_csv_bytes(&mut self, bytes: &[u8]) -> Result<&Dataset> {
        self.end();
        let dataset = load_dataset(bytes, &self.settings)?;
        log::info!(
            "Session loaded {} rows ({} columns)",
            dataset.len(),
            dataset.columns.len()
        );
        Ok(self.dataset.insert(dataset))
    }

    pub fn load_csv_path(&mut self, path: &Path) -> Result<&Dataset> {
        self.end();
        let bytes = std::fs::read(path)?;
        log::info!("Loading {}", path.display());
        self.load_csv_bytes(&bytes)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        log::debug!("Filters changed: {criteria:?}");
        self.criteria = criteria;
    }

    /// The dataset narrowed by the current filters.
    pub fn view(&self) -> Result<FilteredView<'_>> {
        let dataset = self.dataset.as_ref().ok_or(DashboardError::NoDataset)?;
        Ok(self.criteria.apply(dataset))
    }

    /// Recompute every dashboard output for the current filters.
    pub fn snapshot(&self) -> Result<DashboardSnapshot> {
        DashboardSnapshot::build(&self.view()?, &self.settings)
    }

    /// CSV bytes of the product summary for the current filters.
    pub fn export_product_summary(&self) -> Result<Vec<u8>> {
        let view = self.view()?;
        if view.is_empty() {
            return Err(DashboardError::NoDataAfterFilter);
        }
        export::product_summary_csv(&view)
    }

    /// Drop the dataset and filters.
    pub fn end(&mut self) {
        if self.dataset.take().is_some() {
            log::debug!("Session dataset discarded");
        }
        self.criteria = FilterCriteria::default();
    }
}

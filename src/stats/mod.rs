//! Stats module - aggregation, correlation and forecasting

pub mod aggregator;
pub mod calculator;
pub mod forecast;
pub mod optimizer;

pub use aggregator::{AggregateSummary, Aggregator, GroupRow, Measure, Rollup, SummaryOrder, TOP_N};
pub use calculator::{CorrelationMatrix, SalesProfitPoint, StatsCalculator};
pub use forecast::{
    ForecastAdvisory, ForecastModel, ForecastSeries, Forecaster, MonthlyPoint, SmoothingParams,
    FORECAST_HORIZON,
};

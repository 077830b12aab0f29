//! Sales forecasting with exponential smoothing.
//!
//! The model family is chosen from the length of the monthly history:
//! - `>= 24` months: additive trend + additive seasonality (period 12)
//! - `>= 6` months: additive trend only, flagged as reduced confidence
//! - fewer: no forecast
//!
//! Smoothing parameters are fitted by minimising the one-step-ahead SSE.

use crate::data::{FilteredView, MonthKey};
use crate::error::{DashboardError, Result};
use crate::stats::optimizer::{minimize_unit_box, MinimizeOptions};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of future months produced by every forecast.
pub const FORECAST_HORIZON: usize = 6;
/// Seasonal period in months.
pub const SEASONAL_PERIOD: usize = 12;
/// History needed for a seasonal model (two full seasons).
pub const MIN_SEASONAL_HISTORY: usize = 2 * SEASONAL_PERIOD;
/// History needed for any forecast.
pub const MIN_HISTORY: usize = 6;

/// Total sales in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub sales: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastModel {
    /// Additive trend, additive seasonality.
    HoltWinters { period: usize },
    /// Additive trend, no seasonality.
    HoltLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastAdvisory {
    /// Not enough history for a seasonal decomposition.
    ReducedConfidence,
}

/// Fitted smoothing weights, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub model: ForecastModel,
    pub advisory: Option<ForecastAdvisory>,
    pub params: SmoothingParams,
    /// In-sample one-step-ahead sum of squared errors.
    pub sse: f64,
    pub history_months: usize,
    pub points: Vec<MonthlyPoint>,
}

pub struct Forecaster;

impl Forecaster {
    /// Resample the view to one sales total per month, min..max month, with
    /// empty months filled with zero. Rows without a date are skipped.
    pub fn monthly_sales(view: &FilteredView<'_>) -> Vec<MonthlyPoint> {
        let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
        for record in view.records() {
            if let Some(month) = record.month {
                *totals.entry(month).or_insert(0.0) += record.sales.unwrap_or(0.0);
            }
        }

        let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
            return Vec::new();
        };

        let mut series = Vec::with_capacity(first.months_until(last) as usize + 1);
        let mut month = first;
        loop {
            series.push(MonthlyPoint {
                month,
                sales: totals.get(&month).copied().unwrap_or(0.0),
            });
            if month == last {
                break;
            }
            month = month.next();
        }
        series
    }

    /// Pick the model family for a history of `months` points.
    pub fn select_model(months: usize) -> Result<ForecastModel> {
        if months >= MIN_SEASONAL_HISTORY {
            Ok(ForecastModel::HoltWinters {
                period: SEASONAL_PERIOD,
            })
        } else if months >= MIN_HISTORY {
            Ok(ForecastModel::HoltLinear)
        } else {
            Err(DashboardError::InsufficientHistory {
                months,
                required: MIN_HISTORY,
            })
        }
    }

    /// Forecast the next six months of sales for a filtered view.
    pub fn forecast(view: &FilteredView<'_>) -> Result<ForecastSeries> {
        if view.is_empty() {
            return Err(DashboardError::NoDataAfterFilter);
        }
        Self::forecast_history(&Self::monthly_sales(view))
    }

    /// Forecast from an already resampled, gapless monthly history.
    pub fn forecast_history(history: &[MonthlyPoint]) -> Result<ForecastSeries> {
        let model = Self::select_model(history.len())?;
        let y: Vec<f64> = history.iter().map(|p| p.sales).collect();
        let opts = MinimizeOptions::default();

        let (params, sse, values) = match model {
            ForecastModel::HoltLinear => {
                let best = minimize_unit_box(|p| holt(&y, p[0], p[1]).sse, 2, &opts);
                let fit = holt(&y, best.x[0], best.x[1]);
                let params = SmoothingParams {
                    alpha: best.x[0],
                    beta: best.x[1],
                    gamma: None,
                };
                (params, fit.sse, fit.project(FORECAST_HORIZON))
            }
            ForecastModel::HoltWinters { period } => {
                let best = minimize_unit_box(
                    |p| holt_winters(&y, period, p[0], p[1], p[2]).sse,
                    3,
                    &opts,
                );
                let fit = holt_winters(&y, period, best.x[0], best.x[1], best.x[2]);
                let params = SmoothingParams {
                    alpha: best.x[0],
                    beta: best.x[1],
                    gamma: Some(best.x[2]),
                };
                (params, fit.sse, fit.project(FORECAST_HORIZON))
            }
        };

        let advisory = match model {
            ForecastModel::HoltLinear => {
                log::warn!(
                    "Using non-seasonal forecasting: {} month(s) of history, {} needed for seasonality",
                    history.len(),
                    MIN_SEASONAL_HISTORY
                );
                Some(ForecastAdvisory::ReducedConfidence)
            }
            ForecastModel::HoltWinters { .. } => None,
        };

        let mut month = history
            .last()
            .map(|p| p.month)
            .ok_or(DashboardError::InsufficientHistory {
                months: 0,
                required: MIN_HISTORY,
            })?;
        let points = values
            .into_iter()
            .map(|sales| {
                month = month.next();
                MonthlyPoint { month, sales }
            })
            .collect();

        log::debug!(
            "Fitted {:?} on {} months: alpha={:.3} beta={:.3} gamma={:?} sse={:.3}",
            model,
            history.len(),
            params.alpha,
            params.beta,
            params.gamma,
            sse
        );

        Ok(ForecastSeries {
            model,
            advisory,
            params,
            sse,
            history_months: history.len(),
            points,
        })
    }
}

// ---------------------------------------------------------------------------
// Smoothing recursions
// ---------------------------------------------------------------------------

/// Final state of a smoothing pass.
#[derive(Debug, Clone)]
struct Fit {
    level: f64,
    trend: f64,
    /// Seasonal indices, index 0 = season of the first forecast month.
    /// Empty for Holt.
    seasonals: Vec<f64>,
    sse: f64,
}

impl Fit {
    fn project(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| {
                let season = if self.seasonals.is_empty() {
                    0.0
                } else {
                    self.seasonals[(h - 1) % self.seasonals.len()]
                };
                self.level + h as f64 * self.trend + season
            })
            .collect()
    }
}

/// Holt's linear method. The first two points seed level and trend.
fn holt(y: &[f64], alpha: f64, beta: f64) -> Fit {
    let mut level = y[0];
    let mut trend = y[1] - y[0];
    let mut sse = 0.0;

    for &obs in &y[1..] {
        let predicted = level + trend;
        sse += (obs - predicted).powi(2);
        let prev_level = level;
        level = alpha * obs + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }

    Fit {
        level,
        trend,
        seasonals: Vec::new(),
        sse,
    }
}

/// Additive Holt-Winters. Initial state from the first two seasons: trend is
/// the per-month change between season means, seasonals are the detrended
/// first-season deviations.
fn holt_winters(y: &[f64], period: usize, alpha: f64, beta: f64, gamma: f64) -> Fit {
    let m = period as f64;
    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let first = mean(&y[..period]);
    let second = mean(&y[period..2 * period]);

    let mut trend = (second - first) / m;
    let mid = (m - 1.0) / 2.0;
    let mut level = first - trend * (mid + 1.0);
    let mut seasonals: Vec<f64> = y[..period]
        .iter()
        .enumerate()
        .map(|(i, &obs)| obs - (first + trend * (i as f64 - mid)))
        .collect();

    let mut sse = 0.0;
    for (t, &obs) in y.iter().enumerate() {
        let s = seasonals[t % period];
        let predicted = level + trend + s;
        sse += (obs - predicted).powi(2);

        let prev_level = level;
        let prev_trend = trend;
        level = alpha * (obs - s) + (1.0 - alpha) * (prev_level + prev_trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * prev_trend;
        seasonals[t % period] = gamma * (obs - prev_level - prev_trend) + (1.0 - gamma) * s;
    }

    // Rotate so index 0 is the season of the first forecast month.
    let start = y.len() % period;
    seasonals.rotate_left(start);

    Fit {
        level,
        trend,
        seasonals,
        sse,
    }
}

//! Statistics Calculator Module
//! Pairwise correlation between the numeric sales measures, and the raw
//! Sales/Profit pairs behind it.

use crate::data::FilteredView;
use crate::stats::aggregator::Measure;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Pearson correlation matrix over Sales, Profit and Quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub measures: Vec<Measure>,
    /// `cells[i][j]` correlates `measures[i]` with `measures[j]`; `None`
    /// when it is undefined (fewer than two pairs or a constant column).
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Measure, b: Measure) -> Option<f64> {
        let i = self.measures.iter().position(|m| *m == a)?;
        let j = self.measures.iter().position(|m| *m == b)?;
        self.cells[i][j]
    }
}

/// One row of the Sales vs Profit scatter, coloured by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesProfitPoint {
    pub sales: f64,
    pub profit: f64,
    pub category: Option<String>,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Pearson correlation of two equally long samples.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }

        let sx = x.std_dev();
        let sy = y.std_dev();
        if !(sx > 0.0 && sy > 0.0) {
            return None;
        }

        let r = x.covariance(y) / (sx * sy);
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    /// Correlate every pair of measures using rows where both are present.
    pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
        let measures = Measure::ALL.to_vec();
        let cells = measures
            .iter()
            .map(|&a| {
                measures
                    .iter()
                    .map(|&b| {
                        let (x, y): (Vec<f64>, Vec<f64>) = view
                            .records()
                            .filter_map(|r| Some((a.value(r)?, b.value(r)?)))
                            .unzip();
                        Self::pearson(&x, &y)
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix { measures, cells }
    }

    /// Sales and Profit of every row where both are present, in view order.
    pub fn sales_profit_points(view: &FilteredView<'_>) -> Vec<SalesProfitPoint> {
        view.records()
            .filter_map(|r| {
                Some(SalesProfitPoint {
                    sales: r.sales?,
                    profit: r.profit?,
                    category: r.category.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CoercionReport, Dataset, Record};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pearson_detects_linear_relations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!(close(StatsCalculator::pearson(&x, &up).unwrap(), 1.0));
        assert!(close(StatsCalculator::pearson(&x, &down).unwrap(), -1.0));
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(StatsCalculator::pearson(&[1.0], &[2.0]), None);
        assert_eq!(StatsCalculator::pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(StatsCalculator::pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn scatter_skips_incomplete_rows() {
        let row = |s: Option<f64>, p: Option<f64>, c: Option<&str>| Record {
            sales: s,
            profit: p,
            category: c.map(str::to_string),
            ..Default::default()
        };
        let ds = Dataset::new(
            vec![
                row(Some(10.0), Some(2.0), Some("Tech")),
                row(Some(20.0), None, Some("Tech")),
                row(None, Some(1.0), Some("Office")),
                row(Some(5.0), Some(-1.0), None),
            ],
            Vec::new(),
            CoercionReport::default(),
        );
        let points = StatsCalculator::sales_profit_points(&FilteredView::all(&ds));

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].category.as_deref(), Some("Tech"));
        assert_eq!((points[1].sales, points[1].profit), (5.0, -1.0));
        assert_eq!(points[1].category, None);
    }

    #[test]
    fn matrix_uses_pairwise_complete_rows() {
        let row = |s: Option<f64>, p: Option<f64>, q: Option<i64>| Record {
            sales: s,
            profit: p,
            quantity: q,
            ..Default::default()
        };
        let ds = Dataset::new(
            vec![
                row(Some(10.0), Some(1.0), Some(1)),
                row(Some(20.0), Some(2.0), Some(3)),
                row(Some(30.0), None, Some(2)),
                row(Some(40.0), Some(4.0), None),
            ],
            Vec::new(),
            CoercionReport::default(),
        );
        let matrix = StatsCalculator::correlation_matrix(&FilteredView::all(&ds));

        assert!(close(matrix.get(Measure::Sales, Measure::Sales).unwrap(), 1.0));
        assert!(close(matrix.get(Measure::Sales, Measure::Profit).unwrap(), 1.0));
        assert_eq!(
            matrix.get(Measure::Sales, Measure::Quantity),
            matrix.get(Measure::Quantity, Measure::Sales)
        );
    }
}

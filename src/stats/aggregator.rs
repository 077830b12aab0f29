//! Aggregator Module
//! Groups filtered rows by a dimension and sums the requested measures.

use crate::data::model::{Dimension, Record, ORDER_ID};
use crate::data::FilteredView;
use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Number of entries shown in "top" tables.
pub const TOP_N: usize = 10;

/// A summable measure of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Measure {
    Sales,
    Profit,
    Quantity,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Sales, Measure::Profit, Measure::Quantity];

    /// Value of this measure for a record; nulls contribute nothing.
    pub fn of(self, record: &Record) -> f64 {
        match self {
            Measure::Sales => record.sales.unwrap_or(0.0),
            Measure::Profit => record.profit.unwrap_or(0.0),
            Measure::Quantity => record.quantity.unwrap_or(0) as f64,
        }
    }

    /// The raw, possibly missing value.
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            Measure::Sales => record.sales,
            Measure::Profit => record.profit,
            Measure::Quantity => record.quantity.map(|q| q as f64),
        }
    }
}

/// Row ordering of an aggregate summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SummaryOrder {
    /// Ascending by group key (chronological for months).
    ByDimension,
    /// Descending by the primary (first) measure, ties by key ascending.
    ByPrimaryDescending,
}

/// Summed measures for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    /// One total per requested measure, in request order.
    pub values: Vec<f64>,
}

/// Per-dimension summed measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub dimension: Dimension,
    pub measures: Vec<Measure>,
    pub order: SummaryOrder,
    pub rows: Vec<GroupRow>,
}

impl AggregateSummary {
    fn measure_index(&self, measure: Measure) -> Option<usize> {
        self.measures.iter().position(|m| *m == measure)
    }

    /// Total of `measure` for one row, if the measure was requested.
    pub fn value(&self, row: &GroupRow, measure: Measure) -> Option<f64> {
        self.measure_index(measure).map(|i| row.values[i])
    }

    /// Look up a group by key.
    pub fn get(&self, key: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Sum of a measure over all groups.
    pub fn total(&self, measure: Measure) -> Option<f64> {
        let i = self.measure_index(measure)?;
        Some(self.rows.iter().map(|r| r.values[i]).sum())
    }

    /// First `n` rows in the current order. The summary itself is untouched.
    pub fn top(&self, n: usize) -> &[GroupRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// A copy truncated to the first `n` rows.
    pub fn head(&self, n: usize) -> AggregateSummary {
        AggregateSummary {
            rows: self.top(n).to_vec(),
            ..self.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whole-view scalar metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rollup {
    pub total_sales: f64,
    pub total_profit: f64,
    /// Distinct order ids, or the row count when the file has no `Order ID`.
    pub total_orders: usize,
}

/// Group-by and rollup computations over a filtered view.
pub struct Aggregator;

impl Aggregator {
    /// Group rows by `dimension` and sum `measures` per group.
    ///
    /// Rows without a key (null month, missing text) are left out of the
    /// grouping.
    pub fn group_by(
        view: &FilteredView<'_>,
        dimension: Dimension,
        measures: &[Measure],
        order: SummaryOrder,
    ) -> Result<AggregateSummary> {
        if view.is_empty() {
            return Err(DashboardError::NoDataAfterFilter);
        }

        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in view.records() {
            let Some(key) = record.key(dimension) else {
                continue;
            };
            let totals = groups
                .entry(key)
                .or_insert_with(|| vec![0.0; measures.len()]);
            for (total, measure) in totals.iter_mut().zip(measures) {
                *total += measure.of(record);
            }
        }

        let mut rows: Vec<GroupRow> = groups
            .into_iter()
            .map(|(key, values)| GroupRow { key, values })
            .collect();

        if order == SummaryOrder::ByPrimaryDescending {
            sort_by_primary_desc(&mut rows);
        }

        log::debug!(
            "Grouped {} rows by {:?} into {} groups",
            view.len(),
            dimension,
            rows.len()
        );

        Ok(AggregateSummary {
            dimension,
            measures: measures.to_vec(),
            order,
            rows,
        })
    }

    /// Total sales, total profit and order count over the whole view.
    pub fn rollup(view: &FilteredView<'_>) -> Result<Rollup> {
        if view.is_empty() {
            return Err(DashboardError::NoDataAfterFilter);
        }

        let total_sales = view.records().map(|r| Measure::Sales.of(r)).sum();
        let total_profit = view.records().map(|r| Measure::Profit.of(r)).sum();
        let total_orders = if view.dataset().has_column(ORDER_ID) {
            view.records()
                .filter_map(|r| r.order_id.as_deref())
                .collect::<HashSet<_>>()
                .len()
        } else {
            view.len()
        };

        Ok(Rollup {
            total_sales,
            total_profit,
            total_orders,
        })
    }
}

/// Descending by the first value, ties by key ascending. Rows start in key
/// order, so the result is the same on every call.
fn sort_by_primary_desc(rows: &mut [GroupRow]) {
    rows.sort_by(|a, b| {
        let primary = match (a.values.first(), b.values.first()) {
            (Some(x), Some(y)) => y.total_cmp(x),
            _ => Ordering::Equal,
        };
        primary.then_with(|| a.key.cmp(&b.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CoercionReport, Dataset, MonthKey, PRODUCT};
    use crate::data::FilterCriteria;
    use chrono::NaiveDate;

    fn sale(product: &str, month: u32, sales: f64, profit: Option<f64>, qty: i64) -> Record {
        let date = NaiveDate::from_ymd_opt(2024, month, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Record {
            order_date: Some(date),
            month: Some(MonthKey::new(2024, month)),
            sales: Some(sales),
            profit,
            quantity: Some(qty),
            product: Some(product.to_string()),
            ..Default::default()
        }
    }

    fn dataset(records: Vec<Record>, columns: &[&str]) -> Dataset {
        Dataset::new(
            records,
            columns.iter().map(|c| c.to_string()).collect(),
            CoercionReport::default(),
        )
    }

    #[test]
    fn sums_per_group_treating_null_as_zero() {
        let ds = dataset(
            vec![
                sale("Desk", 1, 100.0, Some(10.0), 1),
                sale("Desk", 2, 50.0, None, 2),
                sale("Lamp", 1, 30.0, Some(3.0), 3),
            ],
            &[PRODUCT],
        );
        let view = FilteredView::all(&ds);
        let summary =
            Aggregator::group_by(&view, Dimension::Product, &Measure::ALL, SummaryOrder::ByDimension)
                .unwrap();

        let desk = summary.get("Desk").unwrap();
        assert_eq!(desk.values, vec![150.0, 10.0, 3.0]);
        assert_eq!(summary.value(desk, Measure::Profit), Some(10.0));
        assert_eq!(summary.total(Measure::Sales), Some(180.0));
    }

    #[test]
    fn months_are_chronological() {
        let ds = dataset(
            vec![
                sale("A", 12, 1.0, None, 1),
                sale("A", 2, 1.0, None, 1),
                Record::default(),
                sale("A", 10, 1.0, None, 1),
            ],
            &[],
        );
        let view = FilteredView::all(&ds);
        let summary =
            Aggregator::group_by(&view, Dimension::Month, &[Measure::Sales], SummaryOrder::ByDimension)
                .unwrap();
        let keys: Vec<&str> = summary.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-02", "2024-10", "2024-12"]);
    }

    #[test]
    fn top_n_orders_by_sales_then_name() {
        let ds = dataset(
            vec![
                sale("Chair", 1, 50.0, None, 1),
                sale("Bed", 1, 50.0, None, 1),
                sale("Sofa", 1, 90.0, None, 1),
                sale("Art", 1, 10.0, None, 1),
            ],
            &[PRODUCT],
        );
        let view = FilteredView::all(&ds);
        let summary = Aggregator::group_by(
            &view,
            Dimension::Product,
            &[Measure::Sales, Measure::Profit],
            SummaryOrder::ByPrimaryDescending,
        )
        .unwrap();

        let top: Vec<&str> = summary.top(3).iter().map(|r| r.key.as_str()).collect();
        assert_eq!(top, vec!["Sofa", "Bed", "Chair"]);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary.head(2).len(), 2);
        assert_eq!(summary.top(TOP_N).len(), 4);
    }

    #[test]
    fn rollup_counts_rows_without_order_id() {
        let ds = dataset(
            vec![
                sale("A", 1, 100.0, Some(20.0), 1),
                sale("B", 2, 200.0, Some(50.0), 2),
            ],
            &[],
        );
        let rollup = Aggregator::rollup(&FilteredView::all(&ds)).unwrap();
        assert_eq!(rollup.total_sales, 300.0);
        assert_eq!(rollup.total_profit, 70.0);
        assert_eq!(rollup.total_orders, 2);
    }

    #[test]
    fn rollup_counts_distinct_order_ids() {
        let mut records = vec![
            sale("A", 1, 1.0, None, 1),
            sale("B", 1, 1.0, None, 1),
            sale("C", 1, 1.0, None, 1),
        ];
        records[0].order_id = Some("O-1".to_string());
        records[1].order_id = Some("O-1".to_string());
        let ds = dataset(records, &[ORDER_ID]);
        let rollup = Aggregator::rollup(&FilteredView::all(&ds)).unwrap();
        assert_eq!(rollup.total_orders, 1);
    }

    #[test]
    fn empty_view_short_circuits() {
        let ds = dataset(vec![sale("A", 1, 1.0, None, 1)], &[PRODUCT]);
        let view = FilterCriteria::default().with_product_search("zzz").apply(&ds);
        assert!(matches!(
            Aggregator::rollup(&view),
            Err(DashboardError::NoDataAfterFilter)
        ));
        assert!(matches!(
            Aggregator::group_by(&view, Dimension::Product, &[Measure::Sales], SummaryOrder::ByDimension),
            Err(DashboardError::NoDataAfterFilter)
        ));
    }
}

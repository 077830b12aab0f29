//! Core sales types: normalised records, the dataset and month buckets.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

pub const ORDER_DATE: &str = "Order Date";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";
pub const QUANTITY: &str = "Quantity";
pub const CUSTOMER_NAME: &str = "Customer Name";
pub const PRODUCT: &str = "Product";
pub const REGION: &str = "Region";
pub const CATEGORY: &str = "Category";
pub const ORDER_ID: &str = "Order ID";

/// Columns every uploaded file must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 4] = [ORDER_DATE, SALES, PROFIT, QUANTITY];

// ---------------------------------------------------------------------------
// MonthKey
// ---------------------------------------------------------------------------

/// Year-month bucket derived from an order date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The calendar month immediately after this one.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Months from `self` to `other`; negative when `other` is earlier.
    pub fn months_until(self, other: MonthKey) -> i64 {
        (other.year as i64 - self.year as i64) * 12 + (other.month as i64 - self.month as i64)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

/// A grouping / filtering dimension of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Month,
    Product,
    Region,
    Customer,
    Category,
}

impl Dimension {
    /// Source column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Month => ORDER_DATE,
            Dimension::Product => PRODUCT,
            Dimension::Region => REGION,
            Dimension::Customer => CUSTOMER_NAME,
            Dimension::Category => CATEGORY,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One normalised transaction row. Every field is optional after coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub order_date: Option<NaiveDateTime>,
    pub sales: Option<f64>,
    pub profit: Option<f64>,
    pub quantity: Option<i64>,
    pub customer_name: Option<String>,
    pub product: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub order_id: Option<String>,
    pub month: Option<MonthKey>,
}

impl Record {
    /// Group key for a dimension, `None` when the value is missing.
    pub fn key(&self, dimension: Dimension) -> Option<String> {
        match dimension {
            Dimension::Month => self.month.map(|m| m.to_string()),
            _ => self.text(dimension).map(str::to_string),
        }
    }

    /// Free-text value of a dimension field.
    pub fn text(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Month => None,
            Dimension::Product => self.product.as_deref(),
            Dimension::Region => self.region.as_deref(),
            Dimension::Customer => self.customer_name.as_deref(),
            Dimension::Category => self.category.as_deref(),
        }
    }

    pub fn order_day(&self) -> Option<NaiveDate> {
        self.order_date.map(|d| d.date())
    }
}

// ---------------------------------------------------------------------------
// CoercionReport
// ---------------------------------------------------------------------------

/// Count of non-empty values that failed to parse and were nulled, per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    pub order_date: usize,
    pub sales: usize,
    pub profit: usize,
    pub quantity: usize,
}

impl CoercionReport {
    pub fn total(&self) -> usize {
        self.order_date + self.sales + self.profit + self.quantity
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The full normalised dataset and the column schema found at load time.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
    pub coercion: CoercionReport,
}

impl Dataset {
    pub fn new(records: Vec<Record>, columns: Vec<String>, coercion: CoercionReport) -> Self {
        Self {
            records,
            columns,
            coercion,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source file carried the given column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        self.has_column(dimension.column())
    }

    /// Earliest and latest order date, used as the default date range.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut days = self.records.iter().filter_map(Record::order_day);
        let first = days.next()?;
        Some(days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Sorted distinct non-null values of a text dimension (filter options).
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|r| r.text(dimension))
            .collect();
        values.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn month_key_rolls_over_year() {
        let dec = MonthKey::new(2023, 12);
        assert_eq!(dec.next(), MonthKey::new(2024, 1));
        assert_eq!(dec.to_string(), "2023-12");
        assert_eq!(dec.months_until(MonthKey::new(2024, 3)), 3);
        assert!(MonthKey::new(2023, 12) < MonthKey::new(2024, 1));
    }

    #[test]
    fn date_bounds_skip_null_dates() {
        let records = vec![
            Record {
                order_date: Some(day(2024, 3, 1)),
                ..Default::default()
            },
            Record::default(),
            Record {
                order_date: Some(day(2023, 11, 20)),
                ..Default::default()
            },
        ];
        let ds = Dataset::new(records, Vec::new(), CoercionReport::default());
        let (lo, hi) = ds.date_bounds().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2023, 11, 20).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn distinct_values_sorted_without_nulls() {
        let records = ["West", "East", "West"]
            .iter()
            .map(|r| Record {
                region: Some(r.to_string()),
                ..Default::default()
            })
            .chain(std::iter::once(Record::default()))
            .collect();
        let ds = Dataset::new(records, vec![REGION.to_string()], CoercionReport::default());
        assert_eq!(ds.distinct_values(Dimension::Region), vec!["East", "West"]);
        assert!(ds.has_dimension(Dimension::Region));
        assert!(!ds.has_dimension(Dimension::Product));
    }
}

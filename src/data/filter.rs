//! Filter Engine
//! Narrows a dataset by date range, free-text search and set membership
//! without touching the underlying records.

use crate::data::model::{Dataset, Dimension, Record};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Active filters. The default value filters nothing.
///
/// Membership sets follow these rules:
/// * `None` → no constraint
/// * `Some(empty)` → nothing selected → every row fails
/// * column absent from the file → no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive calendar-date range on the order date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Case-insensitive substring searched in the customer name.
    pub customer_search: String,
    /// Case-insensitive substring searched in the product name.
    pub product_search: String,
    pub regions: Option<BTreeSet<String>>,
    pub categories: Option<BTreeSet<String>>,
}

impl FilterCriteria {
    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn with_customer_search(mut self, text: impl Into<String>) -> Self {
        self.customer_search = text.into();
        self
    }

    pub fn with_product_search(mut self, text: impl Into<String>) -> Self {
        self.product_search = text.into();
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Whether any criterion is active.
    pub fn is_active(&self) -> bool {
        self.date_range.is_some()
            || !self.customer_search.is_empty()
            || !self.product_search.is_empty()
            || self.regions.is_some()
            || self.categories.is_some()
    }

    /// Apply to a full dataset.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        FilteredView::all(dataset).refine(self)
    }

    fn compile(&self, dataset: &Dataset) -> CompiledFilter {
        let search = |text: &str, dimension: Dimension| {
            // Searched as typed; only the empty string disables the filter.
            (!text.is_empty()).then(|| Search {
                needle: text.to_lowercase(),
                column_present: dataset.has_dimension(dimension),
            })
        };
        let membership = |set: &Option<BTreeSet<String>>, dimension: Dimension| {
            set.as_ref()
                .filter(|_| dataset.has_dimension(dimension))
                .cloned()
        };

        CompiledFilter {
            date_range: self.date_range,
            customer: search(&self.customer_search, Dimension::Customer),
            product: search(&self.product_search, Dimension::Product),
            regions: membership(&self.regions, Dimension::Region),
            categories: membership(&self.categories, Dimension::Category),
        }
    }
}

struct Search {
    needle: String,
    column_present: bool,
}

impl Search {
    fn matches(&self, value: Option<&str>) -> bool {
        self.column_present
            && value.is_some_and(|v| v.to_lowercase().contains(&self.needle))
    }
}

/// Criteria resolved against a dataset's schema.
struct CompiledFilter {
    date_range: Option<(NaiveDate, NaiveDate)>,
    customer: Option<Search>,
    product: Option<Search>,
    regions: Option<BTreeSet<String>>,
    categories: Option<BTreeSet<String>>,
}

impl CompiledFilter {
    fn keep(&self, record: &Record) -> bool {
        if let Some((from, to)) = self.date_range {
            match record.order_day() {
                Some(day) if day >= from && day <= to => {}
                _ => return false,
            }
        }
        if let Some(search) = &self.customer {
            if !search.matches(record.customer_name.as_deref()) {
                return false;
            }
        }
        if let Some(search) = &self.product {
            if !search.matches(record.product.as_deref()) {
                return false;
            }
        }
        if !in_set(&self.regions, record.region.as_deref()) {
            return false;
        }
        in_set(&self.categories, record.category.as_deref())
    }
}

fn in_set(set: &Option<BTreeSet<String>>, value: Option<&str>) -> bool {
    match set {
        None => true,
        Some(selected) => value.is_some_and(|v| selected.contains(v)),
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Rows of a dataset that passed the active filters, in original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every row of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Narrow this view further. Applying the same criteria again is a no-op.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredView<'a> {
        let filter = criteria.compile(self.dataset);
        let indices: Vec<usize> = self
            .indices
            .iter()
            .copied()
            .filter(|&i| filter.keep(&self.dataset.records[i]))
            .collect();
        log::debug!(
            "Filter kept {} of {} rows",
            indices.len(),
            self.indices.len()
        );
        FilteredView {
            dataset: self.dataset,
            indices,
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CoercionReport, CATEGORY, CUSTOMER_NAME, PRODUCT, REGION};
    use chrono::NaiveDateTime;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(h, 0, 0))
    }

    fn record(date: Option<NaiveDateTime>, customer: &str, product: &str, region: &str) -> Record {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Record {
            order_date: date,
            sales: Some(1.0),
            customer_name: text(customer),
            product: text(product),
            region: text(region),
            category: Some("Tech".to_string()),
            ..Default::default()
        }
    }

    fn dataset() -> Dataset {
        let records = vec![
            record(at(2024, 1, 5, 0), "Alice Smith", "Laptop Pro", "East"),
            record(at(2024, 1, 31, 18), "Bob Jones", "Phone", "West"),
            record(None, "alice cooper", "Laptop Air", "East"),
            record(at(2024, 2, 10, 0), "", "Desk", ""),
        ];
        let columns = [CUSTOMER_NAME, PRODUCT, REGION, CATEGORY]
            .iter()
            .map(|c| c.to_string())
            .collect();
        Dataset::new(records, columns, CoercionReport::default())
    }

    #[test]
    fn default_criteria_keep_everything() {
        let ds = dataset();
        let criteria = FilterCriteria::default();
        assert!(!criteria.is_active());
        assert_eq!(criteria.apply(&ds).indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn date_range_is_inclusive_and_drops_null_dates() {
        let ds = dataset();
        let jan = FilterCriteria::default().with_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        // Row 1 is late on the last day and still included.
        assert_eq!(jan.apply(&ds).indices(), &[0, 1]);
    }

    #[test]
    fn search_is_case_insensitive_and_skips_nulls() {
        let ds = dataset();
        let alice = FilterCriteria::default().with_customer_search("ALICE");
        assert_eq!(alice.apply(&ds).indices(), &[0, 2]);

        let laptops = FilterCriteria::default().with_product_search("laptop");
        assert_eq!(laptops.apply(&ds).indices(), &[0, 2]);

        let nobody = FilterCriteria::default().with_customer_search("e");
        assert!(!nobody.apply(&ds).indices().contains(&3));
    }

    #[test]
    fn search_text_is_not_trimmed() {
        let ds = dataset();
        let spaced = FilterCriteria::default().with_customer_search(" ");
        assert!(spaced.is_active());
        assert_eq!(spaced.apply(&ds).indices(), &[0, 1, 2]);

        let padded = FilterCriteria::default().with_product_search(" laptop");
        assert!(padded.apply(&ds).is_empty());

        let whole = FilterCriteria::default().with_product_search("laptop ");
        assert_eq!(whole.apply(&ds).indices(), &[0, 2]);
    }

    #[test]
    fn membership_and_empty_selection() {
        let ds = dataset();
        let east = FilterCriteria::default().with_regions(["East"]);
        assert_eq!(east.apply(&ds).indices(), &[0, 2]);

        let none = FilterCriteria::default().with_regions(Vec::<String>::new());
        assert!(none.apply(&ds).is_empty());
    }

    #[test]
    fn membership_on_absent_column_is_noop() {
        let mut ds = dataset();
        ds.columns.retain(|c| c != REGION);
        let none = FilterCriteria::default().with_regions(Vec::<String>::new());
        assert_eq!(none.apply(&ds).len(), 4);
    }

    #[test]
    fn search_on_absent_column_matches_nothing() {
        let mut ds = dataset();
        ds.columns.retain(|c| c != CUSTOMER_NAME);
        let alice = FilterCriteria::default().with_customer_search("alice");
        assert!(alice.apply(&ds).is_empty());
    }

    #[test]
    fn criteria_combine_with_and() {
        let ds = dataset();
        let criteria = FilterCriteria::default()
            .with_customer_search("alice")
            .with_categories(["Tech"])
            .with_date_range(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            );
        assert_eq!(criteria.apply(&ds).indices(), &[0]);
    }

    #[test]
    fn refine_is_idempotent_and_leaves_dataset_alone() {
        let ds = dataset();
        let criteria = FilterCriteria::default().with_regions(["East", "West"]);
        let once = criteria.apply(&ds);
        let twice = once.refine(&criteria);
        assert_eq!(once.indices(), twice.indices());
        assert_eq!(ds.len(), 4);
    }
}

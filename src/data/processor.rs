//! Data Processor Module
//! Coerces raw text cells into typed sales records ("parse or null").

use crate::data::loader::RawTable;
use crate::data::model::{
    CoercionReport, Dataset, MonthKey, Record, CATEGORY, CUSTOMER_NAME, ORDER_DATE, ORDER_ID,
    PRODUCT, QUANTITY, REGION, SALES, PROFIT,
};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-time formats tried in order.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only formats tried in order, after the date-time ones.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse an order date. Unparseable input yields `None`, never an error.
pub fn parse_order_date(raw: &str, extra_formats: &[String]) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS.iter().copied().chain(extra_formats.iter().map(String::as_str)) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Parse a decimal amount. Non-finite values are treated as missing.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a quantity: an integer, or a float with no fractional part.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(q) = s.parse::<i64>() {
        return Some(q);
    }
    parse_decimal(s)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Coerce one cell, counting non-empty values that fail to parse.
fn coerce<T>(raw: Option<&str>, parse: impl Fn(&str) -> Option<T>, failures: &mut usize) -> Option<T> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    let parsed = parse(raw);
    if parsed.is_none() {
        *failures += 1;
    }
    parsed
}

/// Turns a validated raw table into a typed dataset.
pub struct DataProcessor;

impl DataProcessor {
    /// Normalise every row. Malformed cells become nulls and are tallied in
    /// the dataset's coercion report.
    pub fn normalize(table: &RawTable, extra_date_formats: &[String]) -> Result<Dataset> {
        let column = |name: &str| table.text_column(name);

        let order_date = column(ORDER_DATE)?;
        let sales = column(SALES)?;
        let profit = column(PROFIT)?;
        let quantity = column(QUANTITY)?;
        let customer = column(CUSTOMER_NAME)?;
        let product = column(PRODUCT)?;
        let region = column(REGION)?;
        let category = column(CATEGORY)?;
        let order_id = column(ORDER_ID)?;

        let order_date = text_values(order_date.as_ref())?;
        let sales = text_values(sales.as_ref())?;
        let profit = text_values(profit.as_ref())?;
        let quantity = text_values(quantity.as_ref())?;
        let customer = text_values(customer.as_ref())?;
        let product = text_values(product.as_ref())?;
        let region = text_values(region.as_ref())?;
        let category = text_values(category.as_ref())?;
        let order_id = text_values(order_id.as_ref())?;

        let mut report = CoercionReport::default();
        let mut records = Vec::with_capacity(table.height());

        for i in 0..table.height() {
            let date = coerce(
                cell(order_date, i),
                |s| parse_order_date(s, extra_date_formats),
                &mut report.order_date,
            );
            records.push(Record {
                order_date: date,
                sales: coerce(cell(sales, i), parse_decimal, &mut report.sales),
                profit: coerce(cell(profit, i), parse_decimal, &mut report.profit),
                quantity: coerce(cell(quantity, i), parse_quantity, &mut report.quantity),
                customer_name: clean_text(cell(customer, i)),
                product: clean_text(cell(product, i)),
                region: clean_text(cell(region, i)),
                category: clean_text(cell(category, i)),
                order_id: clean_text(cell(order_id, i)),
                month: date.map(|d| MonthKey::from_date(d.date())),
            });
        }

        if !report.is_clean() {
            log::warn!(
                "Coerced {} malformed value(s) to null (dates: {}, sales: {}, profit: {}, quantity: {})",
                report.total(),
                report.order_date,
                report.sales,
                report.profit,
                report.quantity
            );
        }

        Ok(Dataset::new(records, table.columns().to_vec(), report))
    }
}

fn cell(values: Option<&StringChunked>, i: usize) -> Option<&str> {
    values.and_then(|ca| ca.get(i))
}

fn text_values(series: Option<&Series>) -> Result<Option<&StringChunked>> {
    Ok(match series {
        Some(s) => Some(s.str()?),
        None => None,
    })
}

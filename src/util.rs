//! Calendar and arithmetic helpers shared by the analytics modules.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// Average days per month, used to express elapsed time in months.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Fractional days from `earlier` to `later`. Negative when reversed.
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 86_400.0
}

/// Fractional hours from `earlier` to `later`.
pub fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 3_600.0
}

/// `instant` moved back by `months` calendar months (day clamped to month end).
pub fn months_before(instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    instant
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `YYYY-MM` bucket key.
pub fn month_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m").to_string()
}

/// ISO week bucket key, e.g. `2025-W07`.
pub fn iso_week_key(instant: DateTime<Utc>) -> String {
    instant.format("%G-W%V").to_string()
}

/// Every calendar month from `first` to `last` inclusive, as (year, month).
/// Empty when `last` precedes `first`.
pub fn month_span(first: DateTime<Utc>, last: DateTime<Utc>) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (first.year(), first.month());
    let end = (last.year(), last.month());
    while (year, month) <= end {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Whole days from `today` until `date` (negative once passed).
pub fn days_until(today: NaiveDate, date: NaiveDate) -> i64 {
    (date - today).num_days()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median of `values`; the input does not need to be sorted.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Clamp a score into the 0–100 band.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Round to two decimals for presentation-stable output.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

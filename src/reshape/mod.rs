//! Merge two observation histories into one chronological trend table.
//!
//! The join is an inner join on `(year, period, periodName)`. Periods reported
//! by only one series are not errors; they are returned in the `JoinReport`
//! so the caller can decide whether to warn or fail.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::data::Observation;
use crate::domain::{JoinReport, MergedTrend, PeriodKey, TrendRow, TrendValue};
use crate::error::AppError;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Map a calendar month name to 1..=12. `series` names the data in errors.
///
/// Quarterly and annual period names (`Q1`, `Annual`, ...) are rejected.
pub fn month_number(series: &str, period_name: &str) -> Result<u32, AppError> {
    MONTHS
        .iter()
        .position(|m| *m == period_name)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| AppError::data_shape(series, format!("unrecognized period name '{period_name}'")))
}

fn key_of(obs: &Observation) -> PeriodKey {
    PeriodKey {
        year: obs.year.clone(),
        period: obs.period.clone(),
        period_name: obs.period_name.clone(),
    }
}

fn row_date(series: &str, key: &PeriodKey, month: u32) -> Result<NaiveDate, AppError> {
    let year: i32 = key
        .year
        .trim()
        .parse()
        .map_err(|_| AppError::data_shape(series, format!("invalid year '{}'", key.year)))?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::data_shape(series, format!("date out of range for {}", key.label())))
}

/// Inner-join two observation histories and sort the result by date.
pub fn merge_trends(
    left_label: &str,
    left: &[Observation],
    right_label: &str,
    right: &[Observation],
) -> Result<MergedTrend, AppError> {
    let right_by_key: HashMap<PeriodKey, &Observation> =
        right.iter().rev().map(|o| (key_of(o), o)).collect();
    let left_keys: HashSet<PeriodKey> = left.iter().map(key_of).collect();

    let context = format!("{left_label}/{right_label}");
    let mut rows = Vec::with_capacity(left.len().min(right.len()));
    let mut join = JoinReport::default();
    let mut seen = HashSet::new();

    for obs in left {
        let key = key_of(obs);
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(other) = right_by_key.get(&key) else {
            join.left_only.push(key);
            continue;
        };

        if obs.value.trim().is_empty() || other.value.trim().is_empty() {
            return Err(AppError::data_shape(
                &context,
                format!("missing value for {}", key.label()),
            ));
        }
        let month = month_number(&context, &key.period_name)?;
        let date = row_date(&context, &key, month)?;
        let label = key.label();
        rows.push(TrendRow {
            left: TrendValue::parse(&obs.value),
            right: TrendValue::parse(&other.value),
            month,
            date,
            label,
            key,
        });
    }

    let mut right_seen = HashSet::new();
    for obs in right {
        let key = key_of(obs);
        if !left_keys.contains(&key) && right_seen.insert(key.clone()) {
            join.right_only.push(key);
        }
    }

    rows.sort_by_key(|r| r.date);

    if !join.is_clean() {
        tracing::warn!(
            left_only = join.left_only.len(),
            right_only = join.right_only.len(),
            "Trend join dropped periods reported by only one series"
        );
    }
    tracing::info!(rows = rows.len(), "Merged {left_label} with {right_label}");

    Ok(MergedTrend {
        left_label: left_label.to_string(),
        right_label: right_label.to_string(),
        rows,
        join,
    })
}

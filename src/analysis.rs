//! Descriptive summaries of raw sale records.
//!
//! These are the aggregates behind exploratory charts: monthly price and
//! volume trends, volume composition, category comparisons and a correlation
//! matrix. None of them feed the forecast.

use crate::core::{month_start, RawRecord};
use crate::error::{ForecastError, Result};
use crate::prepare::parse_record_date;
use crate::utils::stats::{mean, pearson};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Label of the target in a [`CorrelationMatrix`].
pub const TARGET_LABEL: &str = "target";

/// Mean target and mean volume for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub mean_target: f64,
    /// `None` when no record in the month carries the volume column.
    pub mean_volume: Option<f64>,
}

/// Summed volumes for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeTotals {
    pub period_start: NaiveDate,
    pub totals: BTreeMap<String, f64>,
}

/// One column's contribution to a volume composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub column: String,
    pub total: f64,
    /// Fraction of the combined total, 0 when the combined total is 0.
    pub share: f64,
}

/// Mean target of the records sharing a category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMean {
    pub value: String,
    pub mean_target: f64,
    pub count: usize,
}

/// Pearson correlations between the target and volume columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()` square.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two labels, if both exist.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[i][j])
    }
}

/// Records grouped by month start, in calendar order.
fn group_by_month(records: &[RawRecord]) -> Result<BTreeMap<NaiveDate, Vec<&RawRecord>>> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    let mut months: BTreeMap<NaiveDate, Vec<&RawRecord>> = BTreeMap::new();
    for (row, record) in records.iter().enumerate() {
        let date = parse_record_date(row, record)?;
        months.entry(month_start(date)).or_default().push(record);
    }
    Ok(months)
}

/// Monthly mean target alongside the monthly mean of `volume_column`.
pub fn monthly_trend(records: &[RawRecord], volume_column: &str) -> Result<Vec<TrendPoint>> {
    Ok(group_by_month(records)?
        .into_iter()
        .map(|(period_start, group)| {
            let targets: Vec<f64> = group.iter().map(|r| r.target).collect();
            let volumes: Vec<f64> = group.iter().filter_map(|r| r.volume(volume_column)).collect();
            TrendPoint {
                period_start,
                mean_target: mean(&targets),
                mean_volume: (!volumes.is_empty()).then(|| mean(&volumes)),
            }
        })
        .collect())
}

/// Monthly sum of each named volume column. Missing cells count as zero.
pub fn monthly_volume_totals(records: &[RawRecord], columns: &[&str]) -> Result<Vec<VolumeTotals>> {
    Ok(group_by_month(records)?
        .into_iter()
        .map(|(period_start, group)| {
            let totals = columns
                .iter()
                .map(|&column| {
                    let sum: f64 = group.iter().filter_map(|r| r.volume(column)).sum();
                    (column.to_string(), sum)
                })
                .collect();
            VolumeTotals {
                period_start,
                totals,
            }
        })
        .collect())
}

/// Total of each volume column over all records and its share of the sum.
pub fn composition(records: &[RawRecord], columns: &[&str]) -> Result<Vec<Share>> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    let totals: Vec<(String, f64)> = columns
        .iter()
        .map(|&column| {
            let total: f64 = records.iter().filter_map(|r| r.volume(column)).sum();
            (column.to_string(), total)
        })
        .collect();
    let grand_total: f64 = totals.iter().map(|(_, t)| t).sum();

    Ok(totals
        .into_iter()
        .map(|(column, total)| Share {
            share: if grand_total > 0.0 {
                total / grand_total
            } else {
                0.0
            },
            column,
            total,
        })
        .collect())
}

/// Mean target per value of `category`, sorted by value.
///
/// Records without the category are left out.
pub fn mean_target_by(records: &[RawRecord], category: &str) -> Result<Vec<CategoryMean>> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let Some(value) = record.category(category) {
            let entry = groups.entry(value).or_insert((0.0, 0));
            entry.0 += record.target;
            entry.1 += 1;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(value, (sum, count))| CategoryMean {
            value: value.to_string(),
            mean_target: sum / count as f64,
            count,
        })
        .collect())
}

/// The `n` category values with the highest mean target, highest first.
///
/// Ties keep alphabetical order.
pub fn top_by_mean_target(records: &[RawRecord], category: &str, n: usize) -> Result<Vec<CategoryMean>> {
    let mut means = mean_target_by(records, category)?;
    means.sort_by(|a, b| {
        b.mean_target
            .partial_cmp(&a.mean_target)
            .unwrap_or(Ordering::Equal)
    });
    means.truncate(n);
    Ok(means)
}

/// Pearson correlation between the target and each volume column.
///
/// Each pair uses the records where both values are present. A constant column
/// correlates 0 with everything else; the diagonal is always 1.
pub fn correlation_matrix(records: &[RawRecord], columns: &[&str]) -> Result<CorrelationMatrix> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }

    let mut labels = vec![TARGET_LABEL.to_string()];
    labels.extend(columns.iter().map(|c| c.to_string()));

    let value_of = |record: &RawRecord, label: usize| -> Option<f64> {
        if label == 0 {
            Some(record.target)
        } else {
            record.volume(columns[label - 1])
        }
    };

    let k = labels.len();
    let mut values = vec![vec![1.0; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let (x, y): (Vec<f64>, Vec<f64>) = records
                .iter()
                .filter_map(|r| Some((value_of(r, i)?, value_of(r, j)?)))
                .unzip();
            let r = if x.len() >= 2 { pearson(&x, &y) } else { 0.0 };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { labels, values })
}

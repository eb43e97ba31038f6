//! Series preparation: irregular sale records to a regular monthly series.
//!
//! Records are bucketed by calendar month and each month's value is the mean
//! of its targets. The output spans from the earliest record's month to the
//! latest record's month; partial boundary months are kept as-is.

use crate::core::{add_months, month_start, parse_date, MonthlyObservation, PreparedSeries, RawRecord};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What to do with months inside the span that have no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Fail with [`ForecastError::SparseSeries`] listing every empty month.
    #[default]
    Fail,
    /// Fill empty months by linear interpolation between observed neighbours.
    Interpolate,
}

/// Configuration for [`prepare_with`].
#[derive(Debug, Clone, Default)]
pub struct PrepareConfig {
    pub gap_policy: GapPolicy,
}

impl PrepareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }
}

/// Running sum and count for one month.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MonthAccumulator {
    sum: f64,
    count: usize,
}

impl MonthAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Prepare records with the default configuration (gaps are an error).
///
/// # Example
/// ```
/// use commodity_forecast::core::RawRecord;
/// use commodity_forecast::prepare;
///
/// let records = vec![
///     RawRecord::new("2015-01-04", 1.0),
///     RawRecord::new("2015-01-25", 2.0),
///     RawRecord::new("2015-02-01", 4.0),
/// ];
/// let series = prepare(&records).unwrap();
/// assert_eq!(series.values(), vec![1.5, 4.0]);
/// ```
pub fn prepare(records: &[RawRecord]) -> Result<PreparedSeries> {
    prepare_with(records, &PrepareConfig::default())
}

/// Prepare records with an explicit configuration.
pub fn prepare_with(records: &[RawRecord], config: &PrepareConfig) -> Result<PreparedSeries> {
    let buckets = bucket_by_month(records)?;

    // Non-empty input guarantees at least one bucket.
    let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(ForecastError::EmptyInput),
    };

    let mut periods = Vec::new();
    let mut slots: Vec<Option<f64>> = Vec::new();
    let mut month = first;
    let mut offset = 0u32;
    while month <= last {
        periods.push(month);
        slots.push(buckets.get(&month).map(MonthAccumulator::mean));
        offset += 1;
        month = match add_months(first, offset) {
            Some(next) => next,
            None => break,
        };
    }

    let missing: Vec<NaiveDate> = periods
        .iter()
        .zip(&slots)
        .filter(|(_, slot)| slot.is_none())
        .map(|(&period, _)| period)
        .collect();

    debug!(
        records = records.len(),
        months = periods.len(),
        gaps = missing.len(),
        "bucketed records by calendar month"
    );

    let values = if missing.is_empty() {
        slots.into_iter().flatten().collect()
    } else {
        match config.gap_policy {
            GapPolicy::Fail => return Err(ForecastError::SparseSeries { missing }),
            GapPolicy::Interpolate => {
                warn!(
                    gaps = missing.len(),
                    first_gap = %missing[0],
                    "interpolating months without records"
                );
                interpolate_gaps(&slots)
            }
        }
    };

    let observations = periods
        .into_iter()
        .zip(values)
        .map(|(period, value)| MonthlyObservation::new(period, value))
        .collect();
    PreparedSeries::new(observations)
}

/// Validate every record and accumulate targets per month start.
pub(crate) fn bucket_by_month(records: &[RawRecord]) -> Result<BTreeMap<NaiveDate, MonthAccumulator>> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }

    let mut buckets: BTreeMap<NaiveDate, MonthAccumulator> = BTreeMap::new();
    for (row, record) in records.iter().enumerate() {
        let date = parse_record_date(row, record)?;
        if !record.target.is_finite() || record.target < 0.0 {
            return Err(ForecastError::InvalidTarget {
                row,
                value: record.target,
            });
        }
        buckets
            .entry(month_start(date))
            .or_default()
            .push(record.target);
    }

    Ok(buckets)
}

/// Parse a record's date, reporting its row on failure.
pub(crate) fn parse_record_date(row: usize, record: &RawRecord) -> Result<NaiveDate> {
    parse_date(&record.date).ok_or_else(|| ForecastError::MalformedDate {
        row,
        value: record.date.clone(),
    })
}

/// Linear interpolation across interior gaps.
///
/// The first and last slots are always observed, because the span is bounded
/// by the earliest and latest records.
fn interpolate_gaps(slots: &[Option<f64>]) -> Vec<f64> {
    let mut result = Vec::with_capacity(slots.len());
    let mut i = 0;
    while i < slots.len() {
        match slots[i] {
            Some(v) => {
                result.push(v);
                i += 1;
            }
            None => {
                let start = i;
                while i < slots.len() && slots[i].is_none() {
                    i += 1;
                }
                let left = result.last().copied();
                let right = slots.get(i).copied().flatten();
                match (left, right) {
                    (Some(l), Some(r)) => {
                        let segments = (i - start + 1) as f64;
                        for j in 0..(i - start) {
                            let t = (j + 1) as f64 / segments;
                            result.push(l + t * (r - l));
                        }
                    }
                    (Some(edge), None) | (None, Some(edge)) => {
                        result.extend(std::iter::repeat(edge).take(i - start));
                    }
                    (None, None) => result.extend(std::iter::repeat(f64::NAN).take(i - start)),
                }
            }
        }
    }
    result
}

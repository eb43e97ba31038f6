//! Regular monthly series produced by preparation and consumed by the engine.

use crate::core::calendar::{add_months, month_start, months_between};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One month of a prepared series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyObservation {
    /// First day of the month.
    pub period_start: NaiveDate,
    /// Aggregated value for the month.
    pub value: f64,
}

impl MonthlyObservation {
    pub fn new(period_start: NaiveDate, value: f64) -> Self {
        Self {
            period_start,
            value,
        }
    }
}

/// A gap-free monthly series.
///
/// Invariants checked on construction:
/// - at least one observation
/// - every period is the first day of a month
/// - consecutive periods are exactly one calendar month apart
/// - every value is finite
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreparedSeries {
    observations: Vec<MonthlyObservation>,
}

impl PreparedSeries {
    /// Validate and wrap a list of monthly observations.
    pub fn new(observations: Vec<MonthlyObservation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyInput);
        }

        for (i, obs) in observations.iter().enumerate() {
            if obs.period_start.day() != 1 {
                return Err(ForecastError::InvalidSeries(format!(
                    "period {} at index {} is not a month start",
                    obs.period_start, i
                )));
            }
            if !obs.value.is_finite() {
                return Err(ForecastError::InvalidSeries(format!(
                    "non-finite value {} for {}",
                    obs.value,
                    obs.period_start.format("%Y-%m")
                )));
            }
        }

        for pair in observations.windows(2) {
            let step = months_between(pair[0].period_start, pair[1].period_start);
            if step != 1 {
                return Err(ForecastError::InvalidSeries(format!(
                    "periods {} and {} are {} month(s) apart, expected 1",
                    pair[0].period_start, pair[1].period_start, step
                )));
            }
        }

        Ok(Self { observations })
    }

    /// Build a series from consecutive values starting in the month of `start`.
    ///
    /// # Example
    /// ```
    /// use commodity_forecast::core::PreparedSeries;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2015, 1, 18).unwrap();
    /// let series = PreparedSeries::from_values(start, &[1.1, 1.2, 1.3]).unwrap();
    /// assert_eq!(series.len(), 3);
    /// assert_eq!(series.first_period(), NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
    /// ```
    pub fn from_values(start: NaiveDate, values: &[f64]) -> Result<Self> {
        let start = month_start(start);
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| add_months(start, i))
                    .map(|period| MonthlyObservation::new(period, value))
                    .ok_or_else(|| {
                        ForecastError::InvalidSeries(format!(
                            "month {} after {} is out of calendar range",
                            i, start
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(observations)
    }

    /// Number of months.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false: a prepared series holds at least one month.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[MonthlyObservation] {
        &self.observations
    }

    /// Monthly values in period order.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Period starts in order.
    pub fn periods(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.period_start).collect()
    }

    pub fn first_period(&self) -> NaiveDate {
        self.observations[0].period_start
    }

    pub fn last_period(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].period_start
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthlyObservation> {
        self.observations.iter()
    }
}

impl<'a> IntoIterator for &'a PreparedSeries {
    type Item = &'a MonthlyObservation;
    type IntoIter = std::slice::Iter<'a, MonthlyObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_values_builds_contiguous_months() {
        let series = PreparedSeries::from_values(ymd(2017, 11, 20), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            series.periods(),
            vec![ymd(2017, 11, 1), ymd(2017, 12, 1), ymd(2018, 1, 1)]
        );
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.first_period(), ymd(2017, 11, 1));
        assert_eq!(series.last_period(), ymd(2018, 1, 1));
        assert!(!series.is_empty());
    }

    #[test]
    fn rejects_empty_series() {
        assert!(matches!(
            PreparedSeries::new(vec![]),
            Err(ForecastError::EmptyInput)
        ));
    }

    #[test]
    fn rejects_skipped_month() {
        let result = PreparedSeries::new(vec![
            MonthlyObservation::new(ymd(2017, 1, 1), 1.0),
            MonthlyObservation::new(ymd(2017, 3, 1), 1.0),
        ]);
        assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn rejects_duplicate_month() {
        let result = PreparedSeries::new(vec![
            MonthlyObservation::new(ymd(2017, 1, 1), 1.0),
            MonthlyObservation::new(ymd(2017, 1, 1), 2.0),
        ]);
        assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn rejects_mid_month_period_and_nan() {
        let mid = PreparedSeries::new(vec![MonthlyObservation::new(ymd(2017, 1, 15), 1.0)]);
        assert!(matches!(mid, Err(ForecastError::InvalidSeries(_))));

        let nan = PreparedSeries::from_values(ymd(2017, 1, 1), &[1.0, f64::NAN]);
        assert!(matches!(nan, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn serializes_as_list_of_observations() {
        let series = PreparedSeries::from_values(ymd(2017, 1, 1), &[1.5]).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"[{"period_start":"2017-01-01","value":1.5}]"#);
    }
}

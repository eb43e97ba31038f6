//! Tabular rendering of forecast results.

use crate::core::ForecastResult;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// One forecast month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub period: NaiveDate,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

/// Forecast laid out as a date/value table.
///
/// `Display` renders values with two decimals:
///
/// ```text
/// period          forecast
/// 2018-04-01          1.41
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn has_intervals(&self) -> bool {
        self.rows.iter().any(|r| r.lower.is_some())
    }
}

impl From<&ForecastResult> for ForecastTable {
    fn from(result: &ForecastResult) -> Self {
        let intervals = result.intervals();
        let rows = result
            .forecast()
            .enumerate()
            .map(|(i, obs)| ForecastRow {
                period: obs.period_start,
                value: obs.value,
                lower: intervals.and_then(|iv| iv.lower.get(i).copied()),
                upper: intervals.and_then(|iv| iv.upper.get(i).copied()),
            })
            .collect();
        Self { rows }
    }
}

impl fmt::Display for ForecastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let intervals = self.has_intervals();
        write!(f, "{:<10} {:>13}", "period", "forecast")?;
        if intervals {
            write!(f, " {:>13} {:>13}", "lower", "upper")?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<10} {:>13.2}", row.period.format("%Y-%m-%d"), row.value)?;
            if let (Some(lower), Some(upper)) = (row.lower, row.upper) {
                write!(f, " {:>13.2} {:>13.2}", lower, upper)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PreparedSeries;
    use crate::engine::{forecast, ForecastEngine};

    fn series() -> PreparedSeries {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let values: Vec<f64> = (0..24).map(|i| 1.2 + 0.05 * (i % 12) as f64).collect();
        PreparedSeries::from_values(start, &values).unwrap()
    }

    #[test]
    fn table_rows_follow_forecast() {
        let result = forecast(&series(), 3).unwrap();
        let table = ForecastTable::from(&result);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].period, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(table.rows[0].value, result.forecast_values()[0]);
        assert!(table.rows[0].lower.is_none());
    }

    #[test]
    fn display_uses_two_decimals() {
        let table = ForecastTable {
            rows: vec![ForecastRow {
                period: NaiveDate::from_ymd_opt(2018, 4, 1).unwrap(),
                value: 1.4149,
                lower: None,
                upper: None,
            }],
        };
        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("period"));
        assert!(lines[1].starts_with("2018-04-01"));
        assert!(lines[1].ends_with("1.41"));
    }

    #[test]
    fn intervals_add_columns() {
        let result = ForecastEngine::default()
            .forecast_with_intervals(&series(), 2, 0.95)
            .unwrap();
        let table = ForecastTable::from(&result);
        let text = table.to_string();
        assert!(text.lines().next().unwrap().contains("upper"));
        assert!(table.rows.iter().all(|r| r.lower.is_some() && r.upper.is_some()));
    }

    #[test]
    fn serializes_dates_as_iso() {
        let result = forecast(&series(), 1).unwrap();
        let json = serde_json::to_string(&ForecastTable::from(&result)).unwrap();
        assert!(json.contains("\"period\":\"2018-01-01\""));
        assert!(!json.contains("lower"));
    }
}

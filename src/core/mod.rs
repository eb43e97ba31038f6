//! Core data structures for commodity series and forecasts.

mod calendar;
mod forecast;
mod record;
mod series;

pub use calendar::{add_months, following_months, month_start, months_between, parse_date};
pub use forecast::{FitDiagnostics, ForecastIntervals, ForecastResult};
pub use record::RawRecord;
pub use series::{MonthlyObservation, PreparedSeries};

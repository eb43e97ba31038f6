//! # commodity-forecast
//!
//! Monthly price forecasting for commodity sale records.
//!
//! Irregular, possibly duplicated transactional records are prepared into a
//! regular monthly series ([`prepare`]), which a fixed-order seasonal ARIMA
//! model SARIMA(1,1,1)(1,1,1)\[12\] extends by a requested number of months
//! ([`forecast`]). CSV ingestion, descriptive summaries and table rendering sit
//! around that core.
//!
//! ```
//! use commodity_forecast::prelude::*;
//!
//! let records: Vec<RawRecord> = (0..30)
//!     .map(|i| {
//!         let date = format!("{}-{:02}-15", 2015 + i / 12, i % 12 + 1);
//!         let price = 1.4 + 0.2 * (std::f64::consts::PI * i as f64 / 6.0).sin();
//!         RawRecord::new(date, price)
//!     })
//!     .collect();
//!
//! let series = prepare(&records).unwrap();
//! let result = forecast(&series, 12).unwrap();
//! assert_eq!(result.forecast_values().len(), 12);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod core;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod prepare;
pub mod report;
pub mod utils;

pub use engine::forecast;
pub use error::{ErrorCategory, ForecastError, Result};
pub use prepare::{prepare, prepare_with};

pub mod prelude {
    pub use crate::core::{ForecastResult, MonthlyObservation, PreparedSeries, RawRecord};
    pub use crate::engine::{forecast, EngineConfig, ForecastEngine};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, SarimaOrder, SARIMA};
    pub use crate::prepare::{prepare, prepare_with, GapPolicy, PrepareConfig};
}

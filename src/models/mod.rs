//! Forecasting models.

mod traits;

pub mod sarima;

pub use sarima::{SarimaOrder, SARIMA};
pub use traits::{Forecaster, ModelForecast};

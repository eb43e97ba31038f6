//! Forecaster trait defining the interface between models and the engine.

use crate::core::{ForecastIntervals, PreparedSeries};
use crate::error::Result;

/// Point forecast with optional prediction intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    pub point: Vec<f64>,
    pub intervals: Option<ForecastIntervals>,
}

/// Common interface for monthly forecasting models.
pub trait Forecaster {
    /// Fit the model to a prepared monthly series.
    fn fit(&mut self, series: &PreparedSeries) -> Result<()>;

    /// Point predictions for the next `horizon` months.
    fn predict(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Point predictions with prediction intervals at `level`.
    ///
    /// Models without a variance estimate return point predictions only.
    fn predict_with_intervals(&self, horizon: usize, _level: f64) -> Result<ModelForecast> {
        Ok(ModelForecast {
            point: self.predict(horizon)?,
            intervals: None,
        })
    }

    /// In-sample fitted values on the original scale.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// One-step innovations of the fitted model.
    fn residuals(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

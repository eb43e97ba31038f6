//! Forecast result returned by the engine.

use crate::core::series::{MonthlyObservation, PreparedSeries};
use crate::models::sarima::SarimaOrder;
use chrono::NaiveDate;
use serde::Serialize;

/// Symmetric prediction intervals around the point forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastIntervals {
    /// Nominal coverage, e.g. 0.95.
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Summary of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    /// Non-seasonal AR coefficients.
    pub ar: Vec<f64>,
    /// Non-seasonal MA coefficients.
    pub ma: Vec<f64>,
    /// Seasonal AR coefficients.
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA coefficients.
    pub seasonal_ma: Vec<f64>,
    /// Innovation variance, in squared units of the series.
    pub sigma2: f64,
    /// Conditional Gaussian log-likelihood; `None` when the innovation variance is zero.
    pub log_likelihood: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    /// Number of differenced observations the ARMA part was fitted on.
    pub n_obs: usize,
    /// Optimizer iterations (0 when the fit was skipped).
    pub iterations: usize,
    /// The differenced series had no variance, so the ARMA part was not estimated.
    pub degenerate: bool,
}

/// Forecast of a prepared monthly series.
///
/// Built once per engine call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    history: PreparedSeries,
    horizon: usize,
    forecast_periods: Vec<NaiveDate>,
    forecast_values: Vec<f64>,
    fitted: Vec<MonthlyObservation>,
    order: SarimaOrder,
    diagnostics: FitDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    intervals: Option<ForecastIntervals>,
}

impl ForecastResult {
    pub(crate) fn new(
        history: PreparedSeries,
        forecast_periods: Vec<NaiveDate>,
        forecast_values: Vec<f64>,
        fitted: Vec<MonthlyObservation>,
        order: SarimaOrder,
        diagnostics: FitDiagnostics,
    ) -> Self {
        debug_assert_eq!(forecast_periods.len(), forecast_values.len());
        Self {
            horizon: forecast_values.len(),
            history,
            forecast_periods,
            forecast_values,
            fitted,
            order,
            diagnostics,
            intervals: None,
        }
    }

    pub(crate) fn with_intervals(mut self, intervals: ForecastIntervals) -> Self {
        self.intervals = Some(intervals);
        self
    }

    /// The series the model was fitted on.
    pub fn history(&self) -> &PreparedSeries {
        &self.history
    }

    /// Number of forecast months.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Month starts of the forecast, immediately following the history.
    pub fn forecast_periods(&self) -> &[NaiveDate] {
        &self.forecast_periods
    }

    /// Point forecasts, index-aligned with [`forecast_periods`](Self::forecast_periods).
    pub fn forecast_values(&self) -> &[f64] {
        &self.forecast_values
    }

    /// Forecast as `(period, value)` pairs.
    pub fn forecast(&self) -> impl Iterator<Item = MonthlyObservation> + '_ {
        self.forecast_periods
            .iter()
            .zip(&self.forecast_values)
            .map(|(&period, &value)| MonthlyObservation::new(period, value))
    }

    /// In-sample one-step-ahead fitted values on the original scale.
    pub fn fitted(&self) -> &[MonthlyObservation] {
        &self.fitted
    }

    /// Model orders used for this forecast.
    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    pub fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    /// Prediction intervals, present only when explicitly requested.
    pub fn intervals(&self) -> Option<&ForecastIntervals> {
        self.intervals.as_ref()
    }
}

//! Forecast engine: validates a request, fits the seasonal model and packages
//! the result.
//!
//! Every call is independent. The engine holds only its configuration, so a
//! single instance can be shared between threads.

use crate::core::{following_months, ForecastResult, MonthlyObservation, PreparedSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, SarimaOrder, SARIMA};
use crate::utils::NelderMeadConfig;
use std::time::Instant;
use tracing::debug;

/// Configuration for [`ForecastEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Model orders. Never selected automatically.
    pub order: SarimaOrder,
    /// Smallest accepted horizon.
    pub min_horizon: usize,
    /// Largest accepted horizon.
    pub max_horizon: usize,
    /// Minimum number of monthly observations.
    pub min_history: usize,
    /// Settings for the coefficient search.
    pub optimizer: NelderMeadConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order: SarimaOrder::MONTHLY,
            min_horizon: 1,
            max_horizon: 36,
            min_history: 24,
            optimizer: NelderMeadConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_order(mut self, order: SarimaOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the accepted horizon range (inclusive).
    pub fn with_horizon_range(mut self, min: usize, max: usize) -> Self {
        self.min_horizon = min;
        self.max_horizon = max;
        self
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }

    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }
}

/// Fits a fixed-order SARIMA model and forecasts a prepared monthly series.
///
/// # Example
/// ```
/// use commodity_forecast::core::PreparedSeries;
/// use commodity_forecast::engine::ForecastEngine;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
/// let values: Vec<f64> = (0..36)
///     .map(|i| 1.3 + 0.2 * (std::f64::consts::PI * i as f64 / 6.0).sin())
///     .collect();
/// let series = PreparedSeries::from_values(start, &values).unwrap();
///
/// let result = ForecastEngine::default().forecast(&series, 6).unwrap();
/// assert_eq!(result.horizon(), 6);
/// assert_eq!(
///     result.forecast_periods()[0],
///     NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: EngineConfig,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Point forecast for the next `horizon` months.
    pub fn forecast(&self, series: &PreparedSeries, horizon: usize) -> Result<ForecastResult> {
        self.validate(series, horizon)?;
        let model = self.fit(series)?;
        let values = model.predict(horizon)?;
        self.package(series, &model, values)
    }

    /// Point forecast with symmetric normal prediction intervals at `level`.
    pub fn forecast_with_intervals(
        &self,
        series: &PreparedSeries,
        horizon: usize,
        level: f64,
    ) -> Result<ForecastResult> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidLevel(level));
        }
        self.validate(series, horizon)?;
        let model = self.fit(series)?;
        let forecast = model.predict_with_intervals(horizon, level)?;
        let result = self.package(series, &model, forecast.point)?;
        Ok(match forecast.intervals {
            Some(intervals) => result.with_intervals(intervals),
            None => result,
        })
    }

    fn validate(&self, series: &PreparedSeries, horizon: usize) -> Result<()> {
        let (min, max) = (self.config.min_horizon, self.config.max_horizon);
        if horizon < min || horizon > max {
            return Err(ForecastError::InvalidHorizon { horizon, min, max });
        }
        if series.len() < self.config.min_history {
            return Err(ForecastError::InsufficientHistory {
                needed: self.config.min_history,
                got: series.len(),
            });
        }
        Ok(())
    }

    fn fit(&self, series: &PreparedSeries) -> Result<SARIMA> {
        let started = Instant::now();
        let mut model = SARIMA::new(self.config.order).with_optimizer(self.config.optimizer.clone());
        model.fit(series)?;
        debug!(
            order = %self.config.order,
            months = series.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model fitted"
        );
        Ok(model)
    }

    fn package(
        &self,
        series: &PreparedSeries,
        model: &SARIMA,
        values: Vec<f64>,
    ) -> Result<ForecastResult> {
        let periods = following_months(series.last_period(), values.len()).ok_or_else(|| {
            ForecastError::InvalidSeries("forecast periods exceed the supported calendar".into())
        })?;

        let fitted_values = model.fitted_values().unwrap_or(&[]);
        let offset = series.len() - fitted_values.len();
        let fitted = series.observations()[offset..]
            .iter()
            .zip(fitted_values)
            .map(|(obs, &value)| MonthlyObservation::new(obs.period_start, value))
            .collect();

        Ok(ForecastResult::new(
            series.clone(),
            periods,
            values,
            fitted,
            self.config.order,
            model.diagnostics()?,
        ))
    }
}

/// Forecast `horizon` months with the default SARIMA(1,1,1)(1,1,1)\[12\] engine.
pub fn forecast(series: &PreparedSeries, horizon: usize) -> Result<ForecastResult> {
    ForecastEngine::default().forecast(series, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::f64::consts::PI;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series_of(values: &[f64]) -> PreparedSeries {
        PreparedSeries::from_values(ymd(2015, 1, 1), values).unwrap()
    }

    fn seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect()
    }

    #[test]
    fn horizon_is_validated_before_history() {
        let short = series_of(&seasonal(5));
        assert!(matches!(
            forecast(&short, 0),
            Err(ForecastError::InvalidHorizon {
                horizon: 0,
                min: 1,
                max: 36
            })
        ));
        assert!(matches!(
            forecast(&short, 37),
            Err(ForecastError::InvalidHorizon { horizon: 37, .. })
        ));
        assert!(matches!(
            forecast(&short, 12),
            Err(ForecastError::InsufficientHistory { needed: 24, got: 5 })
        ));
    }

    #[test]
    fn twenty_three_months_is_not_enough() {
        let series = series_of(&seasonal(23));
        assert!(matches!(
            forecast(&series, 1),
            Err(ForecastError::InsufficientHistory { needed: 24, got: 23 })
        ));
    }

    #[test]
    fn periods_follow_history() {
        let series = series_of(&seasonal(24));
        let result = forecast(&series, 36).unwrap();
        assert_eq!(result.horizon(), 36);
        assert_eq!(result.forecast_values().len(), 36);
        assert_eq!(result.forecast_periods()[0], ymd(2017, 1, 1));
        assert_eq!(result.forecast_periods()[35], ymd(2019, 12, 1));
        assert_eq!(result.order(), SarimaOrder::MONTHLY);
        assert!(result.intervals().is_none());
    }

    #[test]
    fn seasonal_pattern_is_continued() {
        let series = series_of(&seasonal(24));
        let result = forecast(&series, 12).unwrap();
        let mae: f64 = result
            .forecast_values()
            .iter()
            .zip(seasonal(36).iter().skip(24))
            .map(|(f, t)| (f - t).abs())
            .sum::<f64>()
            / 12.0;
        assert!(mae < 5.0, "mae = {}", mae);
    }

    #[test]
    fn constant_series_stays_constant() {
        let series = series_of(&[1.42; 24]);
        let result = forecast(&series, 12).unwrap();
        for v in result.forecast_values() {
            assert_relative_eq!(*v, 1.42, epsilon = 1e-12);
        }
        assert!(result.diagnostics().degenerate);
    }

    #[test]
    fn fitted_values_cover_post_differencing_months() {
        let series = series_of(&seasonal(30));
        let result = forecast(&series, 3).unwrap();
        assert_eq!(result.fitted().len(), 30 - 13);
        assert_eq!(result.fitted()[0].period_start, ymd(2016, 2, 1));
        assert_eq!(result.history(), &series);
    }

    #[test]
    fn intervals_require_valid_level() {
        let series = series_of(&seasonal(24));
        let engine = ForecastEngine::default();
        for level in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                engine.forecast_with_intervals(&series, 6, level),
                Err(ForecastError::InvalidLevel(_))
            ));
        }
        let result = engine.forecast_with_intervals(&series, 6, 0.9).unwrap();
        let intervals = result.intervals().unwrap();
        assert_eq!(intervals.lower.len(), 6);
        assert_relative_eq!(intervals.level, 0.9);
    }

    #[test]
    fn custom_config_changes_bounds() {
        let engine = ForecastEngine::new(
            EngineConfig::default()
                .with_horizon_range(1, 6)
                .with_min_history(30),
        );
        let series = series_of(&seasonal(28));
        assert!(matches!(
            engine.forecast(&series, 7),
            Err(ForecastError::InvalidHorizon { max: 6, .. })
        ));
        assert!(matches!(
            engine.forecast(&series, 6),
            Err(ForecastError::InsufficientHistory { needed: 30, got: 28 })
        ));
        assert_eq!(engine.config().order, SarimaOrder::MONTHLY);
    }
}

//! Seasonal ARIMA model fitted by conditional sum of squares.

use crate::core::{FitDiagnostics, ForecastIntervals, PreparedSeries};
use crate::error::{ForecastError, Result};
use crate::models::sarima::diff::{
    difference, differencing_polynomial, lag_polynomial, poly_mul, seasonal_difference,
    undifference,
};
use crate::models::sarima::order::SarimaOrder;
use crate::models::traits::{Forecaster, ModelForecast};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean_abs, normal_critical_value};
use tracing::{debug, warn};

/// Coefficients are kept strictly inside the unit interval.
const COEFFICIENT_BOUND: f64 = 0.99;

/// Relative size below which the differenced series counts as all-zero.
const DEGENERATE_TOLERANCE: f64 = 1e-10;

/// SARIMA(p, d, q)(P, D, Q)\[s\] model.
///
/// The differenced series `w = (1-B)^d (1-B^s)^D y` follows the multiplicative ARMA
/// `φ(B)Φ(B^s) w_t = θ(B)Θ(B^s) e_t` without intercept. Coefficients minimise
/// the conditional sum of squares with zero pre-sample values, found by a
/// bounded Nelder–Mead search from a fixed start, so fitting is deterministic.
#[derive(Debug, Clone)]
pub struct SARIMA {
    order: SarimaOrder,
    optimizer: NelderMeadConfig,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    /// Original series.
    history: Option<Vec<f64>>,
    /// Differenced series.
    differenced: Option<Vec<f64>>,
    /// Innovations on the differenced scale.
    residuals: Option<Vec<f64>>,
    /// In-sample fitted values for `history[span..]`.
    fitted: Option<Vec<f64>>,
    sigma2: f64,
    iterations: usize,
    degenerate: bool,
}

impl SARIMA {
    /// Create an unfitted model with the given orders.
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            optimizer: NelderMeadConfig::default(),
            ar: vec![],
            ma: vec![],
            seasonal_ar: vec![],
            seasonal_ma: vec![],
            history: None,
            differenced: None,
            residuals: None,
            fitted: None,
            sigma2: 0.0,
            iterations: 0,
            degenerate: false,
        }
    }

    /// SARIMA(1,1,1)(1,1,1)\[12\].
    pub fn monthly() -> Self {
        Self::new(SarimaOrder::MONTHLY)
    }

    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Innovation variance, in squared units of the series.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// True when the differenced series had no variation to model.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Minimum series length the model can be fitted on.
    pub fn min_observations(&self) -> usize {
        self.order.differencing_span() + self.order.num_coefficients() + 2
    }

    /// Fit on raw monthly values.
    pub fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "series contains a non-finite value at index {}",
                i
            )));
        }

        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientHistory {
                needed,
                got: values.len(),
            });
        }

        let order = self.order;
        let season = order.season();
        let mut w = difference(values, order.d);
        if order.is_seasonal() {
            w = seasonal_difference(&w, order.seasonal_d, season);
        }

        let rms = (w.iter().map(|x| x * x).sum::<f64>() / w.len() as f64).sqrt();
        let threshold = DEGENERATE_TOLERANCE * mean_abs(values).max(1.0);

        let coefficients = if rms <= threshold {
            warn!(
                order = %order,
                rms,
                "differenced series has no variation, skipping coefficient estimation"
            );
            self.degenerate = true;
            self.iterations = 0;
            vec![0.0; order.num_coefficients()]
        } else {
            self.degenerate = false;
            self.estimate_coefficients(&w, rms)?
        };

        self.unpack(&coefficients);
        let (ar_poly, ma_poly) = self.lag_polynomials();
        let residuals = innovations(&w, &ar_poly, &ma_poly);
        self.sigma2 = residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64;

        let span = order.differencing_span();
        let fitted: Vec<f64> = values[span..]
            .iter()
            .zip(&residuals)
            .map(|(y, e)| y - e)
            .collect();

        if !self.sigma2.is_finite() || fitted.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "{} produced non-finite in-sample values",
                order
            )));
        }

        debug!(
            order = %order,
            ar = ?self.ar,
            ma = ?self.ma,
            seasonal_ar = ?self.seasonal_ar,
            seasonal_ma = ?self.seasonal_ma,
            sigma2 = self.sigma2,
            iterations = self.iterations,
            "fitted seasonal ARIMA"
        );

        self.history = Some(values.to_vec());
        self.differenced = Some(w);
        self.residuals = Some(residuals);
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Minimise the conditional sum of squares on the standardised series.
    fn estimate_coefficients(&mut self, w: &[f64], scale: f64) -> Result<Vec<f64>> {
        let k = self.order.num_coefficients();
        if k == 0 {
            self.iterations = 0;
            return Ok(vec![]);
        }

        let z: Vec<f64> = w.iter().map(|x| x / scale).collect();
        let order = self.order;
        let n = z.len() as f64;
        let objective = |params: &[f64]| {
            let (ar_poly, ma_poly) = polynomials_from(order, params);
            innovations(&z, &ar_poly, &ma_poly)
                .iter()
                .map(|e| e * e)
                .sum::<f64>()
                / n
        };

        let bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); k];
        let initial = vec![0.0; k];
        let result = nelder_mead(objective, &initial, Some(&bounds), &self.optimizer);
        self.iterations = result.iterations;

        if !result.converged() {
            return Err(ForecastError::ModelFit(format!(
                "{}: {} after {} iterations (objective spread {:.3e}, tolerance {:.1e})",
                order, result.termination, result.iterations, result.spread, self.optimizer.tolerance
            )));
        }
        Ok(result.optimal_point)
    }

    fn unpack(&mut self, params: &[f64]) {
        let (ar, ma, sar, sma) = split_params(self.order, params);
        self.ar = ar.to_vec();
        self.ma = ma.to_vec();
        self.seasonal_ar = sar.to_vec();
        self.seasonal_ma = sma.to_vec();
    }

    /// Expanded AR and MA polynomials of the fitted model.
    fn lag_polynomials(&self) -> (Vec<f64>, Vec<f64>) {
        let season = self.order.season();
        let ar_poly = poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, season, -1.0),
        );
        let ma_poly = poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, season, 1.0),
        );
        (ar_poly, ma_poly)
    }

    fn delta(&self) -> Vec<f64> {
        if self.order.is_seasonal() {
            differencing_polynomial(self.order.d, self.order.seasonal_d, self.order.period)
        } else {
            differencing_polynomial(self.order.d, 0, 0)
        }
    }

    /// MA(∞) weights of the full model including differencing.
    pub fn psi_weights(&self, count: usize) -> Vec<f64> {
        let (ar_poly, ma_poly) = self.lag_polynomials();
        let full_ar = poly_mul(&ar_poly, &self.delta());
        let mut psi = Vec::with_capacity(count);
        for j in 0..count {
            let mut value = if j == 0 {
                1.0
            } else {
                ma_poly.get(j).copied().unwrap_or(0.0)
            };
            for k in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }

    /// Forecast standard errors for steps `1..=horizon`.
    pub fn forecast_std_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        if self.history.is_none() {
            return Err(ForecastError::FitRequired);
        }
        let mut cumulative = 0.0;
        Ok(self
            .psi_weights(horizon)
            .into_iter()
            .map(|psi| {
                cumulative += psi * psi;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect())
    }

    /// Diagnostics summary of the fit.
    pub fn diagnostics(&self) -> Result<FitDiagnostics> {
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;
        let n_obs = residuals.len();
        let n = n_obs as f64;
        let k = (self.order.num_coefficients() + 1) as f64;

        let log_likelihood = if self.sigma2 > 0.0 {
            Some(-0.5 * n * ((2.0 * std::f64::consts::PI * self.sigma2).ln() + 1.0))
        } else {
            None
        };

        Ok(FitDiagnostics {
            ar: self.ar.clone(),
            ma: self.ma.clone(),
            seasonal_ar: self.seasonal_ar.clone(),
            seasonal_ma: self.seasonal_ma.clone(),
            sigma2: self.sigma2,
            log_likelihood,
            aic: log_likelihood.map(|ll| -2.0 * ll + 2.0 * k),
            bic: log_likelihood.map(|ll| -2.0 * ll + k * n.ln()),
            n_obs,
            iterations: self.iterations,
            degenerate: self.degenerate,
        })
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::monthly()
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &PreparedSeries) -> Result<()> {
        self.fit_values(&series.values())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let (ar_poly, ma_poly) = self.lag_polynomials();
        let mut w_ext = w.clone();
        let mut e_ext = residuals.clone();
        for _ in 0..horizon {
            let t = w_ext.len();
            let mut pred = 0.0;
            for (k, coef) in ar_poly.iter().enumerate().skip(1) {
                if t >= k {
                    pred -= coef * w_ext[t - k];
                }
            }
            for (k, coef) in ma_poly.iter().enumerate().skip(1) {
                if t >= k {
                    pred += coef * e_ext[t - k];
                }
            }
            w_ext.push(pred);
            // Future innovations have zero expectation
            e_ext.push(0.0);
        }

        let forecast = undifference(&w_ext[w.len()..], history, &self.delta());
        if let Some(step) = forecast.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "{} forecast diverged at step {}",
                self.order,
                step + 1
            )));
        }
        Ok(forecast)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<ModelForecast> {
        let z = normal_critical_value(level).ok_or(ForecastError::InvalidLevel(level))?;
        let point = self.predict(horizon)?;
        let se = self.forecast_std_errors(horizon)?;

        let lower = point.iter().zip(&se).map(|(p, s)| p - z * s).collect();
        let upper = point.iter().zip(&se).map(|(p, s)| p + z * s).collect();

        Ok(ModelForecast {
            point,
            intervals: Some(ForecastIntervals {
                level,
                lower,
                upper,
            }),
        })
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}

/// Split a flat parameter vector into (AR, MA, seasonal AR, seasonal MA).
fn split_params(order: SarimaOrder, params: &[f64]) -> (&[f64], &[f64], &[f64], &[f64]) {
    let (ar, rest) = params.split_at(order.p.min(params.len()));
    let (ma, rest) = rest.split_at(order.q.min(rest.len()));
    if !order.is_seasonal() {
        return (ar, ma, &[], &[]);
    }
    let (sar, rest) = rest.split_at(order.seasonal_p.min(rest.len()));
    let (sma, _) = rest.split_at(order.seasonal_q.min(rest.len()));
    (ar, ma, sar, sma)
}

fn polynomials_from(order: SarimaOrder, params: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let (ar, ma, sar, sma) = split_params(order, params);
    let season = order.season();
    (
        poly_mul(
            &lag_polynomial(ar, 1, -1.0),
            &lag_polynomial(sar, season, -1.0),
        ),
        poly_mul(&lag_polynomial(ma, 1, 1.0), &lag_polynomial(sma, season, 1.0)),
    )
}

/// One-step innovations `e_t = w_t - ŵ_t` with zero pre-sample values.
fn innovations(w: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut pred = 0.0;
        for (k, coef) in ar_poly.iter().enumerate().skip(1) {
            if t >= k {
                pred -= coef * w[t - k];
            }
        }
        for (k, coef) in ma_poly.iter().enumerate().skip(1) {
            if t >= k {
                pred += coef * e[t - k];
            }
        }
        e[t] = w[t] - pred;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn seasonal_values(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect()
    }

    /// Trend + season + deterministic pseudo-noise.
    fn noisy_values(n: usize) -> Vec<f64> {
        let mut state: u64 = 7;
        (0..n)
            .map(|i| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let noise = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
                50.0 + 0.4 * i as f64 + 8.0 * (2.0 * PI * i as f64 / 12.0).sin() + 2.0 * noise
            })
            .collect()
    }

    #[test]
    fn sarima_fits_noisy_seasonal_series() {
        let values = noisy_values(60);
        let mut model = SARIMA::monthly();
        model.fit_values(&values).unwrap();

        assert!(!model.is_degenerate());
        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert_eq!(model.seasonal_ar_coefficients().len(), 1);
        assert_eq!(model.seasonal_ma_coefficients().len(), 1);
        for c in model
            .ar_coefficients()
            .iter()
            .chain(model.ma_coefficients())
            .chain(model.seasonal_ar_coefficients())
            .chain(model.seasonal_ma_coefficients())
        {
            assert!(c.abs() <= COEFFICIENT_BOUND);
        }
        assert!(model.sigma2() > 0.0);

        let forecast = model.predict(12).unwrap();
        assert_eq!(forecast.len(), 12);
        assert!(forecast.iter().all(|v| v.is_finite()));
        // Trend continues upward on average
        let last_year_mean = values[48..].iter().sum::<f64>() / 12.0;
        let forecast_mean = forecast.iter().sum::<f64>() / 12.0;
        assert!(forecast_mean > last_year_mean);
    }

    #[test]
    fn noise_free_season_is_repeated() {
        let values = seasonal_values(24);
        let mut model = SARIMA::monthly();
        model.fit_values(&values).unwrap();
        assert!(model.is_degenerate());

        let forecast = model.predict(12).unwrap();
        for (h, v) in forecast.iter().enumerate() {
            let expected = 100.0 + 10.0 * (2.0 * PI * (24 + h) as f64 / 12.0).sin();
            assert_relative_eq!(*v, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn constant_series_forecasts_constant() {
        let values = vec![1.35; 30];
        let mut model = SARIMA::monthly();
        model.fit_values(&values).unwrap();
        assert!(model.is_degenerate());

        let forecast = model.predict(6).unwrap();
        for v in forecast {
            assert_relative_eq!(v, 1.35, epsilon = 1e-12);
        }
        let diagnostics = model.diagnostics().unwrap();
        assert!(diagnostics.degenerate);
        assert_eq!(diagnostics.log_likelihood, None);
        assert_eq!(diagnostics.aic, None);
    }

    #[test]
    fn fitted_values_align_with_differencing_span() {
        let values = noisy_values(48);
        let mut model = SARIMA::monthly();
        model.fit_values(&values).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert_eq!(fitted.len(), 48 - 13);
        let residuals = model.residuals().unwrap();
        for (i, (f, e)) in fitted.iter().zip(residuals).enumerate() {
            assert_relative_eq!(f + e, values[i + 13], epsilon = 1e-9);
        }
    }

    #[test]
    fn fitting_is_deterministic() {
        let values = noisy_values(40);
        let mut a = SARIMA::monthly();
        let mut b = SARIMA::monthly();
        a.fit_values(&values).unwrap();
        b.fit_values(&values).unwrap();
        assert_eq!(a.predict(12).unwrap(), b.predict(12).unwrap());
        assert_eq!(a.ar_coefficients(), b.ar_coefficients());
    }

    #[test]
    fn non_finite_input_is_a_fit_error() {
        let mut values = noisy_values(30);
        values[5] = f64::NAN;
        let mut model = SARIMA::monthly();
        assert!(matches!(
            model.fit_values(&values),
            Err(ForecastError::ModelFit(_))
        ));
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = SARIMA::monthly();
        assert!(matches!(
            model.fit_values(&noisy_values(10)),
            Err(ForecastError::InsufficientHistory { needed: 19, got: 10 })
        ));
    }

    #[test]
    fn iteration_cap_surfaces_as_fit_error() {
        let mut model =
            SARIMA::monthly().with_optimizer(NelderMeadConfig::default().with_max_iter(2));
        match model.fit_values(&noisy_values(48)) {
            Err(ForecastError::ModelFit(msg)) => {
                assert!(msg.contains("iteration limit"), "unexpected message: {}", msg);
            }
            other => panic!("expected ModelFit, got {:?}", other),
        }
    }

    #[test]
    fn predict_requires_fit() {
        let model = SARIMA::monthly();
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn psi_weights_of_random_walk() {
        // ARIMA(0,1,0): psi_j = 1 for all j
        let mut model = SARIMA::new(SarimaOrder::new((0, 1, 0), (0, 0, 0, 12)));
        model.fit_values(&noisy_values(20)).unwrap();
        assert_eq!(model.psi_weights(5), vec![1.0; 5]);

        let se = model.forecast_std_errors(4).unwrap();
        let sigma = model.sigma2().sqrt();
        for (h, s) in se.iter().enumerate() {
            assert_relative_eq!(*s, sigma * ((h + 1) as f64).sqrt(), epsilon = 1e-9);
        }
    }

    #[test]
    fn intervals_bracket_point_forecast() {
        let mut model = SARIMA::monthly();
        model.fit_values(&noisy_values(60)).unwrap();
        let forecast = model.predict_with_intervals(12, 0.95).unwrap();
        let intervals = forecast.intervals.unwrap();

        let mut last_width = 0.0;
        for i in 0..12 {
            assert!(intervals.lower[i] <= forecast.point[i]);
            assert!(forecast.point[i] <= intervals.upper[i]);
            let width = intervals.upper[i] - intervals.lower[i];
            assert!(width >= last_width - 1e-12);
            last_width = width;
        }

        assert!(matches!(
            model.predict_with_intervals(3, 1.5),
            Err(ForecastError::InvalidLevel(_))
        ));
    }

    #[test]
    fn innovations_reconstruct_series() {
        let w = [0.5, -0.2, 0.3, 0.1, -0.4];
        let ar = [1.0, -0.5];
        let ma = [1.0, 0.3];
        let e = innovations(&w, &ar, &ma);
        // w_t = 0.5 w_{t-1} + e_t + 0.3 e_{t-1}
        for t in 1..w.len() {
            let rebuilt = 0.5 * w[t - 1] + e[t] + 0.3 * e[t - 1];
            assert_relative_eq!(rebuilt, w[t], epsilon = 1e-12);
        }
        assert_relative_eq!(e[0], w[0]);
    }
}

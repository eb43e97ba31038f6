//! Descriptive statistics used by the model and the analysis module.

use statrs::distribution::{ContinuousCDF, Normal};

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of absolute values.
pub fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Pearson correlation of two equally long slices.
///
/// Returns `0.0` when either side has zero variance, and `NaN` when the
/// lengths differ or fewer than two pairs are given.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Two-sided standard normal critical value for a coverage `level` in (0, 1).
///
/// # Example
/// ```
/// use commodity_forecast::utils::stats::normal_critical_value;
///
/// let z = normal_critical_value(0.95).unwrap();
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn normal_critical_value(level: f64) -> Option<f64> {
    if !(level > 0.0 && level < 1.0) {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(normal.inverse_cdf((1.0 + level) / 2.0))
}

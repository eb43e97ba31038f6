//! Differencing and lag-polynomial utilities for SARIMA models.
//!
//! Polynomials are stored as coefficient vectors in the backshift operator `B`,
//! constant term first: `[1.0, -0.5]` is `1 - 0.5B`.

/// Apply regular differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Product of two polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Polynomial `1 + sign * (c_1 B^lag + c_2 B^{2 lag} + ...)`.
pub fn lag_polynomial(coefficients: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * lag + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * lag] = sign * c;
    }
    poly
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let seasonal = lag_polynomial(&[1.0], period, -1.0);
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Undo differencing for values that follow `history`.
///
/// `future` holds differenced values `w_t = Σ δ_k y_{t-k}` for the periods
/// after the history; each `y_t` is recovered as `w_t - Σ_{k≥1} δ_k y_{t-k}`,
/// using earlier recovered values as they become available.
pub fn undifference(future: &[f64], history: &[f64], delta: &[f64]) -> Vec<f64> {
    let mut extended = history.to_vec();
    extended.reserve(future.len());
    for &w in future {
        let t = extended.len();
        let mut y = w;
        for (k, coef) in delta.iter().enumerate().skip(1) {
            if t >= k {
                y -= coef * extended[t - k];
            }
        }
        extended.push(y);
    }
    extended.split_off(history.len())
}

//! Bounded Nelder–Mead simplex minimisation.
//!
//! Fully deterministic: the initial simplex is derived from the start point and
//! the configured step, so identical inputs always yield identical results.

use std::cmp::Ordering;
use std::fmt;

/// Why the simplex search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The spread of objective values across the simplex fell below tolerance.
    FunctionSpread,
    /// All vertices collapsed to within tolerance of the centroid.
    SimplexCollapsed,
    /// The iteration cap was reached first.
    MaxIterations,
    /// The best vertex still has a non-finite objective value.
    NonFinite,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::FunctionSpread => "objective spread below tolerance",
            Termination::SimplexCollapsed => "simplex collapsed below tolerance",
            Termination::MaxIterations => "iteration limit reached before tolerance was met",
            Termination::NonFinite => "objective is not finite at the best vertex",
        };
        f.write_str(text)
    }
}

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Spread of objective values across the final simplex.
    pub spread: f64,
    pub termination: Termination,
}

impl NelderMeadResult {
    /// True when a tolerance criterion was met.
    pub fn converged(&self) -> bool {
        matches!(
            self.termination,
            Termination::FunctionSpread | Termination::SimplexCollapsed
        )
    }
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance for both the objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step (absolute for zero coordinates, relative otherwise).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

/// Minimise `objective` starting from `initial`.
///
/// Non-finite objective values are treated as `+inf`, so a vertex that makes
/// the objective blow up is always the first to be replaced. Points are
/// clamped to `bounds` when given.
///
/// # Example
/// ```
/// use commodity_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged());
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let n = initial.len();
    if n == 0 {
        let value = eval(initial);
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: value,
            iterations: 0,
            spread: 0.0,
            termination: if value.is_finite() {
                Termination::SimplexCollapsed
            } else {
                Termination::NonFinite
            },
        };
    }

    let start = apply_bounds(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        // Step inwards if the bound clamps the vertex back onto the start point.
        let mut vertex = apply_bounds(&vertex, bounds);
        if (vertex[i] - start[i]).abs() < f64::EPSILON {
            vertex[i] = start[i] - step;
            vertex = apply_bounds(&vertex, bounds);
        }
        simplex.push(vertex);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut termination = Termination::MaxIterations;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| cmp_values(values[a], values[b]));
        let best_idx = order[0];
        let worst_idx = order[n];
        let second_worst_idx = order[n - 1];

        let spread = values[worst_idx] - values[best_idx];
        if spread.is_finite() && spread < config.tolerance {
            termination = Termination::FunctionSpread;
            break;
        }

        let centroid = compute_centroid(&simplex, worst_idx);
        let max_dist = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if max_dist < config.tolerance {
            termination = Termination::SimplexCollapsed;
            break;
        }

        let reflected = apply_bounds(&reflect(&simplex[worst_idx], &centroid, config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[second_worst_idx] && reflected_value >= values[best_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
            continue;
        }

        if reflected_value < values[best_idx] {
            let expanded = apply_bounds(&expand(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst_idx] = expanded;
                values[worst_idx] = expanded_value;
            } else {
                simplex[worst_idx] = reflected;
                values[worst_idx] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[worst_idx] {
            // Outside contraction
            let contracted = apply_bounds(&contract(&centroid, &reflected, config.rho), bounds);
            let contracted_value = eval(&contracted);
            if contracted_value <= reflected_value {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        } else {
            // Inside contraction
            let contracted =
                apply_bounds(&contract(&centroid, &simplex[worst_idx], config.rho), bounds);
            let contracted_value = eval(&contracted);
            if contracted_value < values[worst_idx] {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        }

        // Shrink towards the best vertex
        let best = simplex[best_idx].clone();
        for i in 0..=n {
            if i != best_idx {
                let shrunk: Vec<f64> = best
                    .iter()
                    .zip(&simplex[i])
                    .map(|(b, x)| b + config.sigma * (x - b))
                    .collect();
                simplex[i] = apply_bounds(&shrunk, bounds);
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best_idx = (0..=n)
        .min_by(|&a, &b| cmp_values(values[a], values[b]))
        .unwrap_or(0);
    let worst_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let optimal_value = values[best_idx];
    if !optimal_value.is_finite() {
        termination = Termination::NonFinite;
    }

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value,
        iterations,
        spread: worst_value - optimal_value,
        termination,
    }
}

fn cmp_values(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Centroid of the simplex excluding the worst vertex.
fn compute_centroid(simplex: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude_idx {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
    }
    for c in &mut centroid {
        *c /= count;
    }
    centroid
}

fn reflect(point: &[f64], centroid: &[f64], alpha: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + alpha * (c - p))
        .collect()
}

fn expand(centroid: &[f64], reflected: &[f64], gamma: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(reflected)
        .map(|(c, r)| c + gamma * (r - c))
        .collect()
}

fn contract(centroid: &[f64], point: &[f64], rho: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + rho * (p - c))
        .collect()
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        );

        assert!(result.converged());
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let config = NelderMeadConfig::default().with_max_iter(10_000);
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            &config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.5, 0.5],
            Some(&[(-0.99, 0.99), (-0.99, 0.99)]),
            &NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 0.99, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 0.99, epsilon = 1e-4);
    }

    #[test]
    fn start_on_upper_bound_still_explores() {
        let result = nelder_mead(
            |x| (x[0] + 0.5).powi(2),
            &[0.99],
            Some(&[(-0.99, 0.99)]),
            &NelderMeadConfig::default(),
        );
        assert_relative_eq!(result.optimal_point[0], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let config = NelderMeadConfig::default().with_max_iter(3);
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-1.2, 1.0],
            None,
            &config,
        );
        assert_eq!(result.termination, Termination::MaxIterations);
        assert!(!result.converged());
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn non_finite_objective_is_reported() {
        let result = nelder_mead(|_| f64::NAN, &[0.0], None, &NelderMeadConfig::default());
        assert_eq!(result.termination, Termination::NonFinite);
        assert!(!result.converged());
    }

    #[test]
    fn non_finite_regions_are_avoided() {
        // Objective undefined for x > 1; minimum at x = 0.5
        let result = nelder_mead(
            |x| {
                if x[0] > 1.0 {
                    f64::NAN
                } else {
                    (x[0] - 0.5).powi(2)
                }
            },
            &[0.9],
            None,
            &NelderMeadConfig::default(),
        );
        assert!(result.converged());
        assert_relative_eq!(result.optimal_point[0], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let f = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[0] * x[1] - 0.1).powi(2);
        let a = nelder_mead(f, &[0.0, 0.0], None, &NelderMeadConfig::default());
        let b = nelder_mead(f, &[0.0, 0.0], None, &NelderMeadConfig::default());
        assert_eq!(a.optimal_point, b.optimal_point);
        assert_eq!(a.iterations, b.iterations);
    }
}

//! Seasonal ARIMA (SARIMA) model for monthly series.
//!
//! This module provides:
//! - [`SarimaOrder`] describing (p, d, q)(P, D, Q)\[s\]
//! - [`SARIMA`], fitted by conditional sum of squares
//! - Differencing and lag-polynomial helpers

mod diff;
mod model;
mod order;

pub use diff::{
    difference, differencing_polynomial, lag_polynomial, poly_mul, seasonal_difference,
    undifference,
};
pub use model::SARIMA;
pub use order::SarimaOrder;

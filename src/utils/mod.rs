//! Numerical utilities shared by the model and analysis code.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult, Termination};
pub use stats::{mean, normal_critical_value, pearson};

//! Error types for the commodity-forecast library.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for preparation and forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Broad classification of a [`ForecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caused by caller-supplied data. Fix the input and call again.
    Input,
    /// The request is statistically infeasible for the model.
    Model,
    /// Reading the source table failed.
    Io,
}

/// Errors that can occur while ingesting, preparing or forecasting a series.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// No records were supplied.
    #[error("empty input: at least one record is required")]
    EmptyInput,

    /// A record carries a date that cannot be parsed.
    #[error("malformed date at row {row}: {value:?}")]
    MalformedDate { row: usize, value: String },

    /// A record carries a negative or non-finite target value.
    #[error("invalid target at row {row}: {value}")]
    InvalidTarget { row: usize, value: f64 },

    /// One or more calendar months inside the span have no records.
    #[error(
        "sparse series: no records for {} ({} month(s) missing)",
        .missing.first().map(|d| d.format("%Y-%m").to_string()).unwrap_or_default(),
        .missing.len()
    )]
    SparseSeries { missing: Vec<NaiveDate> },

    /// A prepared series violates the monthly-regularity invariants.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// Not enough monthly history to identify the seasonal model.
    #[error("insufficient history: need at least {needed} months, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// Requested horizon is outside the supported range.
    #[error("invalid horizon {horizon}: must be between {min} and {max}")]
    InvalidHorizon {
        horizon: usize,
        min: usize,
        max: usize,
    },

    /// Interval level is not strictly between 0 and 1.
    #[error("invalid interval level {0}: must be in (0, 1)")]
    InvalidLevel(f64),

    /// Model fitting failed (non-convergence, non-finite values, divergence).
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// A model was asked to predict before it was fitted.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// A mapped column is absent from the table header.
    #[error("missing column {0:?}")]
    MissingColumn(String),

    /// A numeric cell could not be parsed.
    #[error("invalid value at row {row}, column {column:?}: {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// Malformed CSV input.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForecastError::EmptyInput
            | ForecastError::MalformedDate { .. }
            | ForecastError::InvalidTarget { .. }
            | ForecastError::SparseSeries { .. }
            | ForecastError::InvalidSeries(_)
            | ForecastError::InvalidHorizon { .. }
            | ForecastError::InvalidLevel(_)
            | ForecastError::MissingColumn(_)
            | ForecastError::InvalidValue { .. } => ErrorCategory::Input,
            ForecastError::InsufficientHistory { .. }
            | ForecastError::ModelFit(_)
            | ForecastError::FitRequired => ErrorCategory::Model,
            ForecastError::Csv(_) | ForecastError::Io(_) => ErrorCategory::Io,
        }
    }
}

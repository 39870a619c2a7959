//! Error type shared by the matrix build, validation and provider layers.

use thiserror::Error;

/// Errors raised before any optimizer runs.
///
/// Optimizers never fail once a [`crate::problem::RoutingProblem`] has been
/// prepared; every variant here belongs to validation or to the distance
/// provider boundary.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The distance/duration provider could not produce a matrix.
    #[error("distance provider failed: {message}")]
    Provider { message: String },

    /// The provider reported no route between two locations.
    #[error("no route between location {from} and location {to}")]
    NoRoute { from: usize, to: usize },

    /// The provider returned a matrix of the wrong size.
    #[error("matrix shape mismatch: expected {expected}x{expected}, found {found}")]
    MatrixShape { expected: usize, found: String },

    /// A matrix cell was negative, NaN or infinite.
    #[error("invalid matrix value at ({row}, {col})")]
    InvalidMatrixValue { row: usize, col: usize },

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("job {job_id} has a negative estimated duration")]
    NegativeDuration { job_id: String },

    #[error("invalid {context} window: {start}..{end}")]
    InvalidTimeWindow {
        context: String,
        start: i32,
        end: i32,
    },

    #[error("technician {technician_id} has no working hours")]
    NoWorkingHours { technician_id: String },

    #[error("job {job_id} appears more than once")]
    DuplicateJob { job_id: String },

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl OptimizeError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

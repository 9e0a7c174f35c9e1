//! Error types for stochastic optimization.
//!
//! A single error type is shared by objective functions, update policies and
//! the driver, so a failure raised by an objective function reaches the caller
//! exactly as it was produced.

use thiserror::Error;

/// Errors that can occur while evaluating a function or running an optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g. a zero batch size), or when retained optimizer state
    /// does not fit the iterate it is applied to.
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Dimension mismatch between vectors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A sample index outside `[0, len)` was requested from a separable function.
    #[error("Sample index {index} out of range for function with {len} terms")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of separable terms
        len: usize,
    },

    /// Failure reported by a user-provided objective function.
    #[error("Function evaluation failed: {reason}")]
    FunctionError {
        /// Description of the failure
        reason: String,
    },
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a FunctionError with a custom reason.
    pub fn function_error<S: Into<String>>(reason: S) -> Self {
        Self::FunctionError {
            reason: reason.into(),
        }
    }
}

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, OptimizerError>;

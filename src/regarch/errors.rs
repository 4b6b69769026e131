//! regarch::errors — error types for the RegArch recursion engine.
//!
//! Purpose
//! -------
//! Collect every failure the engine can surface into a single enum so that
//! top-level calls (simulation, log-likelihood, gradient, Hessian,
//! covariance) abort with a descriptive error instead of partial results.
//!
//! Key behaviors
//! -------------
//! - Structural errors: parameter-vector length mismatches, unknown parameter
//!   names, duplicate mean components, lag reads beyond the derivative
//!   window, and stale derivative stacks.
//! - Numerical errors: non-positive conditional variance, invalid
//!   log-density, non-finite recursions, and invalid distribution shapes.
//! - Linear-algebra failures from [`crate::inference`] are wrapped through
//!   `From<InferenceError>`.
//!
//! Conventions
//! -----------
//! - Dates are 0-based indices into the sample.
//! - All fallible functions in `regarch` return [`RegArchResult<T>`].
use crate::inference::errors::InferenceError;

/// Result alias used throughout the `regarch` module tree.
pub type RegArchResult<T> = Result<T, RegArchError>;

/// Error enum for model construction, recursion and estimation support.
#[derive(Debug, Clone, PartialEq)]
pub enum RegArchError {
    // ---- Structural ----
    /// Flat parameter vector does not match the model's parameter count.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// Parameter name not present in the name table.
    UnknownParamName { name: String },

    /// A mean component of the same type is already present.
    DuplicateComponent { kind: &'static str },

    /// Requested mean component type is not part of the aggregator.
    ComponentNotFound { kind: &'static str },

    /// Lag read beyond the derivative window.
    LagOutOfWindow { lag: usize, window: usize },

    /// Derivative stack was sized for a different parameter count.
    StackSizeMismatch { expected: usize, actual: usize },

    /// Index-based parameter or group access out of range.
    IndexOutOfRange { index: usize, len: usize },

    /// Structural order or option rejected at construction.
    InvalidStructure { reason: &'static str },

    // ---- Input data ----
    EmptySeries,

    NonFiniteData { index: usize, value: f64 },

    /// A component needs more regressor columns than the state carries.
    MissingRegressors { which: &'static str, needed: usize, available: usize },

    /// Regressor matrix row count differs from the series length.
    RegressorLengthMismatch { which: &'static str, expected: usize, actual: usize },

    InvalidPreSample { reason: &'static str },

    // ---- Numerical ----
    /// Conditional variance at date `t` is non-positive or non-finite.
    NonPositiveVariance { t: usize, value: f64 },

    /// A recursion produced a non-finite (or exploding) quantity.
    NonFiniteValue { t: usize, what: &'static str, value: f64 },

    /// Log-density undefined at `x` (density zero or negative).
    InvalidDensity { x: f64, value: f64 },

    InvalidDistributionParam { name: &'static str, value: f64, reason: &'static str },

    InvalidNumericStep { value: f64 },

    NumericDerivativeFailed { reason: String },

    // ---- Inference ----
    Inference(InferenceError),
}

impl std::error::Error for RegArchError {}

impl std::fmt::Display for RegArchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Structural ----
            RegArchError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, got {actual}")
            }
            RegArchError::UnknownParamName { name } => {
                write!(f, "Unknown parameter name: '{name}'")
            }
            RegArchError::DuplicateComponent { kind } => {
                write!(f, "A mean component of type {kind} is already present.")
            }
            RegArchError::ComponentNotFound { kind } => {
                write!(f, "No mean component of type {kind} in the model.")
            }
            RegArchError::LagOutOfWindow { lag, window } => {
                write!(f, "Lag {lag} is outside the derivative window of {window} dates.")
            }
            RegArchError::StackSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "Derivative stack sized for {actual} parameters but the model has {expected}; reallocate it."
                )
            }
            RegArchError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range for length {len}.")
            }
            RegArchError::InvalidStructure { reason } => {
                write!(f, "Invalid model structure: {reason}")
            }
            // ---- Input data ----
            RegArchError::EmptySeries => write!(f, "Input series is empty."),
            RegArchError::NonFiniteData { index, value } => {
                write!(f, "Data point at index {index} is non-finite: {value}")
            }
            RegArchError::MissingRegressors { which, needed, available } => {
                write!(
                    f,
                    "{which} regressors: component needs {needed} columns, state has {available}."
                )
            }
            RegArchError::RegressorLengthMismatch { which, expected, actual } => {
                write!(f, "{which} regressors must have {expected} rows; got {actual}.")
            }
            RegArchError::InvalidPreSample { reason } => {
                write!(f, "Invalid pre-sample values: {reason}")
            }
            // ---- Numerical ----
            RegArchError::NonPositiveVariance { t, value } => {
                write!(f, "Conditional variance at date {t} is not strictly positive: {value}")
            }
            RegArchError::NonFiniteValue { t, what, value } => {
                write!(f, "Non-finite {what} at date {t}: {value}")
            }
            RegArchError::InvalidDensity { x, value } => {
                write!(f, "Log-density undefined at x = {x}: got {value}")
            }
            RegArchError::InvalidDistributionParam { name, value, reason } => {
                write!(f, "Invalid distribution parameter {name} = {value}: {reason}")
            }
            RegArchError::InvalidNumericStep { value } => {
                write!(f, "Finite-difference step must be finite and > 0; got: {value}")
            }
            RegArchError::NumericDerivativeFailed { reason } => {
                write!(f, "Numeric derivative failed: {reason}")
            }
            // ---- Inference ----
            RegArchError::Inference(err) => write!(f, "Inference error: {err}"),
        }
    }
}

impl From<InferenceError> for RegArchError {
    fn from(err: InferenceError) -> Self {
        RegArchError::Inference(err)
    }
}

//! privacy::errors — error surface for budgets, accounting, and calibration.
//!
//! Purpose
//! -------
//! Normalize every failure of the privacy layer (budget scheduling,
//! accounting-oracle calls, the calibration search, and the caller-facing
//! configuration) into a single enum, [`PrivacyError`], with the result
//! alias [`PrivacyResult`]. Backend `argmin` errors never leak past this
//! module; estimation failures are wrapped unchanged.
//!
//! Key behaviors
//! -------------
//! - Human-readable `Display` messages naming the offending field/value.
//! - `From<argmin::core::Error>` that first recovers a [`PrivacyError`]
//!   raised inside a cost evaluation, then maps `ArgminError` variants.
//! - `From<EstimationError>` so configuration entry points can use `?` on
//!   estimation calls.
//! - `From<PrivacyError> for PyErr` behind `python-bindings`.
//!
//! Conventions
//! -----------
//! - Parameter errors carry the parameter name and a static reason.
//! - None of these errors is retried anywhere in the crate; they describe
//!   either a configuration mistake or an infeasible privacy target.
//!
//! Testing notes
//! -------------
//! - Unit tests verify payload embedding and the argmin round trip.

use argmin::core::{ArgminError, Error};

use crate::estimation::errors::EstimationError;

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for privacy-layer operations.
pub type PrivacyResult<T> = Result<T, PrivacyError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PrivacyError {
    // ---- Parameters / configuration ----
    /// A configuration field was given an out-of-range value.
    InvalidParameter { name: &'static str, value: f64, reason: &'static str },

    /// A required configuration field was never set.
    MissingParameter { name: &'static str },

    /// Unknown budget distribution policy.
    InvalidPolicy { name: String },

    /// Step count must be at least one.
    InvalidSteps { steps: usize },

    /// Budget entries must be finite and non-negative.
    InvalidBudget { index: usize, value: f64 },

    /// Calibration target must have epsilon > 0 and 0 < delta < 1.
    InvalidTarget { epsilon: f64, delta: f64 },

    /// Calibration options failed validation.
    InvalidCalibrationOptions { reason: &'static str },

    // ---- Calibration / accounting ----
    /// The search could not reach the target epsilon inside its bounds.
    CalibrationDivergence { target: f64, achieved: f64, reason: &'static str },

    /// The accounting oracle produced a non-finite epsilon.
    NonFiniteEpsilon { scale: f64, value: f64 },

    /// Estimation requested before any mechanism exists.
    NotCalibrated,

    // ---- Estimation ----
    Estimation(EstimationError),

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    SolverInvalidParameter { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },
}

impl std::error::Error for PrivacyError {}

impl std::fmt::Display for PrivacyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameters / configuration ----
            PrivacyError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid {name} = {value}: {reason}")
            }
            PrivacyError::MissingParameter { name } => {
                write!(f, "Parameter '{name}' must be set before calibration.")
            }
            PrivacyError::InvalidPolicy { name } => {
                write!(
                    f,
                    "Invalid budget distribution '{name}': expected one of 'lin', 'exp', 'log', 'eq'."
                )
            }
            PrivacyError::InvalidSteps { steps } => {
                write!(f, "Invalid step count {steps}: must be at least 1.")
            }
            PrivacyError::InvalidBudget { index, value } => {
                write!(f, "Invalid budget entry {value} at index {index}: must be finite and >= 0.")
            }
            PrivacyError::InvalidTarget { epsilon, delta } => {
                write!(
                    f,
                    "Invalid calibration target (epsilon = {epsilon}, delta = {delta}): \
                     need epsilon > 0 and 0 < delta < 1."
                )
            }
            PrivacyError::InvalidCalibrationOptions { reason } => {
                write!(f, "Invalid calibration options: {reason}")
            }

            // ---- Calibration / accounting ----
            PrivacyError::CalibrationDivergence { target, achieved, reason } => {
                write!(
                    f,
                    "Calibration failed to reach epsilon = {target} (closest achieved: {achieved}): {reason}"
                )
            }
            PrivacyError::NonFiniteEpsilon { scale, value } => {
                write!(f, "Accounting oracle returned non-finite epsilon {value} at scale {scale}")
            }
            PrivacyError::NotCalibrated => {
                write!(f, "Mechanism not calibrated.")
            }

            // ---- Estimation ----
            PrivacyError::Estimation(err) => write!(f, "{err}"),

            // ---- Argmin ----
            PrivacyError::SolverInvalidParameter { text } => {
                write!(f, "Invalid solver parameter: {text}")
            }
            PrivacyError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            PrivacyError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            PrivacyError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }
        }
    }
}

impl From<Error> for PrivacyError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<PrivacyError>() {
            Ok(privacy_err) => return privacy_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => {
                    PrivacyError::SolverInvalidParameter { text }
                }
                ArgminError::ConditionViolated { text } => PrivacyError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => PrivacyError::PotentialBug { text },
                other => PrivacyError::BackendError { text: other.to_string() },
            },
            Err(err) => PrivacyError::BackendError { text: err.to_string() },
        }
    }
}

impl From<EstimationError> for PrivacyError {
    fn from(err: EstimationError) -> Self {
        PrivacyError::Estimation(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<PrivacyError> for PyErr {
    fn from(err: PrivacyError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Payload embedding in `Display` messages.
    // - Recovery of a `PrivacyError` after it has been boxed into an
    //   `argmin::core::Error` inside a cost function.
    //
    // They intentionally DO NOT cover:
    // - The PyO3 conversion, which needs the Python C API.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The not-calibrated message matches the wording callers match on.
    //
    // Given
    // -----
    // - `PrivacyError::NotCalibrated`.
    //
    // Expect
    // ------
    // - Message is "Mechanism not calibrated."
    fn not_calibrated_message_is_stable() {
        // Arrange
        let err = PrivacyError::NotCalibrated;

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(msg, "Mechanism not calibrated.");
    }

    #[test]
    // Purpose
    // -------
    // `InvalidParameter` names the field and value.
    //
    // Given
    // -----
    // - `p_sampling = 1.5` rejected with a reason.
    //
    // Expect
    // ------
    // - Message contains "p_sampling" and "1.5".
    fn invalid_parameter_includes_name_and_value() {
        // Arrange
        let err = PrivacyError::InvalidParameter {
            name: "p_sampling",
            value: 1.5,
            reason: "must lie in (0, 1]",
        };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("p_sampling") && msg.contains("1.5"), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // A `PrivacyError` raised inside argmin survives the round trip.
    //
    // Given
    // -----
    // - `NonFiniteEpsilon` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant.
    fn privacy_error_round_trips_through_argmin_error() {
        // Arrange
        let original = PrivacyError::NonFiniteEpsilon { scale: 2.0, value: f64::INFINITY };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = PrivacyError::from(boxed);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Estimation errors are wrapped without losing their message.
    //
    // Given
    // -----
    // - `EstimationError::EmptyInput { class_index: Some(1) }`.
    //
    // Expect
    // ------
    // - The wrapped message equals the inner message.
    fn estimation_errors_are_wrapped_verbatim() {
        // Arrange
        let inner = EstimationError::EmptyInput { class_index: Some(1) };

        // Act
        let wrapped = PrivacyError::from(inner.clone());

        // Assert
        assert_eq!(wrapped.to_string(), inner.to_string());
    }
}

//! estimation::errors — error surface for subsampling and private means.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by the estimation subtree
//! (point-set validation, label partitioning, subsampling, the iterative
//! mean estimator, and prototype assembly), together with a conversion to
//! Python exceptions when the `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - Define [`EstimationError`] and [`EstimationResult`] as the canonical
//!   error/result pair for every estimation entry point.
//! - Attach human-readable `Display` messages phrased in terms of domain
//!   constraints ("ratio must lie in (0, 1]", "radius must be positive").
//! - Map all variants to `ValueError` at the PyO3 boundary.
//!
//! Invariants & assumptions
//! ------------------------
//! - Estimation routines validate their inputs and return
//!   [`EstimationResult<T>`] instead of panicking on user-facing input.
//! - Variants are small and cloneable; they carry just enough payload
//!   (offending value, index, dimensions) for logging and tests.
//!
//! Testing notes
//! -------------
//! - Unit tests here verify payload embedding in `Display` messages.
//! - Validation paths are exercised in `estimation::validation` and by the
//!   estimator / subsampler tests.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type EstimationResult<T> = Result<T, EstimationError>;

/// EstimationError — failures raised by the estimation subtree.
///
/// Variants
/// --------
/// - `InvalidShape { rows, cols, reason }`
///   The feature array (or the label vector paired with it) does not have
///   the expected two-dimensional layout, e.g. zero feature columns.
/// - `NonFiniteData { row, col, value }`
///   A feature entry is NaN or ±∞.
/// - `EmptyInput { class_index }`
///   No points are available to estimate from. `class_index` is set when
///   the empty set is a label partition (typically after subsampling).
/// - `InvalidRatio { ratio }`
///   Subsampling ratio outside `(0, 1]`.
/// - `InvalidRadius { radius }`
///   Initial radius that is not finite and strictly positive.
/// - `CenterDimMismatch { expected, found }`
///   Initial center length differs from the feature dimension.
/// - `InvalidBudget { round, value }`
///   A round's zCDP budget is not finite and strictly positive.
/// - `InvalidTailProbability { beta }`
///   Failure probability for the radius tail bound outside `(0, 1)`.
/// - `InvalidSamplingMode { name }`
///   Unrecognized sampling-mode name.
/// - `NotSupported { feature }`
///   A declared-but-unimplemented option was requested.
/// - `DistributionError { text }`
///   A `statrs` distribution constructor returned `StatsError` for its
///   parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    // ---- Input shape / data ----
    InvalidShape { rows: usize, cols: usize, reason: &'static str },
    NonFiniteData { row: usize, col: usize, value: f64 },
    EmptyInput { class_index: Option<usize> },

    // ---- Options ----
    InvalidRatio { ratio: f64 },
    InvalidRadius { radius: f64 },
    CenterDimMismatch { expected: usize, found: usize },
    InvalidBudget { round: usize, value: f64 },
    InvalidTailProbability { beta: f64 },
    InvalidSamplingMode { name: String },
    NotSupported { feature: &'static str },

    // ---- statrs ----
    DistributionError { text: String },
}

impl std::error::Error for EstimationError {}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationError::InvalidShape { rows, cols, reason } => {
                write!(f, "Invalid point-set shape ({rows}, {cols}): {reason}")
            }
            EstimationError::NonFiniteData { row, col, value } => {
                write!(f, "Feature at ({row}, {col}) is non-finite: {value}")
            }
            EstimationError::EmptyInput { class_index: Some(k) } => {
                write!(f, "Class partition {k} has no points left to estimate from.")
            }
            EstimationError::EmptyInput { class_index: None } => {
                write!(f, "Point set is empty.")
            }
            EstimationError::InvalidRatio { ratio } => {
                write!(f, "Invalid sampling ratio {ratio}: must lie in (0, 1].")
            }
            EstimationError::InvalidRadius { radius } => {
                write!(f, "Invalid radius {radius}: must be finite and > 0.")
            }
            EstimationError::CenterDimMismatch { expected, found } => {
                write!(f, "Center dimension mismatch: expected {expected}, found {found}")
            }
            EstimationError::InvalidBudget { round, value } => {
                write!(f, "Invalid zCDP budget {value} at round {round}: must be finite and > 0.")
            }
            EstimationError::InvalidTailProbability { beta } => {
                write!(f, "Invalid tail probability {beta}: must lie in (0, 1).")
            }
            EstimationError::InvalidSamplingMode { name } => {
                write!(f, "Unknown sampling mode '{name}': expected 'poisson' or 'fixed'.")
            }
            EstimationError::NotSupported { feature } => {
                write!(f, "Not supported: {feature}")
            }
            EstimationError::DistributionError { text } => {
                write!(f, "Distribution error: {text}")
            }
        }
    }
}

impl From<statrs::StatsError> for EstimationError {
    fn from(err: statrs::StatsError) -> Self {
        EstimationError::DistributionError { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EstimationError> for PyErr {
    fn from(err: EstimationError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // `EmptyInput` should name the class partition when one is known.
    //
    // Given
    // -----
    // - `EmptyInput { class_index: Some(3) }`.
    //
    // Expect
    // ------
    // - Message contains "3".
    fn empty_input_with_class_index_names_the_partition() {
        // Arrange
        let err = EstimationError::EmptyInput { class_index: Some(3) };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains('3'), "Message should include the class index.\nGot: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Offending ratios and budgets appear verbatim in their messages.
    //
    // Given
    // -----
    // - `InvalidRatio { ratio: 1.5 }` and `InvalidBudget { round: 4, value: -0.25 }`.
    //
    // Expect
    // ------
    // - The ratio message contains "1.5"; the budget message contains "4" and "-0.25".
    fn invalid_ratio_and_budget_embed_payloads() {
        // Arrange
        let ratio_err = EstimationError::InvalidRatio { ratio: 1.5 };
        let budget_err = EstimationError::InvalidBudget { round: 4, value: -0.25 };

        // Act
        let ratio_msg = ratio_err.to_string();
        let budget_msg = budget_err.to_string();

        // Assert
        assert!(ratio_msg.contains("1.5"), "Got: {ratio_msg}");
        assert!(budget_msg.contains('4') && budget_msg.contains("-0.25"), "Got: {budget_msg}");
    }

    #[test]
    // Purpose
    // -------
    // A rejected `statrs` constructor converts into `DistributionError`.
    //
    // Given
    // -----
    // - `Normal::new(0.0, -1.0)` (negative standard deviation).
    //
    // Expect
    // ------
    // - `DistributionError` with a non-empty message.
    fn statrs_constructor_error_maps_to_distribution_error() {
        // Arrange
        let raw = statrs::distribution::Normal::new(0.0, -1.0).unwrap_err();

        // Act
        let err: EstimationError = raw.into();

        // Assert
        match err {
            EstimationError::DistributionError { text } => assert!(!text.is_empty()),
            other => panic!("Expected DistributionError, got {other:?}"),
        }
    }
}

//! Calibration search configuration.

use crate::privacy::errors::{PrivacyError, PrivacyResult};

/// Bounds, tolerance, and iteration cap for the scale search.
///
/// - `lower_scale` / `upper_scale`: search bracket over the noise scale.
/// - `tol_epsilon`: accepted absolute gap `|ε(scale) − ε_target|`.
/// - `max_iter`: hard cap on Brent iterations.
/// - `verbose`: attach the slog observer (behind `obs_slog`).
///
/// Default:
/// - bracket `[1e-3, 1e3]`, `tol_epsilon = 1e-4`, `max_iter = 100`,
///   `verbose = false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOptions {
    pub lower_scale: f64,
    pub upper_scale: f64,
    pub tol_epsilon: f64,
    pub max_iter: usize,
    pub verbose: bool,
}

impl CalibrationOptions {
    /// Construct validated options.
    ///
    /// # Rules
    /// - Both bounds finite with `0 < lower_scale < upper_scale`.
    /// - `tol_epsilon` finite and strictly positive.
    /// - `max_iter > 0`.
    ///
    /// # Errors
    /// - [`PrivacyError::InvalidCalibrationOptions`] naming the violated rule.
    pub fn new(
        lower_scale: f64, upper_scale: f64, tol_epsilon: f64, max_iter: usize, verbose: bool,
    ) -> PrivacyResult<Self> {
        if !lower_scale.is_finite() || !upper_scale.is_finite() {
            return Err(PrivacyError::InvalidCalibrationOptions {
                reason: "scale bounds must be finite",
            });
        }
        if lower_scale <= 0.0 || lower_scale >= upper_scale {
            return Err(PrivacyError::InvalidCalibrationOptions {
                reason: "scale bounds must satisfy 0 < lower < upper",
            });
        }
        if !tol_epsilon.is_finite() || tol_epsilon <= 0.0 {
            return Err(PrivacyError::InvalidCalibrationOptions {
                reason: "epsilon tolerance must be finite and > 0",
            });
        }
        if max_iter == 0 {
            return Err(PrivacyError::InvalidCalibrationOptions {
                reason: "maximum iterations must be greater than zero",
            });
        }
        Ok(Self { lower_scale, upper_scale, tol_epsilon, max_iter, verbose })
    }
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self { lower_scale: 1e-3, upper_scale: 1e3, tol_epsilon: 1e-4, max_iter: 100, verbose: false }
    }
}

//! estimation::validation — input checks shared by the estimation entry points.
//!
//! Purpose
//! -------
//! Keep the small sanity checks (point-set shape and finiteness, sampling
//! ratio, initial center/radius, per-round budgets, tail probability) in one
//! place so the subsampler, the estimator, and the prototype driver fail
//! fast with the same structured errors.
//!
//! Conventions
//! -----------
//! - Every helper returns [`EstimationResult`] and never panics on input.
//! - Empty inputs are reported as [`EstimationError::EmptyInput`] before any
//!   shape rule is checked, so a `(0, d)` array is "empty", not "malformed".
//! - No logging here; callers decide what to report.
use ndarray::{ArrayView1, ArrayView2};

use crate::estimation::errors::{EstimationError, EstimationResult};

/// Validate an `(N, d)` point set for mean estimation.
///
/// # Errors
/// - [`EstimationError::EmptyInput`] with `class_index: None` if `N == 0`.
/// - [`EstimationError::InvalidShape`] if `d == 0`.
/// - [`EstimationError::NonFiniteData`] at the first NaN/±∞ entry.
pub fn validate_points(points: ArrayView2<'_, f64>) -> EstimationResult<()> {
    let (rows, cols) = points.dim();
    if rows == 0 {
        return Err(EstimationError::EmptyInput { class_index: None });
    }
    if cols == 0 {
        return Err(EstimationError::InvalidShape {
            rows,
            cols,
            reason: "points must have at least one feature column",
        });
    }
    for ((row, col), &value) in points.indexed_iter() {
        if !value.is_finite() {
            return Err(EstimationError::NonFiniteData { row, col, value });
        }
    }
    Ok(())
}

/// Validate a subsampling ratio: finite and in `(0, 1]`.
pub fn validate_ratio(ratio: f64) -> EstimationResult<()> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(EstimationError::InvalidRatio { ratio });
    }
    Ok(())
}

/// Validate an initial center against the feature dimension `dim`.
pub fn validate_center(center: ArrayView1<'_, f64>, dim: usize) -> EstimationResult<()> {
    if center.len() != dim {
        return Err(EstimationError::CenterDimMismatch { expected: dim, found: center.len() });
    }
    if let Some((col, &value)) = center.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(EstimationError::NonFiniteData { row: 0, col, value });
    }
    Ok(())
}

pub fn validate_radius(radius: f64) -> EstimationResult<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(EstimationError::InvalidRadius { radius });
    }
    Ok(())
}

/// Validate per-round budgets: non-empty, each finite and strictly positive.
///
/// An empty slice is reported as round 0 with value 0.
pub fn validate_budgets(budgets: &[f64]) -> EstimationResult<()> {
    if budgets.is_empty() {
        return Err(EstimationError::InvalidBudget { round: 0, value: 0.0 });
    }
    for (round, &value) in budgets.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(EstimationError::InvalidBudget { round, value });
        }
    }
    Ok(())
}

pub fn validate_beta(beta: f64) -> EstimationResult<()> {
    if !beta.is_finite() || beta <= 0.0 || beta >= 1.0 {
        return Err(EstimationError::InvalidTailProbability { beta });
    }
    Ok(())
}

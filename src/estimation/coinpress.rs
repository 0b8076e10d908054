//! estimation::coinpress — iterative clip-and-noise private mean estimation.
//!
//! Purpose
//! -------
//! Estimate the mean of a bounded-influence point set under zCDP by
//! repeatedly clipping to a ball around the current center, averaging, and
//! adding Gaussian noise. Each round spends one entry of the budget sequence
//! and shrinks the ball, so later rounds clip less and need less noise.
//!
//! Key behaviors
//! -------------
//! - Round `i` with budget `ρᵢ`, center `cᵢ`, radius `rᵢ`:
//!   - `Rᵢ = min(√(rᵢ² + 6rᵢ + γ²), rᵢ + γ)` where `γ` is
//!     [`gaussian_tailbound`]`(d, β)`;
//!   - project every point onto `B(cᵢ, Rᵢ)` ([`clip_to_ball`]) and average;
//!   - add iid `N(0, σᵢ²)` per coordinate, `σᵢ = (2Rᵢ / N) / √(2ρᵢ)`;
//!   - `cᵢ₊₁` = noisy mean, `rᵢ₊₁ = min(rᵢ, γ · √(1/N + σᵢ²))`.
//! - The last round's noisy mean is the estimate.
//! - A per-round [`RoundSummary`] trace is returned alongside the mean.
//!
//! Invariants & assumptions
//! ------------------------
//! - Radii never grow from one round to the next.
//! - Every budget entry is strictly positive; a zero-budget round would
//!   need infinite noise and is rejected up front.
//! - Randomness comes only from the caller's RNG; no reseeding between
//!   rounds.
//!
//! Conventions
//! -----------
//! - Defaults: center `0 ∈ ℝᵈ`, radius `3√d`, `β = 0.01`.
//! - Rows are points, columns are features.
//!
//! Testing notes
//! -------------
//! - Unit tests cover clipping bounds, radius monotonicity, accuracy on a
//!   Gaussian cloud with a generous budget, and each precondition error.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{Rng, distributions::Distribution};
use statrs::distribution::Normal;
use tracing::debug;

use crate::estimation::{
    errors::{EstimationError, EstimationResult},
    validation::{
        validate_beta, validate_budgets, validate_center, validate_points, validate_radius,
    },
};

/// Default failure probability of the per-round radius tail bound.
pub const DEFAULT_BETA: f64 = 0.01;

/// EstimatorOptions — optional prior knowledge and tail probability.
///
/// Fields
/// ------
/// - `initial_center`: starting center `c₀`; zero vector when `None`.
/// - `initial_radius`: starting radius `r₀`; `3√d` when `None`.
/// - `beta`: failure probability used for `γ`, in `(0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorOptions {
    pub initial_center: Option<Array1<f64>>,
    pub initial_radius: Option<f64>,
    pub beta: f64,
}

impl EstimatorOptions {
    /// Construct validated options. The center's length is checked later
    /// against the data dimension.
    ///
    /// # Errors
    /// - [`EstimationError::InvalidRadius`], [`EstimationError::InvalidTailProbability`],
    ///   or [`EstimationError::NonFiniteData`] for a non-finite center entry.
    pub fn new(
        initial_center: Option<Array1<f64>>, initial_radius: Option<f64>, beta: f64,
    ) -> EstimationResult<Self> {
        if let Some(center) = &initial_center {
            validate_center(center.view(), center.len())?;
        }
        if let Some(radius) = initial_radius {
            validate_radius(radius)?;
        }
        validate_beta(beta)?;
        Ok(Self { initial_center, initial_radius, beta })
    }
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self { initial_center: None, initial_radius: None, beta: DEFAULT_BETA }
    }
}

/// Diagnostics for one estimation round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    /// Center the round clipped around.
    pub center: Array1<f64>,
    /// Confidence radius entering the round.
    pub radius: f64,
    pub clip_radius: f64,
    pub noise_sd: f64,
    pub points_clipped: usize,
}

/// Private mean plus the per-round trace that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanEstimate {
    pub mean: Array1<f64>,
    pub rounds: Vec<RoundSummary>,
}

/// `γ(d, β) = √(d + 2√(d·ln(1/β)) + 2·ln(1/β))`, the radius within which a
/// standard `d`-dimensional Gaussian vector falls with probability `1 − β`.
pub fn gaussian_tailbound(dim: usize, beta: f64) -> f64 {
    let d = dim as f64;
    let log_inv = (1.0 / beta).ln();
    (d + 2.0 * (d * log_inv).sqrt() + 2.0 * log_inv).sqrt()
}

/// Project every row of `points` onto the closed ball `B(center, radius)`.
///
/// Returns the projected rows and how many of them were moved.
pub fn clip_to_ball(
    points: ArrayView2<'_, f64>, center: ArrayView1<'_, f64>, radius: f64,
) -> (Array2<f64>, usize) {
    let mut clipped = points.to_owned();
    let mut moved = 0;
    for mut row in clipped.rows_mut() {
        let norm = row.iter().zip(center.iter()).map(|(x, c)| (x - c).powi(2)).sum::<f64>().sqrt();
        if norm > radius {
            let shrink = radius / norm;
            row.zip_mut_with(&center, |x, &c| *x = c + (*x - c) * shrink);
            moved += 1;
        }
    }
    (clipped, moved)
}

/// estimate — run the iterative estimator over `budgets.len()` rounds.
///
/// Parameters
/// ----------
/// - `points`: `(N, d)` finite data.
/// - `budgets`: per-round zCDP budgets, each `> 0`.
/// - `opts`: starting center/radius and tail probability.
/// - `rng`: source of all Gaussian noise.
///
/// Errors
/// ------
/// - [`EstimationError::EmptyInput`] (`N == 0`), [`EstimationError::InvalidShape`]
///   (`d == 0`), [`EstimationError::NonFiniteData`].
/// - [`EstimationError::CenterDimMismatch`], [`EstimationError::InvalidRadius`],
///   [`EstimationError::InvalidTailProbability`].
/// - [`EstimationError::InvalidBudget`] for an empty sequence or a round with
///   `ρᵢ ≤ 0`.
pub fn estimate<R>(
    points: ArrayView2<'_, f64>, budgets: &[f64], opts: &EstimatorOptions, rng: &mut R,
) -> EstimationResult<MeanEstimate>
where
    R: Rng + ?Sized,
{
    validate_points(points)?;
    validate_budgets(budgets)?;
    validate_beta(opts.beta)?;
    let (n, dim) = points.dim();

    let mut center = match &opts.initial_center {
        Some(c) => {
            validate_center(c.view(), dim)?;
            c.clone()
        }
        None => Array1::zeros(dim),
    };
    let mut radius = match opts.initial_radius {
        Some(r) => {
            validate_radius(r)?;
            r
        }
        None => 3.0 * (dim as f64).sqrt(),
    };

    let gamma = gaussian_tailbound(dim, opts.beta);
    let inv_n = 1.0 / n as f64;
    let mut rounds = Vec::with_capacity(budgets.len());

    for (round, &rho) in budgets.iter().enumerate() {
        let clip_radius = (radius * radius + 6.0 * radius + gamma * gamma).sqrt().min(radius + gamma);
        let (clipped, points_clipped) = clip_to_ball(points, center.view(), clip_radius);
        let mean = clipped
            .mean_axis(Axis(0))
            .ok_or(EstimationError::EmptyInput { class_index: None })?;

        let noise_sd = (2.0 * clip_radius * inv_n) / (2.0 * rho).sqrt();
        let noise = Normal::new(0.0, noise_sd)?;
        let noisy = mean.mapv(|m| m + noise.sample(rng));

        debug!(round, rho, radius, clip_radius, noise_sd, points_clipped, "coinpress round");
        rounds.push(RoundSummary {
            center: std::mem::replace(&mut center, noisy),
            radius,
            clip_radius,
            noise_sd,
            points_clipped,
        });
        radius = radius.min((inv_n + noise_sd * noise_sd).sqrt() * gamma);
    }

    Ok(MeanEstimate { mean: center, rounds })
}

/// Convenience wrapper around [`estimate`] returning only the mean.
pub fn private_mean<R>(
    points: ArrayView2<'_, f64>, budgets: &[f64], center: Option<ArrayView1<'_, f64>>,
    radius: Option<f64>, rng: &mut R,
) -> EstimationResult<Array1<f64>>
where
    R: Rng + ?Sized,
{
    let opts = EstimatorOptions {
        initial_center: center.map(|c| c.to_owned()),
        initial_radius: radius,
        beta: DEFAULT_BETA,
    };
    Ok(estimate(points, budgets, &opts, rng)?.mean)
}

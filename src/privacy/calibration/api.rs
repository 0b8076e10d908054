//! Public API surface for calibrating a mechanism to an (ε, δ) target.
//!
//! - [`calibrate`]: generic search over any scale → [`Accountant`] family.
//! - [`CalibrationRequest`]: the two supported ways of describing the budget
//!   shape, chosen explicitly by the caller.
//! - [`calibrate_request`]: resolve a request into a [`ScaledCoinpress`]
//!   family and calibrate it.
//! - [`Calibrated`]: the accepted mechanism annotated with its scale and
//!   achieved epsilon.
//!
//! Convention: larger scale ⇒ smaller achieved epsilon. The search brackets
//! the target between `ε(lower_scale)` (largest) and `ε(upper_scale)`
//! (smallest) before handing the interval to Brent's method.
use std::sync::Arc;

use tracing::{debug, info};

use crate::privacy::{
    accountant::{Accountant, ApproxDpOracle},
    calibration::{adapter::EpsilonGap, options::CalibrationOptions, run::run_brent_root},
    errors::{PrivacyError, PrivacyResult},
    mechanism::{CoinpressMechanism, ScaledCoinpress},
    schedule::{BudgetPolicy, PrivacyBudgetSequence},
};

/// A mechanism accepted by the calibrator.
///
/// - `mechanism`: the family member at the converged scale.
/// - `scale`: converged scale.
/// - `epsilon`: achieved epsilon at `delta` (within `tol_epsilon` of the
///   target, not necessarily equal to it).
/// - `delta`: the delta the epsilon was computed for.
/// - `iterations`: Brent iterations spent (0 when a bound already matched).
#[derive(Debug, Clone)]
pub struct Calibrated<M> {
    pub mechanism: M,
    pub scale: f64,
    pub epsilon: f64,
    pub delta: f64,
    pub iterations: usize,
}

/// How the per-round budget shape is specified for calibration.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationRequest {
    /// Shape from a named distribution policy over `steps` rounds.
    ByScheduleShape { epsilon: f64, delta: f64, dist: BudgetPolicy, order: f64, steps: usize },
    /// Shape from explicit per-round budgets; the step count is `budgets.len()`.
    ByExplicitBudgets { epsilon: f64, delta: f64, budgets: PrivacyBudgetSequence },
}

impl CalibrationRequest {
    pub fn target(&self) -> (f64, f64) {
        match self {
            CalibrationRequest::ByScheduleShape { epsilon, delta, .. }
            | CalibrationRequest::ByExplicitBudgets { epsilon, delta, .. } => (*epsilon, *delta),
        }
    }

    /// Build the scale family this request searches over.
    pub fn family(
        &self, p_sampling: f64, sample_each_step: bool, oracle: Arc<dyn ApproxDpOracle>,
    ) -> PrivacyResult<ScaledCoinpress> {
        match self {
            CalibrationRequest::ByScheduleShape { dist, order, steps, .. } => {
                ScaledCoinpress::by_schedule(
                    *steps,
                    *dist,
                    *order,
                    p_sampling,
                    sample_each_step,
                    oracle,
                )
            }
            CalibrationRequest::ByExplicitBudgets { budgets, .. } => {
                ScaledCoinpress::by_budgets(budgets.clone(), p_sampling, sample_each_step, oracle)
            }
        }
    }
}

/// calibrate — search the scale achieving `target_epsilon` at `target_delta`.
///
/// Parameters
/// ----------
/// - `family`: `Fn(f64) -> PrivacyResult<M>`
///   Maps a positive scale to a fully materialized mechanism. Achieved
///   epsilon must be non-increasing in the scale.
/// - `target_epsilon`, `target_delta`: the (ε, δ) target.
/// - `opts`: search bracket, tolerance, iteration cap.
///
/// Returns
/// -------
/// `PrivacyResult<Calibrated<M>>` whose `epsilon` lies within
/// `opts.tol_epsilon` of `target_epsilon`.
///
/// Errors
/// ------
/// - [`PrivacyError::InvalidTarget`] if `target_epsilon ≤ 0` or
///   `target_delta ∉ (0, 1)` (or either is non-finite).
/// - [`PrivacyError::CalibrationDivergence`] if the bracket does not contain
///   the target or the search ends outside the tolerance.
/// - Any family/oracle error, unchanged.
pub fn calibrate<F, M>(
    family: F, target_epsilon: f64, target_delta: f64, opts: &CalibrationOptions,
) -> PrivacyResult<Calibrated<M>>
where
    F: Fn(f64) -> PrivacyResult<M>,
    M: Accountant,
{
    validate_target(target_epsilon, target_delta)?;
    let problem = EpsilonGap::new(&family, target_epsilon, target_delta);
    let eps_at_lower = problem.epsilon_at(opts.lower_scale)?;
    let eps_at_upper = problem.epsilon_at(opts.upper_scale)?;
    debug!(
        eps_at_lower,
        eps_at_upper,
        lower_scale = opts.lower_scale,
        upper_scale = opts.upper_scale,
        "calibration bracket evaluated"
    );

    let within_tol = |eps: f64| (eps - target_epsilon).abs() <= opts.tol_epsilon;
    if within_tol(eps_at_lower) {
        return accept(&family, opts.lower_scale, target_epsilon, target_delta, opts, 0);
    }
    if within_tol(eps_at_upper) {
        return accept(&family, opts.upper_scale, target_epsilon, target_delta, opts, 0);
    }
    if eps_at_lower < target_epsilon {
        return Err(PrivacyError::CalibrationDivergence {
            target: target_epsilon,
            achieved: eps_at_lower,
            reason: "target epsilon is above what the smallest scale in the bracket achieves",
        });
    }
    if eps_at_upper > target_epsilon {
        return Err(PrivacyError::CalibrationDivergence {
            target: target_epsilon,
            achieved: eps_at_upper,
            reason: "target epsilon is below what the largest scale in the bracket achieves",
        });
    }

    let outcome =
        run_brent_root(problem, opts.lower_scale.ln(), opts.upper_scale.ln(), opts)?;
    debug!(iterations = outcome.iterations, status = %outcome.status, "brent search finished");
    accept(&family, outcome.log_scale.exp(), target_epsilon, target_delta, opts, outcome.iterations)
}

/// Resolve `request` into a [`ScaledCoinpress`] family and calibrate it.
pub fn calibrate_request(
    request: &CalibrationRequest, p_sampling: f64, sample_each_step: bool,
    oracle: Arc<dyn ApproxDpOracle>, opts: &CalibrationOptions,
) -> PrivacyResult<Calibrated<CoinpressMechanism>> {
    let (epsilon, delta) = request.target();
    info!(?request, p_sampling, "calibrating mechanism");
    let family = request.family(p_sampling, sample_each_step, oracle)?;
    let calibrated = calibrate(|scale| family.at_scale(scale), epsilon, delta, opts)?;
    info!(
        epsilon = calibrated.epsilon,
        scale = calibrated.scale,
        rho = calibrated.mechanism.budgets().total(),
        "calibrated mechanism"
    );
    Ok(calibrated)
}

fn accept<F, M>(
    family: &F, scale: f64, target_epsilon: f64, delta: f64, opts: &CalibrationOptions,
    iterations: usize,
) -> PrivacyResult<Calibrated<M>>
where
    F: Fn(f64) -> PrivacyResult<M>,
    M: Accountant,
{
    let mechanism = family(scale)?;
    let epsilon = mechanism.approx_dp(delta)?;
    if !epsilon.is_finite() || (epsilon - target_epsilon).abs() > opts.tol_epsilon {
        return Err(PrivacyError::CalibrationDivergence {
            target: target_epsilon,
            achieved: epsilon,
            reason: "search stopped outside the epsilon tolerance",
        });
    }
    Ok(Calibrated { mechanism, scale, epsilon, delta, iterations })
}

fn validate_target(epsilon: f64, delta: f64) -> PrivacyResult<()> {
    let eps_ok = epsilon.is_finite() && epsilon > 0.0;
    let delta_ok = delta.is_finite() && delta > 0.0 && delta < 1.0;
    if !eps_ok || !delta_ok {
        return Err(PrivacyError::InvalidTarget { epsilon, delta });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::{accountant::ZcdpOracle, mechanism::MechanismParams};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Convergence on a synthetic, strictly decreasing family.
    // - Divergence when the target lies outside the bracket on either side.
    // - Target validation.
    // - Calibration of the real CoinPress family through a request.
    // -------------------------------------------------------------------------

    /// Synthetic mechanism whose epsilon is `k / scale`.
    struct Inverse {
        params: MechanismParams,
        k: f64,
    }

    impl Accountant for Inverse {
        fn approx_dp(&self, _delta: f64) -> PrivacyResult<f64> {
            Ok(self.k / self.params.scale)
        }

        fn params(&self) -> &MechanismParams {
            &self.params
        }
    }

    fn inverse_family(k: f64) -> impl Fn(f64) -> PrivacyResult<Inverse> {
        move |scale| {
            Ok(Inverse {
                params: MechanismParams {
                    scale,
                    budgets: PrivacyBudgetSequence::new(vec![1.0]).unwrap(),
                    p_sampling: 1.0,
                    sample_each_step: false,
                },
                k,
            })
        }
    }

    #[test]
    // Purpose
    // -------
    // The search converges on a strictly decreasing synthetic family.
    //
    // Given
    // -----
    // - ε(s) = 3.7 / s, target (1.0, 1e-5), default options.
    //
    // Expect
    // ------
    // - |ε − 1| ≤ tol and scale ≈ 3.7.
    fn calibrate_converges_on_monotone_family() {
        // Arrange
        let opts = CalibrationOptions::default();

        // Act
        let out = calibrate(inverse_family(3.7), 1.0, 1e-5, &opts).unwrap();

        // Assert
        assert!((out.epsilon - 1.0).abs() <= opts.tol_epsilon, "eps = {}", out.epsilon);
        assert!((out.scale - 3.7).abs() < 1e-2, "scale = {}", out.scale);
        assert_eq!(out.mechanism.params().scale, out.scale);
    }

    #[test]
    // Purpose
    // -------
    // Targets outside the reachable epsilon range diverge.
    //
    // Given
    // -----
    // - ε(s) = 1 / s on [1e-3, 1e3] ⇒ reachable ε ∈ [1e-3, 1e3].
    //
    // Expect
    // ------
    // - CalibrationDivergence for targets 1e4 and 1e-5.
    fn calibrate_reports_divergence_outside_bracket() {
        let opts = CalibrationOptions::default();
        assert!(matches!(
            calibrate(inverse_family(1.0), 1e4, 1e-5, &opts),
            Err(PrivacyError::CalibrationDivergence { .. })
        ));
        assert!(matches!(
            calibrate(inverse_family(1.0), 1e-5, 1e-5, &opts),
            Err(PrivacyError::CalibrationDivergence { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Non-positive targets are rejected before any evaluation.
    //
    // Given
    // -----
    // - (ε, δ) ∈ {(0, 1e-5), (1, 0), (-1, 1e-5)}.
    //
    // Expect
    // ------
    // - InvalidTarget.
    fn calibrate_rejects_invalid_targets() {
        let opts = CalibrationOptions::default();
        for (eps, delta) in [(0.0, 1e-5), (1.0, 0.0), (-1.0, 1e-5)] {
            assert!(matches!(
                calibrate(inverse_family(1.0), eps, delta, &opts),
                Err(PrivacyError::InvalidTarget { .. })
            ));
        }
    }

    #[test]
    // Purpose
    // -------
    // A schedule request calibrates the CoinPress family with the zCDP oracle.
    //
    // Given
    // -----
    // - ε = 2, δ = 1e-5, linear policy over 10 steps.
    //
    // Expect
    // ------
    // - Achieved ε within tolerance, 10 budgets, ρ matching the oracle's inverse.
    fn schedule_request_calibrates_coinpress_family() {
        // Arrange
        let request = CalibrationRequest::ByScheduleShape {
            epsilon: 2.0,
            delta: 1e-5,
            dist: BudgetPolicy::Linear,
            order: 1.0,
            steps: 10,
        };
        let opts = CalibrationOptions::default();

        // Act
        let out = calibrate_request(&request, 1.0, false, Arc::new(ZcdpOracle), &opts).unwrap();

        // Assert
        assert!((out.epsilon - 2.0).abs() <= opts.tol_epsilon);
        assert_eq!(out.mechanism.budgets().len(), 10);
        let rho = out.mechanism.budgets().total();
        let eps = rho + 2.0 * (rho * 1e5_f64.ln()).sqrt();
        assert!((eps - out.epsilon).abs() < 1e-9);
    }
}

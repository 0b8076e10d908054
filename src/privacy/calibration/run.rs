//! Execution helper that runs `argmin`'s Brent root finder on an
//! [`EpsilonGap`] problem and returns a crate-friendly [`SearchOutcome`].
use argmin::{
    core::{Executor, State},
    solver::brent::BrentRoot,
};

use crate::privacy::{
    accountant::Accountant,
    calibration::{adapter::EpsilonGap, options::CalibrationOptions},
    errors::{PrivacyError, PrivacyResult},
};

/// Brent's own convergence tolerance on `u = ln(scale)`; acceptance is
/// decided on the epsilon gap afterwards.
const LOG_SCALE_TOL: f64 = 1e-12;

/// Raw result of the Brent search in log-scale space.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub log_scale: f64,
    pub iterations: usize,
    pub status: String,
}

/// Run Brent's method on `problem` over `[log_lower, log_upper]`.
///
/// The caller guarantees that the gap changes sign across the bracket;
/// `BrentRoot` rejects an unbracketed interval with an `InvalidParameter`
/// error, surfaced here as [`PrivacyError::SolverInvalidParameter`].
///
/// # Feature flags
/// With `obs_slog` and `opts.verbose`, a terminal slog observer prints every
/// iteration.
///
/// # Errors
/// - Propagates oracle/family errors raised inside cost evaluations.
/// - [`PrivacyError::CalibrationDivergence`] if the solver ends without any
///   parameter estimate.
pub fn run_brent_root<F, M>(
    problem: EpsilonGap<'_, F>, log_lower: f64, log_upper: f64, opts: &CalibrationOptions,
) -> PrivacyResult<SearchOutcome>
where
    F: Fn(f64) -> PrivacyResult<M>,
    M: Accountant,
{
    let target = problem.target_epsilon;
    let solver = BrentRoot::new(log_lower, log_upper, LOG_SCALE_TOL);
    let max_iter = opts.max_iter as u64;
    #[allow(unused_mut)]
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.max_iters(max_iter));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    // Brent keeps its best root estimate in the current iterate `b`.
    let result = optimizer.run()?;
    let state = result.state();
    let log_scale = state.get_param().or_else(|| state.get_best_param()).copied().ok_or(
        PrivacyError::CalibrationDivergence {
            target,
            achieved: f64::NAN,
            reason: "root finder returned no parameter estimate",
        },
    )?;
    Ok(SearchOutcome {
        log_scale,
        iterations: state.get_iter() as usize,
        status: format!("{:?}", state.get_termination_status()),
    })
}

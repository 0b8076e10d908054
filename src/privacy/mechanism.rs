//! privacy::mechanism — materialized CoinPress mechanisms and scale families.
//!
//! Purpose
//! -------
//! Describe the parameters of the iterative Gaussian mean mechanism
//! ([`MechanismParams`]), pair them with an accounting oracle
//! ([`CoinpressMechanism`]), and provide the one-parameter family
//! ([`ScaledCoinpress`]) that the calibrator searches over.
//!
//! Key behaviors
//! -------------
//! - A family holds a *base* budget shape at scale 1; at scale `s` every
//!   round receives `ρᵢ(s) = baseᵢ / s²`. Larger scales therefore release
//!   less budget and report a smaller epsilon.
//! - Two family constructors mirror the two calibration requests:
//!   [`ScaledCoinpress::by_schedule`] (shape from a [`BudgetPolicy`]) and
//!   [`ScaledCoinpress::by_budgets`] (shape from caller-provided budgets).
//! - [`CoinpressMechanism::precalibrated`] wraps an already-known budget
//!   sequence without any search.
//!
//! Invariants & assumptions
//! ------------------------
//! - `p_sampling ∈ (0, 1]`; `scale` finite and `> 0`.
//! - Mechanisms are immutable after construction; calibration builds a
//!   fresh instance per trial.
//!
//! Testing notes
//! -------------
//! - Unit tests check the `1/s²` scaling, parameter validation, and that
//!   the reported epsilon decreases with scale.

use std::sync::Arc;

use crate::privacy::{
    accountant::{Accountant, ApproxDpOracle},
    errors::{PrivacyError, PrivacyResult},
    schedule::{BudgetPolicy, PrivacyBudgetSequence, schedule},
};

/// Parameters of one concrete mechanism instance.
///
/// Fields
/// ------
/// - `scale`: noise scale the budgets were derived at.
/// - `budgets`: per-round zCDP budgets (`len()` = number of rounds).
/// - `p_sampling`: subsampling ratio applied before estimation.
/// - `sample_each_step`: per-round resampling flag; declared but rejected
///   at estimation time.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismParams {
    pub scale: f64,
    pub budgets: PrivacyBudgetSequence,
    pub p_sampling: f64,
    pub sample_each_step: bool,
}

/// Iterative Gaussian mean mechanism bound to an accounting oracle.
#[derive(Debug, Clone)]
pub struct CoinpressMechanism {
    params: MechanismParams,
    oracle: Arc<dyn ApproxDpOracle>,
}

impl CoinpressMechanism {
    pub fn new(params: MechanismParams, oracle: Arc<dyn ApproxDpOracle>) -> PrivacyResult<Self> {
        validate_scale(params.scale)?;
        validate_p_sampling(params.p_sampling)?;
        Ok(Self { params, oracle })
    }

    /// Wrap a known budget sequence at scale 1, skipping calibration.
    pub fn precalibrated(
        budgets: PrivacyBudgetSequence, p_sampling: f64, sample_each_step: bool,
        oracle: Arc<dyn ApproxDpOracle>,
    ) -> PrivacyResult<Self> {
        Self::new(MechanismParams { scale: 1.0, budgets, p_sampling, sample_each_step }, oracle)
    }

    pub fn budgets(&self) -> &PrivacyBudgetSequence {
        &self.params.budgets
    }
}

impl Accountant for CoinpressMechanism {
    fn approx_dp(&self, delta: f64) -> PrivacyResult<f64> {
        let eps = self.oracle.epsilon(&self.params, delta)?;
        if !eps.is_finite() {
            return Err(PrivacyError::NonFiniteEpsilon { scale: self.params.scale, value: eps });
        }
        Ok(eps)
    }

    fn params(&self) -> &MechanismParams {
        &self.params
    }
}

/// ScaledCoinpress — one-parameter mechanism family over the noise scale.
///
/// Parameters
/// ----------
/// Constructed via [`ScaledCoinpress::by_schedule`] or
/// [`ScaledCoinpress::by_budgets`]; materialized with
/// [`ScaledCoinpress::at_scale`].
///
/// Invariants
/// ----------
/// - `base` sums to a strictly positive total, so every scale yields a
///   non-trivial mechanism.
#[derive(Debug, Clone)]
pub struct ScaledCoinpress {
    base: PrivacyBudgetSequence,
    p_sampling: f64,
    sample_each_step: bool,
    oracle: Arc<dyn ApproxDpOracle>,
}

impl ScaledCoinpress {
    /// Family whose shape follows `policy` over `steps` rounds (unit total at scale 1).
    pub fn by_schedule(
        steps: usize, policy: BudgetPolicy, order: f64, p_sampling: f64, sample_each_step: bool,
        oracle: Arc<dyn ApproxDpOracle>,
    ) -> PrivacyResult<Self> {
        let base = schedule(1.0, steps, policy, order)?;
        Self::by_budgets(base, p_sampling, sample_each_step, oracle)
    }

    /// Family whose shape is the caller's explicit budget sequence at scale 1.
    pub fn by_budgets(
        base: PrivacyBudgetSequence, p_sampling: f64, sample_each_step: bool,
        oracle: Arc<dyn ApproxDpOracle>,
    ) -> PrivacyResult<Self> {
        validate_p_sampling(p_sampling)?;
        let total = base.total();
        if total <= 0.0 {
            return Err(PrivacyError::InvalidParameter {
                name: "budgets",
                value: total,
                reason: "budget shape must have a positive total",
            });
        }
        Ok(Self { base, p_sampling, sample_each_step, oracle })
    }

    /// Materialize the mechanism at `scale`.
    pub fn at_scale(&self, scale: f64) -> PrivacyResult<CoinpressMechanism> {
        validate_scale(scale)?;
        let budgets = self.base.scaled(1.0 / (scale * scale))?;
        CoinpressMechanism::new(
            MechanismParams {
                scale,
                budgets,
                p_sampling: self.p_sampling,
                sample_each_step: self.sample_each_step,
            },
            Arc::clone(&self.oracle),
        )
    }

    pub fn steps(&self) -> usize {
        self.base.len()
    }
}

fn validate_scale(scale: f64) -> PrivacyResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PrivacyError::InvalidParameter {
            name: "scale",
            value: scale,
            reason: "must be finite and > 0",
        });
    }
    Ok(())
}

pub(crate) fn validate_p_sampling(p_sampling: f64) -> PrivacyResult<()> {
    if !p_sampling.is_finite() || p_sampling <= 0.0 || p_sampling > 1.0 {
        return Err(PrivacyError::InvalidParameter {
            name: "p_sampling",
            value: p_sampling,
            reason: "must lie in (0, 1]",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::accountant::ZcdpOracle;
    use approx::assert_relative_eq;

    fn oracle() -> Arc<dyn ApproxDpOracle> {
        Arc::new(ZcdpOracle)
    }

    #[test]
    // Purpose
    // -------
    // Budgets scale as 1/s² and keep the family's shape.
    //
    // Given
    // -----
    // - A linear family over 5 steps, materialized at s = 1 and s = 2.
    //
    // Expect
    // ------
    // - Total 1 at s = 1, total 0.25 at s = 2, entrywise ratio 4.
    fn at_scale_divides_budgets_by_scale_squared() {
        // Arrange
        let family =
            ScaledCoinpress::by_schedule(5, BudgetPolicy::Linear, 1.0, 1.0, false, oracle())
                .unwrap();

        // Act
        let unit = family.at_scale(1.0).unwrap();
        let half = family.at_scale(2.0).unwrap();

        // Assert
        assert_relative_eq!(unit.budgets().total(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(half.budgets().total(), 0.25, epsilon = 1e-12);
        for (a, b) in unit.budgets().iter().zip(half.budgets().iter()) {
            assert_relative_eq!(a / b, 4.0, epsilon = 1e-9);
        }
        assert_eq!(half.params().scale, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Reported epsilon decreases as the scale grows.
    //
    // Given
    // -----
    // - Equal family over 10 steps, scales 0.5, 1, 4, δ = 1e-5.
    //
    // Expect
    // ------
    // - Strictly decreasing epsilons.
    fn epsilon_decreases_with_scale() {
        let family =
            ScaledCoinpress::by_schedule(10, BudgetPolicy::Equal, 1.0, 1.0, false, oracle())
                .unwrap();
        let eps: Vec<f64> = [0.5, 1.0, 4.0]
            .iter()
            .map(|&s| family.at_scale(s).unwrap().approx_dp(1e-5).unwrap())
            .collect();
        assert!(eps[0] > eps[1] && eps[1] > eps[2], "Got: {eps:?}");
    }

    #[test]
    // Purpose
    // -------
    // Invalid scales, sampling ratios, and all-zero shapes are rejected.
    //
    // Given
    // -----
    // - scale = 0, p_sampling = 1.5, base = [0, 0].
    //
    // Expect
    // ------
    // - InvalidParameter naming the offending field.
    fn family_rejects_invalid_inputs() {
        let family =
            ScaledCoinpress::by_schedule(3, BudgetPolicy::Equal, 1.0, 1.0, false, oracle())
                .unwrap();
        assert!(matches!(
            family.at_scale(0.0),
            Err(PrivacyError::InvalidParameter { name: "scale", .. })
        ));
        assert!(matches!(
            ScaledCoinpress::by_schedule(3, BudgetPolicy::Equal, 1.0, 1.5, false, oracle()),
            Err(PrivacyError::InvalidParameter { name: "p_sampling", .. })
        ));
        let zeros = PrivacyBudgetSequence::new(vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            ScaledCoinpress::by_budgets(zeros, 1.0, false, oracle()),
            Err(PrivacyError::InvalidParameter { name: "budgets", .. })
        ));
    }
}

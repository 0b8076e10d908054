//! privacy::accountant — the accounting-oracle capability.
//!
//! The crate never implements composition theorems itself. It consumes an
//! oracle that converts a mechanism's internal zCDP parameters into an
//! approximate-DP epsilon for a given delta, and exposes mechanisms through
//! a two-operation [`Accountant`] interface so any backend can be swapped in.
//!
//! [`ZcdpOracle`] is the reference backend: the standard
//! `ε = ρ + 2·sqrt(ρ·ln(1/δ))` conversion on the summed budget. It does not
//! credit subsampling amplification, which keeps its answer a valid upper
//! bound for every `p_sampling`.

use crate::privacy::{
    errors::{PrivacyError, PrivacyResult},
    mechanism::MechanismParams,
};

/// External conversion from mechanism parameters to approximate-DP epsilon.
///
/// Implementations must be monotone in the budget: scaling every round's
/// budget down never increases the reported epsilon. The calibration search
/// relies on this.
pub trait ApproxDpOracle: Send + Sync + std::fmt::Debug {
    fn epsilon(&self, params: &MechanismParams, delta: f64) -> PrivacyResult<f64>;
}

/// Read-only view of a materialized mechanism.
pub trait Accountant {
    /// Achieved epsilon under (ε, δ)-approximate DP.
    fn approx_dp(&self, delta: f64) -> PrivacyResult<f64>;

    /// Current parameters.
    fn params(&self) -> &MechanismParams;
}

/// Reference zCDP → (ε, δ) oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZcdpOracle;

impl ApproxDpOracle for ZcdpOracle {
    fn epsilon(&self, params: &MechanismParams, delta: f64) -> PrivacyResult<f64> {
        if !delta.is_finite() || delta <= 0.0 || delta >= 1.0 {
            return Err(PrivacyError::InvalidParameter {
                name: "delta",
                value: delta,
                reason: "must lie in (0, 1)",
            });
        }
        let rho = params.budgets.total();
        Ok(rho + 2.0 * (rho * (1.0 / delta).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::schedule::PrivacyBudgetSequence;
    use approx::assert_relative_eq;

    fn params_with_total(total: f64) -> MechanismParams {
        MechanismParams {
            scale: 1.0,
            budgets: PrivacyBudgetSequence::new(vec![total / 2.0, total / 2.0]).unwrap(),
            p_sampling: 1.0,
            sample_each_step: false,
        }
    }

    #[test]
    // Purpose
    // -------
    // The reference conversion matches its closed form.
    //
    // Given
    // -----
    // - ρ = 0.5 split over two rounds, δ = 1e-5.
    //
    // Expect
    // ------
    // - ε = 0.5 + 2·sqrt(0.5·ln(1e5)).
    fn zcdp_oracle_matches_closed_form() {
        // Arrange
        let params = params_with_total(0.5);

        // Act
        let eps = ZcdpOracle.epsilon(&params, 1e-5).unwrap();

        // Assert
        assert_relative_eq!(eps, 0.5 + 2.0 * (0.5 * 1e5_f64.ln()).sqrt(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Less budget never reports more epsilon.
    //
    // Given
    // -----
    // - Totals 0.01 < 0.1 < 1.0 at δ = 1e-6.
    //
    // Expect
    // ------
    // - Strictly increasing epsilons.
    fn zcdp_oracle_is_monotone_in_budget() {
        let eps: Vec<f64> = [0.01, 0.1, 1.0]
            .iter()
            .map(|&t| ZcdpOracle.epsilon(&params_with_total(t), 1e-6).unwrap())
            .collect();
        assert!(eps[0] < eps[1] && eps[1] < eps[2], "Got: {eps:?}");
    }

    #[test]
    // Purpose
    // -------
    // Out-of-range deltas are rejected.
    //
    // Given
    // -----
    // - δ ∈ {0, 1, NaN}.
    //
    // Expect
    // ------
    // - InvalidParameter naming delta.
    fn zcdp_oracle_rejects_invalid_delta() {
        let params = params_with_total(1.0);
        for &delta in &[0.0, 1.0, f64::NAN] {
            assert!(matches!(
                ZcdpOracle.epsilon(&params, delta),
                Err(PrivacyError::InvalidParameter { name: "delta", .. })
            ));
        }
    }
}

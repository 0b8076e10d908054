//! Adapter that exposes an epsilon gap as an `argmin` root-finding problem.
//!
//! The search runs in log-scale space `u = ln(scale)` so that a bracket
//! spanning several orders of magnitude is bisected evenly. The cost is the
//! signed gap `g(u) = ε(e^u) − ε_target`, strictly decreasing in `u` for a
//! monotone family; Brent's method locates its root.
use argmin::core::{CostFunction, Error};

use crate::privacy::{
    accountant::Accountant,
    errors::{PrivacyError, PrivacyResult},
};

/// Bridges a scale → mechanism family to `argmin`'s `CostFunction`.
pub struct EpsilonGap<'a, F> {
    pub family: &'a F,
    pub target_epsilon: f64,
    pub delta: f64,
}

impl<'a, F, M> EpsilonGap<'a, F>
where
    F: Fn(f64) -> PrivacyResult<M>,
    M: Accountant,
{
    pub fn new(family: &'a F, target_epsilon: f64, delta: f64) -> Self {
        Self { family, target_epsilon, delta }
    }

    /// Achieved epsilon of the family member at `scale`.
    ///
    /// # Errors
    /// - Propagates family/oracle errors.
    /// - [`PrivacyError::NonFiniteEpsilon`] if the oracle answers NaN/∞.
    pub fn epsilon_at(&self, scale: f64) -> PrivacyResult<f64> {
        let mechanism = (self.family)(scale)?;
        let eps = mechanism.approx_dp(self.delta)?;
        if !eps.is_finite() {
            return Err(PrivacyError::NonFiniteEpsilon { scale, value: eps });
        }
        Ok(eps)
    }
}

impl<'a, F, M> CostFunction for EpsilonGap<'a, F>
where
    F: Fn(f64) -> PrivacyResult<M>,
    M: Accountant,
{
    type Param = f64;
    type Output = f64;

    /// Evaluate `ε(e^u) − ε_target`.
    ///
    /// # Errors
    /// Any [`PrivacyError`] is boxed into `argmin::core::Error` and recovered
    /// intact by `From<Error> for PrivacyError`.
    fn cost(&self, log_scale: &Self::Param) -> Result<Self::Output, Error> {
        let eps = self.epsilon_at(log_scale.exp())?;
        Ok(eps - self.target_epsilon)
    }
}

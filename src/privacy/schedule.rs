//! privacy::schedule — per-round zCDP budget sequences.
//!
//! Purpose
//! -------
//! Split a total zCDP allowance `ρ` across `t` estimation rounds according to
//! a named distribution policy, producing a validated
//! [`PrivacyBudgetSequence`] that the estimator consumes round by round and
//! the accounting oracle sums.
//!
//! Key behaviors
//! -------------
//! - [`BudgetPolicy`] enumerates the four supported curves and parses the
//!   short (`eq`, `lin`, `exp`, `log`) and long names case-insensitively.
//! - [`schedule`] evaluates the curve on the normalized round index
//!   `xᵢ = (i + 1) / t ∈ (0, 1]` and rescales so that `∑ ρᵢ = ρ` exactly.
//! - [`PrivacyBudgetSequence`] guards the sequence invariants (non-empty,
//!   finite, non-negative) for every other constructor in the crate.
//!
//! Invariants & assumptions
//! ------------------------
//! - `len()` equals the requested step count; all entries are `≥ 0`.
//! - Non-equal curves are non-decreasing in the round index, so later
//!   (finer) rounds never receive less budget than earlier ones.
//! - The last entry absorbs the floating-point residual of the rescaling;
//!   the sum equals `ρ` up to a single rounding of the final subtraction.
//!
//! Conventions
//! -----------
//! - Weights: `eq: 1`, `lin: 1 + order·x`, `exp: exp(order·x)`,
//!   `log: ln(1 + order·x)`. `order` is ignored by `eq`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the budget-sum invariant for every policy, the equal
//!   policy's identical entries, monotonicity, parsing, and error paths.

use std::str::FromStr;

use crate::privacy::errors::{PrivacyError, PrivacyResult};

/// Distribution policy used to spread a total budget over rounds.
///
/// Parsing accepts `"eq" | "equal"`, `"lin" | "linear"`,
/// `"exp" | "exponential"`, and `"log" | "logarithmic"` in any case.
/// Unknown names return [`PrivacyError::InvalidPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPolicy {
    Equal,
    Linear,
    Exponential,
    Logarithmic,
}

impl BudgetPolicy {
    /// Short name used by the configuration surface.
    pub fn short_name(&self) -> &'static str {
        match self {
            BudgetPolicy::Equal => "eq",
            BudgetPolicy::Linear => "lin",
            BudgetPolicy::Exponential => "exp",
            BudgetPolicy::Logarithmic => "log",
        }
    }

    fn weight(&self, x: f64, order: f64) -> f64 {
        match self {
            BudgetPolicy::Equal => 1.0,
            BudgetPolicy::Linear => 1.0 + order * x,
            BudgetPolicy::Exponential => (order * x).exp(),
            BudgetPolicy::Logarithmic => (order * x).ln_1p(),
        }
    }
}

impl FromStr for BudgetPolicy {
    type Err = PrivacyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" | "equal" => Ok(BudgetPolicy::Equal),
            "lin" | "linear" => Ok(BudgetPolicy::Linear),
            "exp" | "exponential" => Ok(BudgetPolicy::Exponential),
            "log" | "logarithmic" => Ok(BudgetPolicy::Logarithmic),
            _ => Err(PrivacyError::InvalidPolicy { name: s.to_string() }),
        }
    }
}

/// PrivacyBudgetSequence — validated per-round zCDP budgets.
///
/// Fields
/// ------
/// - private `Vec<f64>`; one entry per round, each finite and `≥ 0`.
///
/// Invariants
/// ----------
/// - Non-empty.
/// - `total()` is the zCDP cost `ρ` of running all rounds once.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivacyBudgetSequence {
    budgets: Vec<f64>,
}

impl PrivacyBudgetSequence {
    /// Validate and wrap an explicit budget vector.
    ///
    /// # Errors
    /// - [`PrivacyError::InvalidSteps`] if `budgets` is empty.
    /// - [`PrivacyError::InvalidBudget`] for the first negative or
    ///   non-finite entry.
    pub fn new(budgets: Vec<f64>) -> PrivacyResult<Self> {
        if budgets.is_empty() {
            return Err(PrivacyError::InvalidSteps { steps: 0 });
        }
        if let Some((index, &value)) =
            budgets.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(PrivacyError::InvalidBudget { index, value });
        }
        Ok(Self { budgets })
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }

    /// Total zCDP budget consumed by the whole sequence.
    pub fn total(&self) -> f64 {
        self.budgets.iter().sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.budgets
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.budgets.iter()
    }

    /// Multiply every entry by `factor` (finite, `≥ 0`).
    pub fn scaled(&self, factor: f64) -> PrivacyResult<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(PrivacyError::InvalidParameter {
                name: "factor",
                value: factor,
                reason: "budget scaling factor must be finite and >= 0",
            });
        }
        Self::new(self.budgets.iter().map(|b| b * factor).collect())
    }
}

/// schedule — split `total_rho` over `steps` rounds following `policy`.
///
/// Parameters
/// ----------
/// - `total_rho`: `f64`
///   Total zCDP budget; finite and `≥ 0`.
/// - `steps`: `usize`
///   Number of rounds; must be `≥ 1`.
/// - `policy`: [`BudgetPolicy`]
///   Curve shape over the normalized round index.
/// - `order`: `f64`
///   Shape parameter for non-equal curves; finite and `> 0`.
///
/// Returns
/// -------
/// `PrivacyResult<PrivacyBudgetSequence>` of length `steps` summing to
/// `total_rho`.
///
/// Errors
/// ------
/// - [`PrivacyError::InvalidSteps`] when `steps == 0`.
/// - [`PrivacyError::InvalidParameter`] for a negative/non-finite
///   `total_rho` or an invalid `order` under a non-equal policy.
///
/// Examples
/// --------
/// ```rust
/// # use dp_prototypes::privacy::schedule::{BudgetPolicy, schedule};
/// let seq = schedule(0.5, 4, BudgetPolicy::Linear, 1.0).unwrap();
/// assert_eq!(seq.len(), 4);
/// assert!((seq.total() - 0.5).abs() < 1e-12);
/// ```
pub fn schedule(
    total_rho: f64, steps: usize, policy: BudgetPolicy, order: f64,
) -> PrivacyResult<PrivacyBudgetSequence> {
    if steps == 0 {
        return Err(PrivacyError::InvalidSteps { steps });
    }
    if !total_rho.is_finite() || total_rho < 0.0 {
        return Err(PrivacyError::InvalidParameter {
            name: "total_rho",
            value: total_rho,
            reason: "total budget must be finite and >= 0",
        });
    }
    if policy == BudgetPolicy::Equal {
        return PrivacyBudgetSequence::new(vec![total_rho / steps as f64; steps]);
    }
    if !order.is_finite() || order <= 0.0 {
        return Err(PrivacyError::InvalidParameter {
            name: "order",
            value: order,
            reason: "shape parameter must be finite and > 0",
        });
    }

    let weights: Vec<f64> = (0..steps)
        .map(|i| policy.weight((i + 1) as f64 / steps as f64, order))
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if !weight_sum.is_finite() || weight_sum <= 0.0 {
        return Err(PrivacyError::InvalidParameter {
            name: "order",
            value: order,
            reason: "shape parameter produces a degenerate weighting curve",
        });
    }

    let mut budgets: Vec<f64> = weights.iter().map(|w| total_rho * w / weight_sum).collect();
    let head: f64 = budgets[..steps - 1].iter().sum();
    budgets[steps - 1] = (total_rho - head).max(0.0);
    PrivacyBudgetSequence::new(budgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The budget-sum invariant for all four policies over several
    //   (total, steps, order) combinations.
    // - Identical entries under the equal policy.
    // - Monotone non-decreasing curves for the non-equal policies.
    // - Policy parsing and error paths of `schedule` and the sequence
    //   constructor.
    // -------------------------------------------------------------------------

    const ALL_POLICIES: [BudgetPolicy; 4] = [
        BudgetPolicy::Equal,
        BudgetPolicy::Linear,
        BudgetPolicy::Exponential,
        BudgetPolicy::Logarithmic,
    ];

    #[test]
    // Purpose
    // -------
    // Every policy distributes exactly the requested total.
    //
    // Given
    // -----
    // - Totals {1e-3, 0.08, 1.0, 37.5}, steps {1, 2, 10, 97}, orders {0.3, 1, 4}.
    //
    // Expect
    // ------
    // - |∑ρᵢ − ρ| ≤ 1e-9 and len == steps.
    fn schedule_sums_to_total_for_all_policies() {
        for &policy in &ALL_POLICIES {
            for &total in &[1e-3, 0.08, 1.0, 37.5] {
                for &steps in &[1usize, 2, 10, 97] {
                    for &order in &[0.3, 1.0, 4.0] {
                        // Act
                        let seq = schedule(total, steps, policy, order).unwrap();

                        // Assert
                        assert_eq!(seq.len(), steps);
                        assert!(
                            (seq.total() - total).abs() <= 1e-9,
                            "{policy:?} total={total} steps={steps} order={order}: sum={}",
                            seq.total()
                        );
                        assert!(seq.iter().all(|&b| b >= 0.0));
                    }
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Equal policy yields identical entries ρ/t.
    //
    // Given
    // -----
    // - total = 0.9, steps = 6.
    //
    // Expect
    // ------
    // - Every entry equals 0.15.
    fn equal_policy_produces_identical_entries() {
        // Act
        let seq = schedule(0.9, 6, BudgetPolicy::Equal, 1.0).unwrap();

        // Assert
        for &b in seq.iter() {
            assert_relative_eq!(b, 0.9 / 6.0, epsilon = 1e-15);
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-equal curves hand out non-decreasing budgets.
    //
    // Given
    // -----
    // - total = 1.0, steps = 12, order = 2.
    //
    // Expect
    // ------
    // - ρᵢ ≤ ρᵢ₊₁ (up to rounding) and ρ₀ < ρ_last.
    fn non_equal_policies_are_non_decreasing() {
        for &policy in &ALL_POLICIES[1..] {
            // Act
            let seq = schedule(1.0, 12, policy, 2.0).unwrap();
            let b = seq.as_slice();

            // Assert
            for i in 0..b.len() - 1 {
                assert!(b[i] <= b[i + 1] + 1e-15, "{policy:?} not monotone at {i}: {b:?}");
            }
            assert!(b[0] < b[b.len() - 1], "{policy:?} should favor later rounds: {b:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Parsing accepts short and long names in any case and rejects others.
    //
    // Given
    // -----
    // - "EQ", "linear", "Exp", "log" and the unknown "cubic".
    //
    // Expect
    // ------
    // - The four known names map to their variants; "cubic" yields InvalidPolicy.
    fn policy_parsing_accepts_known_names_only() {
        assert_eq!("EQ".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::Equal);
        assert_eq!("linear".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::Linear);
        assert_eq!("Exp".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::Exponential);
        assert_eq!("log".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::Logarithmic);
        for &policy in &ALL_POLICIES {
            assert_eq!(policy.short_name().parse::<BudgetPolicy>().unwrap(), policy);
        }
        assert_eq!(
            "cubic".parse::<BudgetPolicy>(),
            Err(PrivacyError::InvalidPolicy { name: "cubic".to_string() })
        );
    }

    #[test]
    // Purpose
    // -------
    // Invalid inputs are rejected with the documented variants.
    //
    // Given
    // -----
    // - steps = 0; total = -1; order = 0 for a non-equal policy.
    //
    // Expect
    // ------
    // - InvalidSteps, then InvalidParameter for total and order.
    fn schedule_rejects_invalid_inputs() {
        assert_eq!(
            schedule(1.0, 0, BudgetPolicy::Equal, 1.0),
            Err(PrivacyError::InvalidSteps { steps: 0 })
        );
        assert!(matches!(
            schedule(-1.0, 3, BudgetPolicy::Linear, 1.0),
            Err(PrivacyError::InvalidParameter { name: "total_rho", .. })
        ));
        assert!(matches!(
            schedule(1.0, 3, BudgetPolicy::Exponential, 0.0),
            Err(PrivacyError::InvalidParameter { name: "order", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Explicit sequences are validated entry by entry.
    //
    // Given
    // -----
    // - An empty vector and a vector containing -0.1 at index 1.
    //
    // Expect
    // ------
    // - InvalidSteps and InvalidBudget { index: 1 } respectively.
    fn sequence_constructor_rejects_empty_and_negative() {
        assert_eq!(PrivacyBudgetSequence::new(vec![]), Err(PrivacyError::InvalidSteps { steps: 0 }));
        assert_eq!(
            PrivacyBudgetSequence::new(vec![0.1, -0.1]),
            Err(PrivacyError::InvalidBudget { index: 1, value: -0.1 })
        );
    }
}

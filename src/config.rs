//! config — caller-facing configuration for private prototype estimation.
//!
//! Purpose
//! -------
//! Hold the privacy target, budget shape, sampling settings, and the
//! calibrated mechanism in one validated struct, [`PrototypeConfig`], and
//! expose the two operations callers actually need: calibrate, then
//! estimate prototypes.
//!
//! Key behaviors
//! -------------
//! - Setters validate immediately and leave the config unchanged on error.
//! - Calibration is requested explicitly through a [`CalibrationRequest`];
//!   [`PrototypeConfig::schedule_request`] and
//!   [`PrototypeConfig::explicit_request`] build one from the current fields.
//! - Installing a mechanism over an existing one logs a warning and hands
//!   the previous mechanism back.
//! - [`PrototypeConfig::prototypes`] runs exactly the installed mechanism:
//!   its budgets, its `p_sampling`, and its `sample_each_step`. Changing
//!   those fields on the config afterwards only affects the next
//!   calibration. The seed and sampling mode are read from the config.
//!
//! Invariants & assumptions
//! ------------------------
//! - `epsilon > 0`, `0 < delta < 1`, `steps ≥ 1`, `order > 0`, and
//!   `p_sampling ∈ (0, 1]` whenever set.
//! - The installed mechanism is immutable; recalibrating replaces it.
//! - The epsilon reported at calibration describes the mechanism that
//!   `prototypes` executes.
use std::sync::Arc;

use ndarray::ArrayView2;
use tracing::{debug, warn};

use crate::{
    estimation::{
        coinpress::EstimatorOptions,
        prototypes::{PrototypeMatrix, PrototypeOptions, prototypes},
        subsample::SamplingMode,
    },
    privacy::{
        accountant::{Accountant, ApproxDpOracle, ZcdpOracle},
        calibration::{Calibrated, CalibrationOptions, CalibrationRequest, calibrate_request},
        errors::{PrivacyError, PrivacyResult},
        mechanism::{CoinpressMechanism, validate_p_sampling},
        schedule::{BudgetPolicy, PrivacyBudgetSequence},
    },
};

/// PrototypeConfig — privacy target, sampling settings, and mechanism.
///
/// Fields
/// ------
/// Target and shape (`epsilon`, `delta`, `steps`, `dist`) start unset and are
/// required only by the request that uses them. `order` defaults to 1,
/// `p_sampling` to 1, `sample_each_step` to false, `seed` to 42,
/// `sampling_mode` to Poisson; the oracle defaults to [`ZcdpOracle`].
/// `budget_shape` is an optional stored shape for explicit calibration.
#[derive(Debug, Clone)]
pub struct PrototypeConfig {
    epsilon: Option<f64>,
    delta: Option<f64>,
    steps: Option<usize>,
    dist: Option<BudgetPolicy>,
    order: f64,
    p_sampling: f64,
    sample_each_step: bool,
    seed: u64,
    sampling_mode: SamplingMode,
    pub estimator: EstimatorOptions,
    pub calibration: CalibrationOptions,
    oracle: Arc<dyn ApproxDpOracle>,
    budget_shape: Option<PrivacyBudgetSequence>,
    mechanism: Option<CoinpressMechanism>,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            epsilon: None,
            delta: None,
            steps: None,
            dist: None,
            order: 1.0,
            p_sampling: 1.0,
            sample_each_step: false,
            seed: 42,
            sampling_mode: SamplingMode::Poisson,
            estimator: EstimatorOptions::default(),
            calibration: CalibrationOptions::default(),
            oracle: Arc::new(ZcdpOracle),
            budget_shape: None,
            mechanism: None,
        }
    }
}

impl PrototypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with a mechanism built directly from known budgets, skipping
    /// calibration. The mechanism and the config share `p_sampling` and
    /// `sample_each_step`.
    ///
    /// # Errors
    /// - [`PrivacyError::InvalidParameter`] if `p_sampling ∉ (0, 1]`.
    pub fn with_budgets(
        budgets: PrivacyBudgetSequence, p_sampling: f64, sample_each_step: bool,
    ) -> PrivacyResult<Self> {
        let mut config = Self::default();
        config.set_p_sampling(p_sampling)?;
        config.set_sample_each_step(sample_each_step);
        let mechanism = CoinpressMechanism::precalibrated(
            budgets,
            config.p_sampling,
            config.sample_each_step,
            Arc::clone(&config.oracle),
        )?;
        config.mechanism = Some(mechanism);
        Ok(config)
    }

    // ---- Accessors ---------------------------------------------------------

    pub fn epsilon(&self) -> Option<f64> {
        self.epsilon
    }

    pub fn delta(&self) -> Option<f64> {
        self.delta
    }

    pub fn steps(&self) -> Option<usize> {
        self.steps
    }

    pub fn dist(&self) -> Option<BudgetPolicy> {
        self.dist
    }

    pub fn order(&self) -> f64 {
        self.order
    }

    pub fn p_sampling(&self) -> f64 {
        self.p_sampling
    }

    pub fn sample_each_step(&self) -> bool {
        self.sample_each_step
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sampling_mode(&self) -> SamplingMode {
        self.sampling_mode
    }

    pub fn budget_shape(&self) -> Option<&PrivacyBudgetSequence> {
        self.budget_shape.as_ref()
    }

    pub fn mechanism(&self) -> Option<&CoinpressMechanism> {
        self.mechanism.as_ref()
    }

    // ---- Validated setters -------------------------------------------------

    pub fn set_epsilon(&mut self, epsilon: f64) -> PrivacyResult<()> {
        positive("epsilon", epsilon)?;
        self.epsilon = Some(epsilon);
        Ok(())
    }

    pub fn set_delta(&mut self, delta: f64) -> PrivacyResult<()> {
        positive("delta", delta)?;
        if delta >= 1.0 {
            return Err(PrivacyError::InvalidParameter {
                name: "delta",
                value: delta,
                reason: "must be < 1",
            });
        }
        self.delta = Some(delta);
        Ok(())
    }

    pub fn set_steps(&mut self, steps: usize) -> PrivacyResult<()> {
        if steps == 0 {
            return Err(PrivacyError::InvalidSteps { steps });
        }
        self.steps = Some(steps);
        Ok(())
    }

    /// Set the budget policy by name (`eq`, `lin`, `exp`, `log`, or long forms).
    pub fn set_dist(&mut self, name: &str) -> PrivacyResult<()> {
        self.dist = Some(name.parse()?);
        Ok(())
    }

    pub fn set_policy(&mut self, policy: BudgetPolicy) {
        self.dist = Some(policy);
    }

    pub fn set_order(&mut self, order: f64) -> PrivacyResult<()> {
        positive("order", order)?;
        self.order = order;
        Ok(())
    }

    pub fn set_p_sampling(&mut self, p_sampling: f64) -> PrivacyResult<()> {
        validate_p_sampling(p_sampling)?;
        self.p_sampling = p_sampling;
        Ok(())
    }

    pub fn set_sample_each_step(&mut self, sample_each_step: bool) {
        self.sample_each_step = sample_each_step;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn set_sampling_mode(&mut self, mode: SamplingMode) {
        self.sampling_mode = mode;
    }

    /// Store an explicit budget shape for [`PrototypeConfig::explicit_request`].
    pub fn set_budget_shape(&mut self, shape: PrivacyBudgetSequence) {
        self.budget_shape = Some(shape);
    }

    pub fn set_oracle(&mut self, oracle: Arc<dyn ApproxDpOracle>) {
        self.oracle = oracle;
    }

    /// Install `mechanism`, returning the one it replaces.
    pub fn set_mechanism(&mut self, mechanism: CoinpressMechanism) -> Option<CoinpressMechanism> {
        let previous = self.mechanism.replace(mechanism);
        if previous.is_some() {
            warn!("overwriting existing mechanism");
        }
        previous
    }

    // ---- Calibration -------------------------------------------------------

    /// Request calibrating the configured schedule shape.
    ///
    /// # Errors
    /// - [`PrivacyError::MissingParameter`] naming the first unset field among
    ///   `epsilon`, `delta`, `dist`, `steps`.
    pub fn schedule_request(&self) -> PrivacyResult<CalibrationRequest> {
        Ok(CalibrationRequest::ByScheduleShape {
            epsilon: required("epsilon", self.epsilon)?,
            delta: required("delta", self.delta)?,
            dist: required("dist", self.dist)?,
            order: self.order,
            steps: required("steps", self.steps)?,
        })
    }

    /// Request calibrating an explicit budget shape.
    ///
    /// `budgets` takes precedence; `None` falls back to the stored
    /// [`PrototypeConfig::budget_shape`].
    ///
    /// # Errors
    /// - [`PrivacyError::MissingParameter`] for an unset `epsilon` or
    ///   `delta`, or `"budgets"` when neither shape is available.
    pub fn explicit_request(
        &self, budgets: Option<PrivacyBudgetSequence>,
    ) -> PrivacyResult<CalibrationRequest> {
        let epsilon = required("epsilon", self.epsilon)?;
        let delta = required("delta", self.delta)?;
        let budgets = required("budgets", budgets.or_else(|| self.budget_shape.clone()))?;
        Ok(CalibrationRequest::ByExplicitBudgets { epsilon, delta, budgets })
    }

    /// Calibrate `request` and install the resulting mechanism.
    ///
    /// The returned [`Calibrated`] carries the converged scale and achieved
    /// epsilon; the mechanism itself is kept in the config.
    pub fn calibrate(
        &mut self, request: &CalibrationRequest,
    ) -> PrivacyResult<Calibrated<CoinpressMechanism>> {
        let calibrated = calibrate_request(
            request,
            self.p_sampling,
            self.sample_each_step,
            Arc::clone(&self.oracle),
            &self.calibration,
        )?;
        self.set_mechanism(calibrated.mechanism.clone());
        Ok(calibrated)
    }

    // ---- Estimation --------------------------------------------------------

    /// Private prototypes of `points` grouped by `labels`.
    ///
    /// Subsampling follows the installed mechanism's parameters, so the
    /// executed mechanism is the one that was accounted for. Uses
    /// `seed_override` instead of the configured seed when given.
    ///
    /// # Errors
    /// - [`PrivacyError::NotCalibrated`] if no mechanism is installed.
    /// - [`PrivacyError::Estimation`] wrapping any estimation failure,
    ///   including `NotSupported` when the mechanism has `sample_each_step`.
    pub fn prototypes<L>(
        &self, points: ArrayView2<'_, f64>, labels: &[L], seed_override: Option<u64>,
    ) -> PrivacyResult<PrototypeMatrix<L>>
    where
        L: Ord + Clone + Send + Sync,
    {
        let mechanism = self.mechanism.as_ref().ok_or(PrivacyError::NotCalibrated)?;
        let params = mechanism.params();
        if params.p_sampling != self.p_sampling {
            debug!(
                mechanism_p = params.p_sampling,
                config_p = self.p_sampling,
                "p_sampling changed since calibration; running the installed mechanism"
            );
        }
        let opts = PrototypeOptions {
            subsample_ratio: params.p_sampling,
            sampling_mode: self.sampling_mode,
            sample_each_step: params.sample_each_step,
            seed: seed_override.unwrap_or(self.seed),
            estimator: self.estimator.clone(),
        };
        Ok(prototypes(points, labels, mechanism.budgets().as_slice(), &opts)?)
    }
}

fn positive(name: &'static str, value: f64) -> PrivacyResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PrivacyError::InvalidParameter { name, value, reason: "must be finite and > 0" });
    }
    Ok(())
}

fn required<T>(name: &'static str, value: Option<T>) -> PrivacyResult<T> {
    value.ok_or(PrivacyError::MissingParameter { name })
}

//! privacy — budget schedules, accounting, mechanisms, and calibration.
//!
//! Purpose
//! -------
//! Everything needed to decide *how much* noise the CoinPress estimator
//! adds: split a zCDP budget over rounds ([`schedule`]), translate
//! mechanism parameters into an (ε, δ) guarantee ([`accountant`]), describe
//! concrete mechanisms and their scale families ([`mechanism`]), and search
//! the scale matching a target ([`calibration`]).
//!
//! Key behaviors
//! -------------
//! - Budgets are per-round zCDP values `ρᵢ ≥ 0`; the estimator consumes them
//!   in order.
//! - The (ε, δ) conversion is pluggable through [`ApproxDpOracle`];
//!   [`ZcdpOracle`] is the default and deliberately ignores subsampling
//!   amplification, so its epsilon is an upper bound.
//!
//! Conventions
//! -----------
//! - All fallible functions return [`PrivacyResult<T>`]; errors raised by
//!   the estimation layer are wrapped in [`PrivacyError::Estimation`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries its own unit tests; the integration test in
//!   `tests/` drives calibration and estimation together.

pub mod accountant;
pub mod calibration;
pub mod errors;
pub mod mechanism;
pub mod schedule;

pub use self::accountant::{Accountant, ApproxDpOracle, ZcdpOracle};
pub use self::calibration::{
    Calibrated, CalibrationOptions, CalibrationRequest, calibrate, calibrate_request,
};
pub use self::errors::{PrivacyError, PrivacyResult};
pub use self::mechanism::{CoinpressMechanism, MechanismParams, ScaledCoinpress};
pub use self::schedule::{BudgetPolicy, PrivacyBudgetSequence, schedule};

pub mod prelude {
    pub use super::accountant::{Accountant, ApproxDpOracle, ZcdpOracle};
    pub use super::calibration::{CalibrationOptions, CalibrationRequest, calibrate_request};
    pub use super::errors::{PrivacyError, PrivacyResult};
    pub use super::mechanism::CoinpressMechanism;
    pub use super::schedule::{BudgetPolicy, PrivacyBudgetSequence};
}

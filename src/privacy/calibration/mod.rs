//! calibration — argmin-backed search for the noise scale hitting an (ε, δ) target.
//!
//! Purpose
//! -------
//! Turn a one-parameter mechanism family (scale → mechanism) into the single
//! member whose approximate-DP epsilon matches a requested target. The
//! family is generic; the CoinPress family is wired in via
//! [`CalibrationRequest`].
//!
//! Key behaviors
//! -------------
//! - [`calibrate`] validates the target, evaluates epsilon at both ends of
//!   the scale bracket, and accepts a bound directly when it already lies
//!   within tolerance.
//! - Otherwise [`run::run_brent_root`] runs `argmin`'s `BrentRoot` on the
//!   signed gap `ε(e^u) − ε_target` built by [`adapter::EpsilonGap`].
//! - The accepted mechanism is re-materialized at the converged scale and
//!   re-checked against `tol_epsilon`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Epsilon is non-increasing in the scale for every family passed in.
//! - [`CalibrationOptions`] are validated on construction; the search layer
//!   treats them as consistent.
//!
//! Downstream usage
//! ----------------
//! - `config::PrototypeConfig::calibrate` goes through
//!   [`calibrate_request`]; custom families call [`calibrate`] directly.
//!
//! Testing notes
//! -------------
//! - `api` tests use a synthetic `k / scale` family for convergence and
//!   divergence, plus one end-to-end CoinPress request.

pub mod adapter;
pub mod api;
pub mod options;
pub mod run;

pub use self::api::{Calibrated, CalibrationRequest, calibrate, calibrate_request};
pub use self::options::CalibrationOptions;

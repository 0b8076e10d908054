//! dp_prototypes — differentially private class prototypes with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes private prototype estimation to Python via the `_dp_prototypes`
//! extension module. Prototypes are per-class means of an embedding matrix,
//! released under an (ε, δ) guarantee by a calibrated, iterative
//! clip-and-noise estimator.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`privacy`] (budget schedules,
//!   accounting, calibration), [`estimation`] (subsampling, the iterative
//!   mean estimator, prototype assembly), and [`config`] (the caller-facing
//!   [`config::PrototypeConfig`]).
//! - With `python-bindings`, define the `CoinpressPrototyping` class and the
//!   free `private_mean` function, and register them in `_dp_prototypes`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - Python setters validate exactly as the Rust setters do; a rejected
//!   value raises `ValueError` and leaves the object unchanged.
//!
//! Conventions
//! -----------
//! - Python inputs are `(n, d)` float64 features and `(n,)` int64 labels;
//!   the prototype output is a `(k, d)` float64 array, rows in ascending
//!   label order.
//! - Errors are converted to `PyErr` at the boundary via the `From` impls in
//!   `privacy::errors` and `estimation::errors`.
//!
//! Downstream usage
//! ----------------
//! - Rust code typically builds a [`config::PrototypeConfig`], calls
//!   `calibrate` with a schedule or explicit request, then `prototypes`.
//! - Lower-level callers can drive [`estimation::prototypes()`] directly
//!   with any budget sequence.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds an end-to-end
//!   calibration + prototype run on synthetic Gaussian classes.
//! - No logging subscriber is installed here; tests and applications
//!   attach their own `tracing` subscriber if they want output.

pub mod config;
pub mod estimation;
pub mod privacy;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use rand::SeedableRng;

#[cfg(feature = "python-bindings")]
use rand_chacha::ChaCha20Rng;

#[cfg(feature = "python-bindings")]
use crate::{
    config::PrototypeConfig,
    utils::{extract_budgets, extract_f64_matrix, extract_i64_labels, steps_from_signed},
};

/// CoinpressPrototyping — Python-facing wrapper around [`config::PrototypeConfig`].
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `CoinpressPrototyping(epsilon=None, delta=None, steps=None, dist=None,
/// order=1.0, p_sampling=1.0, sample_each_step=False, seed=42, ps=None,
/// calibrated=False, verbose=False)`:
/// - `ps` with `calibrated=True` installs a mechanism from the given
///   budgets directly, using `p_sampling` and `sample_each_step`; without
///   `calibrated` it is stored as the shape `calibrate_budgets()` uses
///   when called with no argument.
/// - `steps` must be a positive integer; negative values raise
///   `ValueError`.
///
/// Notes
/// -----
/// - Calibration is never triggered implicitly; call `calibrate_steps()` or
///   `calibrate_budgets()` before `prototypes()`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "dp_prototypes")]
pub struct CoinpressPrototyping {
    inner: PrototypeConfig,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl CoinpressPrototyping {
    #[new]
    #[pyo3(
        signature = (
            epsilon = None,
            delta = None,
            steps = None,
            dist = None,
            order = 1.0,
            p_sampling = 1.0,
            sample_each_step = false,
            seed = 42,
            ps = None,
            calibrated = false,
            verbose = false,
        ),
        text_signature = "(epsilon=None, delta=None, steps=None, dist=None, order=1.0, \
                          p_sampling=1.0, sample_each_step=False, seed=42, ps=None, \
                          calibrated=False, verbose=False)"
    )]
    pub fn new(
        epsilon: Option<f64>, delta: Option<f64>, steps: Option<i64>, dist: Option<&str>,
        order: f64, p_sampling: f64, sample_each_step: bool, seed: u64,
        ps: Option<&Bound<'_, PyAny>>, calibrated: bool, verbose: bool,
    ) -> PyResult<Self> {
        let mut inner = match (ps, calibrated) {
            (Some(raw), true) => {
                PrototypeConfig::with_budgets(extract_budgets(raw)?, p_sampling, sample_each_step)?
            }
            (Some(raw), false) => {
                let mut config = PrototypeConfig::new();
                config.set_budget_shape(extract_budgets(raw)?);
                config
            }
            (None, true) => {
                return Err(pyo3::exceptions::PyValueError::new_err(
                    "ps must be provided when calibrated=True",
                ));
            }
            (None, false) => PrototypeConfig::new(),
        };
        if let Some(v) = epsilon {
            inner.set_epsilon(v)?;
        }
        if let Some(v) = delta {
            inner.set_delta(v)?;
        }
        if let Some(v) = steps {
            inner.set_steps(steps_from_signed(v)?)?;
        }
        if let Some(v) = dist {
            inner.set_dist(v)?;
        }
        inner.set_order(order)?;
        inner.set_p_sampling(p_sampling)?;
        inner.set_sample_each_step(sample_each_step);
        inner.set_seed(seed);
        inner.calibration.verbose = verbose;
        Ok(Self { inner })
    }

    #[getter]
    fn epsilon(&self) -> Option<f64> {
        self.inner.epsilon()
    }

    #[setter]
    fn set_epsilon(&mut self, value: f64) -> PyResult<()> {
        Ok(self.inner.set_epsilon(value)?)
    }

    #[getter]
    fn delta(&self) -> Option<f64> {
        self.inner.delta()
    }

    #[setter]
    fn set_delta(&mut self, value: f64) -> PyResult<()> {
        Ok(self.inner.set_delta(value)?)
    }

    #[getter]
    fn steps(&self) -> Option<usize> {
        self.inner.steps()
    }

    #[setter]
    fn set_steps(&mut self, value: i64) -> PyResult<()> {
        Ok(self.inner.set_steps(steps_from_signed(value)?)?)
    }

    #[getter]
    fn dist(&self) -> Option<&'static str> {
        self.inner.dist().map(|p| p.short_name())
    }

    #[setter]
    fn set_dist(&mut self, value: &str) -> PyResult<()> {
        Ok(self.inner.set_dist(value)?)
    }

    #[getter]
    fn order(&self) -> f64 {
        self.inner.order()
    }

    #[setter]
    fn set_order(&mut self, value: f64) -> PyResult<()> {
        Ok(self.inner.set_order(value)?)
    }

    #[getter]
    fn p_sampling(&self) -> f64 {
        self.inner.p_sampling()
    }

    #[setter]
    fn set_p_sampling(&mut self, value: f64) -> PyResult<()> {
        Ok(self.inner.set_p_sampling(value)?)
    }

    #[getter]
    fn sample_each_step(&self) -> bool {
        self.inner.sample_each_step()
    }

    #[setter]
    fn set_sample_each_step(&mut self, value: bool) {
        self.inner.set_sample_each_step(value);
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed()
    }

    #[setter]
    fn set_seed(&mut self, value: u64) {
        self.inner.set_seed(value);
    }

    /// Per-round budgets of the installed mechanism, or `None`.
    #[getter]
    fn budgets<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f64>>> {
        self.inner.mechanism().map(|m| m.budgets().as_slice().to_vec().into_pyarray(py))
    }

    /// Calibrate the configured schedule shape; returns the achieved epsilon.
    pub fn calibrate_steps(&mut self) -> PyResult<f64> {
        let request = self.inner.schedule_request()?;
        Ok(self.inner.calibrate(&request)?.epsilon)
    }

    /// Calibrate an explicit budget shape; returns the achieved epsilon.
    ///
    /// Without `ps`, the shape given at construction is used.
    #[pyo3(signature = (ps = None))]
    pub fn calibrate_budgets(&mut self, ps: Option<&Bound<'_, PyAny>>) -> PyResult<f64> {
        let budgets = ps.map(extract_budgets).transpose()?;
        let request = self.inner.explicit_request(budgets)?;
        Ok(self.inner.calibrate(&request)?.epsilon)
    }

    /// Private `(k, d)` prototypes of `train_preds` grouped by `train_targets`.
    #[pyo3(signature = (train_preds, train_targets, overwrite_seed = None))]
    pub fn prototypes<'py>(
        &self, py: Python<'py>, train_preds: &Bound<'py, PyAny>,
        train_targets: &Bound<'py, PyAny>, overwrite_seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let points = extract_f64_matrix(py, train_preds)?;
        let labels = extract_i64_labels(py, train_targets)?;
        let labels = labels.as_array().to_vec();
        let out = self.inner.prototypes(points.as_array(), &labels, overwrite_seed)?;
        Ok(out.prototypes.into_pyarray(py))
    }
}

/// Private mean of `x` under per-round budgets `ps`.
///
/// `r` and `c` override the starting radius and center; `seed` makes the
/// noise reproducible (fresh entropy when omitted).
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (x, ps, r = None, c = None, seed = None))]
fn private_mean<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, ps: &Bound<'py, PyAny>, r: Option<f64>,
    c: Option<Vec<f64>>, seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let points = extract_f64_matrix(py, x)?;
    let budgets = extract_budgets(ps)?;
    let center = c.map(ndarray::Array1::from);
    let mut rng = match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_entropy(),
    };
    let mean = estimation::private_mean(
        points.as_array(),
        budgets.as_slice(),
        center.as_ref().map(|c| c.view()),
        r,
        &mut rng,
    )?;
    Ok(mean.into_pyarray(py))
}

/// Module initializer for the `_dp_prototypes` extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _dp_prototypes<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<CoinpressPrototyping>()?;
    m.add_function(wrap_pyfunction!(private_mean, m)?)?;
    Ok(())
}

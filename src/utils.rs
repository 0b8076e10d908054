//! Python-side input extraction for the PyO3 bindings.
//!
//! Each helper accepts a numpy array first, then anything exposing
//! `to_numpy()` (pandas objects), then a plain Python sequence, and hands
//! back a read-only numpy view of the expected dtype and rank. Scalar
//! conversions that Python hands over as signed integers are checked here
//! too, so out-of-range values surface as crate errors.
#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArray2,       // nested Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1, PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use crate::privacy::schedule::PrivacyBudgetSequence;

use crate::privacy::errors::{PrivacyError, PrivacyResult};

/// Convert a signed step count into a positive `usize`.
///
/// # Errors
/// - [`PrivacyError::InvalidParameter`] for negative values.
/// - [`PrivacyError::InvalidSteps`] for zero.
pub fn steps_from_signed(value: i64) -> PrivacyResult<usize> {
    let steps = usize::try_from(value).map_err(|_| PrivacyError::InvalidParameter {
        name: "steps",
        value: value as f64,
        reason: "must be a positive integer",
    })?;
    if steps == 0 {
        return Err(PrivacyError::InvalidSteps { steps });
    }
    Ok(steps)
}

/// Extract an `(n, d)` float64 matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro);
        }
    }

    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64")
    })?;
    let arr = PyArray2::from_vec2(py, &rows)
        .map_err(|_| PyValueError::new_err("rows must all have the same length"))?;
    Ok(arr.readonly())
}

/// Extract an `(n,)` int64 label vector.
#[cfg(feature = "python-bindings")]
pub fn extract_i64_labels<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, i64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray1<i64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<i64>>() {
            return Ok(series_ro);
        }
    }

    let vec: Vec<i64> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of int64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Extract a per-round budget sequence from any 1-D float64 input.
#[cfg(feature = "python-bindings")]
pub fn extract_budgets(raw: &Bound<'_, PyAny>) -> PyResult<PrivacyBudgetSequence> {
    let values: Vec<f64> = match raw.extract::<PyReadonlyArray1<f64>>() {
        Ok(arr_ro) => arr_ro.as_array().to_vec(),
        Err(_) => raw.extract().map_err(|_| {
            PyTypeError::new_err("expected a 1-D numpy.ndarray or sequence of float64 budgets")
        })?,
    };
    Ok(PrivacyBudgetSequence::new(values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Signed step counts convert only when positive.
    //
    // Given
    // -----
    // - Step counts 5, 0, and -1.
    //
    // Expect
    // ------
    // - 5 converts; 0 is InvalidSteps; -1 is InvalidParameter("steps").
    fn signed_steps_convert_only_when_positive() {
        assert_eq!(steps_from_signed(5), Ok(5));
        assert_eq!(steps_from_signed(0), Err(PrivacyError::InvalidSteps { steps: 0 }));
        assert!(matches!(
            steps_from_signed(-1),
            Err(PrivacyError::InvalidParameter { name: "steps", value, .. }) if value == -1.0
        ));
    }
}

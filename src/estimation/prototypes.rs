//! estimation::prototypes — one private mean per class.
//!
//! Purpose
//! -------
//! Turn a labeled `(N, d)` embedding matrix and a per-round budget sequence
//! into a `(k, d)` prototype matrix: partition by label, optionally
//! subsample each class, then run the iterative estimator on it.
//!
//! Key behaviors
//! -------------
//! - Class `k` (the `k`-th smallest label) draws all of its randomness from
//!   `ChaCha20Rng::seed_from_u64(seed)` on stream `k`: first for
//!   subsampling, then for estimator noise. Classes are therefore
//!   independent of each other and of execution order.
//! - With the `parallel` feature classes run on rayon workers; the output
//!   is identical to the sequential path.
//! - `sample_each_step` is rejected with [`EstimationError::NotSupported`]
//!   before any data is touched.
//!
//! Invariants & assumptions
//! ------------------------
//! - Row `i` of [`PrototypeMatrix::prototypes`] belongs to
//!   `PrototypeMatrix::labels[i]`; labels are sorted and unique.
//! - A class left with no rows after subsampling is an error carrying its
//!   class index.
use ndarray::{Array1, Array2, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::estimation::{
    coinpress::{EstimatorOptions, estimate},
    data::{LabelPartition, partition_by_label},
    errors::{EstimationError, EstimationResult},
    subsample::{SamplingMode, subsample},
    validation::{validate_budgets, validate_points, validate_ratio},
};

/// PrototypeOptions — per-class sampling and estimator settings.
///
/// Fields
/// ------
/// - `subsample_ratio`: ratio in `(0, 1]` applied to each class.
/// - `sampling_mode`: Poisson or fixed-ratio draws.
/// - `sample_each_step`: resample every round (not supported).
/// - `seed`: base seed; class `k` uses stream `k`.
/// - `estimator`: center/radius/β for the mean estimator.
///
/// Default: ratio 1, Poisson, no per-round resampling, seed 42.
#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeOptions {
    pub subsample_ratio: f64,
    pub sampling_mode: SamplingMode,
    pub sample_each_step: bool,
    pub seed: u64,
    pub estimator: EstimatorOptions,
}

impl PrototypeOptions {
    pub fn new(
        subsample_ratio: f64, sampling_mode: SamplingMode, sample_each_step: bool, seed: u64,
        estimator: EstimatorOptions,
    ) -> EstimationResult<Self> {
        validate_ratio(subsample_ratio)?;
        Ok(Self { subsample_ratio, sampling_mode, sample_each_step, seed, estimator })
    }
}

impl Default for PrototypeOptions {
    fn default() -> Self {
        Self {
            subsample_ratio: 1.0,
            sampling_mode: SamplingMode::Poisson,
            sample_each_step: false,
            seed: 42,
            estimator: EstimatorOptions::default(),
        }
    }
}

/// Private class prototypes, one row per sorted label.
#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeMatrix<L> {
    pub labels: Vec<L>,
    pub prototypes: Array2<f64>,
}

impl<L> PrototypeMatrix<L> {
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }
}

/// prototypes — estimate one private mean per distinct label.
///
/// Parameters
/// ----------
/// - `points`: `(N, d)` finite embeddings.
/// - `labels`: `N` class labels.
/// - `budgets`: per-round zCDP budgets spent on every class.
/// - `opts`: sampling, seeding, and estimator settings.
///
/// Errors
/// ------
/// - [`EstimationError::NotSupported`] if `opts.sample_each_step`.
/// - [`EstimationError::InvalidShape`] if `labels.len() != N` or `d == 0`.
/// - [`EstimationError::EmptyInput`] with `Some(k)` for a class emptied by
///   subsampling; with `None` for an empty `points`.
/// - Any estimator error for a class.
pub fn prototypes<L>(
    points: ArrayView2<'_, f64>, labels: &[L], budgets: &[f64], opts: &PrototypeOptions,
) -> EstimationResult<PrototypeMatrix<L>>
where
    L: Ord + Clone + Send + Sync,
{
    if opts.sample_each_step {
        return Err(EstimationError::NotSupported { feature: "sample_each_step" });
    }
    validate_points(points)?;
    validate_ratio(opts.subsample_ratio)?;
    validate_budgets(budgets)?;
    let partition = partition_by_label(points.nrows(), labels)?;
    let n_classes = partition.n_classes();
    debug!(n_classes, rounds = budgets.len(), "estimating class prototypes");

    #[cfg(feature = "parallel")]
    let means: Vec<Array1<f64>> = (0..n_classes)
        .into_par_iter()
        .map(|k| class_prototype(points, &partition, k, budgets, opts))
        .collect::<EstimationResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let means: Vec<Array1<f64>> = (0..n_classes)
        .map(|k| class_prototype(points, &partition, k, budgets, opts))
        .collect::<EstimationResult<_>>()?;

    let mut out = Array2::zeros((n_classes, points.ncols()));
    for (mut row, mean) in out.rows_mut().into_iter().zip(means.iter()) {
        row.assign(mean);
    }
    Ok(PrototypeMatrix { labels: partition.into_labels(), prototypes: out })
}

fn class_prototype<L>(
    points: ArrayView2<'_, f64>, partition: &LabelPartition<L>, k: usize, budgets: &[f64],
    opts: &PrototypeOptions,
) -> EstimationResult<Array1<f64>> {
    let mut rng = ChaCha20Rng::seed_from_u64(opts.seed);
    rng.set_stream(k as u64);
    let class = partition
        .class_points(points, k)
        .ok_or(EstimationError::EmptyInput { class_index: Some(k) })?;
    let sampled = subsample(class.view(), opts.subsample_ratio, opts.sampling_mode, &mut rng)?;
    if sampled.nrows() == 0 {
        return Err(EstimationError::EmptyInput { class_index: Some(k) });
    }
    debug!(class = k, rows = sampled.nrows(), "class subsampled");
    Ok(estimate(sampled.view(), budgets, &opts.estimator, &mut rng)?.mean)
}

//! Labeled point sets and their partition by class.
//!
//! Purpose
//! -------
//! Split an `(N, d)` feature matrix into one point set per distinct label
//! before any private step runs. Partitioning is deterministic and public,
//! so it consumes no privacy budget.
//!
//! Key behaviors
//! -------------
//! - [`partition_by_label`] checks that labels and rows line up and groups
//!   row indices under each distinct label.
//! - [`LabelPartition`] keeps labels in ascending order; class index `k`
//!   always refers to the `k`-th smallest label, which is also the row of
//!   that class in the final prototype matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every row index `0..N` appears in exactly one group, in its original
//!   relative order.
//! - Labels only need `Ord + Clone`; integer class ids are the common case.
use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2, Axis};

use crate::estimation::errors::{EstimationError, EstimationResult};

/// Row indices grouped by sorted unique label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPartition<L> {
    labels: Vec<L>,
    members: Vec<Vec<usize>>,
}

impl<L> LabelPartition<L> {
    /// Sorted unique labels.
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Row indices belonging to class `k`, or `None` past the last class.
    pub fn members(&self, k: usize) -> Option<&[usize]> {
        self.members.get(k).map(Vec::as_slice)
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Gather the rows of class `k` from `points` into an owned array.
    ///
    /// `None` when `k >= n_classes()`.
    pub fn class_points(&self, points: ArrayView2<'_, f64>, k: usize) -> Option<Array2<f64>> {
        self.members(k).map(|rows| points.select(Axis(0), rows))
    }

    pub fn into_labels(self) -> Vec<L> {
        self.labels
    }
}

/// Group the rows of an `n_rows`-row point set by `labels`.
///
/// # Errors
/// - [`EstimationError::InvalidShape`] if `labels.len() != n_rows`.
pub fn partition_by_label<L>(n_rows: usize, labels: &[L]) -> EstimationResult<LabelPartition<L>>
where
    L: Ord + Clone,
{
    if labels.len() != n_rows {
        return Err(EstimationError::InvalidShape {
            rows: n_rows,
            cols: labels.len(),
            reason: "label count must equal the number of points",
        });
    }
    let mut groups: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        groups.entry(label.clone()).or_default().push(row);
    }
    let (labels, members) = groups.into_iter().unzip();
    Ok(LabelPartition { labels, members })
}

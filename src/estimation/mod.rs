//! estimation — partitioning, subsampling, and private mean estimation.
//!
//! Purpose
//! -------
//! Consume a per-round budget sequence (produced by `crate::privacy`) and
//! turn labeled embeddings into private class prototypes.
//!
//! Key behaviors
//! -------------
//! - [`data`] groups rows by sorted unique label.
//! - [`subsample`] thins a class by a ratio (Poisson or fixed-ratio).
//! - [`coinpress`] runs the iterative clip-and-noise mean estimator.
//! - [`prototypes`] wires the three together with per-class RNG streams.
//!
//! Conventions
//! -----------
//! - Points are `ndarray` matrices, rows = points; all entry points take
//!   views and return owned arrays.
//! - All randomness is passed in explicitly or derived from a seed; nothing
//!   here touches a global RNG.
//! - Errors are [`EstimationError`] / [`EstimationResult`].

pub mod coinpress;
pub mod data;
pub mod errors;
pub mod prototypes;
pub mod subsample;
pub mod validation;

pub use self::coinpress::{
    EstimatorOptions, MeanEstimate, RoundSummary, clip_to_ball, estimate, gaussian_tailbound,
    private_mean,
};
pub use self::data::{LabelPartition, partition_by_label};
pub use self::errors::{EstimationError, EstimationResult};
pub use self::prototypes::{PrototypeMatrix, PrototypeOptions, prototypes};
pub use self::subsample::{SamplingMode, subsample, subsample_seeded};

pub mod prelude {
    pub use super::coinpress::{EstimatorOptions, private_mean};
    pub use super::errors::{EstimationError, EstimationResult};
    pub use super::prototypes::{PrototypeMatrix, PrototypeOptions, prototypes};
    pub use super::subsample::SamplingMode;
}

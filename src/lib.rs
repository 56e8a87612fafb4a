#![forbid(unsafe_code)]

//! # regiorank
//!
//! Ranked multi-criteria decision scores per region from hierarchical
//! weighted criteria.
//!
//! The flow, in the order callers use it:
//! - [`weights`]: named pairwise comparison matrices → normalized priority
//!   weights (row geometric mean method)
//! - [`dataset`]: raw criterion values → `[0,1]`, cost/benefit-aware
//! - [`scoring`]: normalized dataset + weight tree → closeness coefficients
//!   and ranks
//! - [`sensitivity`]: ±δ perturbation of each leaf weight → ranking
//!   stability report
//! - [`pipeline`]: all of the above in one call
//!
//! All computation is synchronous and side-effect-free: identical inputs
//! produce identical outputs, and no caller-supplied structure is mutated.
//! The crate performs no file, network, or display I/O; acquiring
//! configuration data and rendering results belong to callers.

pub mod dataset;
pub mod pipeline;
pub mod scoring;
pub mod sensitivity;
pub mod weights;

pub use dataset::{
    Dataset, DatasetError, NormalizedDataset, NormalizedObservation, Observation, Orientation,
    RawValue,
};
pub use pipeline::{run_evaluation, EvalError, EvaluationOutput, EvaluationRequest};
pub use scoring::{score_regions, RegionScore, SCORE_FLOOR};
pub use sensitivity::{
    sensitivity_analysis, Direction, SensitivityError, SensitivityReport, WeightScenario,
};
pub use weights::{
    derive_weights, DerivedWeights, PairwiseMatrix, ReciprocityWarning, WeightError, WeightTree,
    RECIPROCITY_TOLERANCE,
};

//! One-shot evaluation: normalize → derive weights → score → sensitivity.
//!
//! The request/output pair is the JSON-friendly surface exchanged with the
//! configuration tooling upstream and the rendering tooling downstream.
//! Everything in between is pure computation; any validation failure
//! aborts the whole run with no partial result.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::{Dataset, DatasetError, Observation};
use crate::scoring::{score_regions, RegionScore};
use crate::sensitivity::{sensitivity_analysis, SensitivityError, SensitivityReport};
use crate::weights::{derive_weights, PairwiseMatrix, ReciprocityWarning, WeightError, WeightTree};

/// Everything one evaluation needs: raw observations, pairwise matrices,
/// and optionally a sensitivity δ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub observations: Vec<Observation>,
    pub matrices: Vec<PairwiseMatrix>,
    /// When set, a sensitivity report is produced with this δ.
    #[serde(default)]
    pub sensitivity_delta: Option<f64>,
}

/// Scores, the weight tree they were computed under, and any warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub weights: WeightTree,
    pub weight_warnings: Vec<ReciprocityWarning>,
    pub scores: Vec<RegionScore>,
    pub sensitivity: Option<SensitivityReport>,
}

/// Any failure along the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Weights(#[from] WeightError),
    #[error(transparent)]
    Sensitivity(#[from] SensitivityError),
}

/// Run the full evaluation.
pub fn run_evaluation(request: EvaluationRequest) -> Result<EvaluationOutput, EvalError> {
    let dataset = Dataset::new(request.observations)?;
    let normalized = dataset.normalize()?;
    debug!(observations = normalized.len(), "dataset normalized");

    let derived = derive_weights(&request.matrices)?;
    debug!(
        categories = derived.tree.len(),
        warnings = derived.warnings.len(),
        "weights derived"
    );

    let scores = score_regions(&normalized, &derived.tree);

    let sensitivity = match request.sensitivity_delta {
        Some(delta) => Some(sensitivity_analysis(&normalized, &derived.tree, delta)?),
        None => None,
    };

    Ok(EvaluationOutput {
        weights: derived.tree,
        weight_warnings: derived.warnings,
        scores,
        sensitivity,
    })
}

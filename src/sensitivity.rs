//! Ranking stability under leaf-weight perturbation.
//!
//! For every leaf (category, sub-category) weight, two scenarios are built:
//! the weight scaled by `1 + δ` and by `1 - δ`, with the category's sibling
//! weights renormalized to sum 1 and every other category untouched. Each
//! scenario rescores the unchanged dataset from scratch.
//!
//! Scenario passes share only read-only inputs and write disjoint result
//! slots, so they run on a parallel iterator; the scenario list itself is
//! ordered by (category, sub-category, direction) regardless of how the
//! passes are scheduled.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::NormalizedDataset;
use crate::scoring::{score_regions, RegionScore};
use crate::weights::WeightTree;

/// Perturbation direction for one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Leaf weight scaled by `1 + δ`.
    Plus,
    /// Leaf weight scaled by `1 - δ`.
    Minus,
}

/// Scores obtained after perturbing one leaf weight in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightScenario {
    pub category: String,
    pub sub_category: String,
    pub direction: Direction,
    pub scores: Vec<RegionScore>,
}

/// Baseline scores plus one scenario per (leaf weight, direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    /// Scores under the unperturbed weight tree.
    pub baseline: Vec<RegionScore>,
    /// Exactly `2 × leaf count` entries, sorted by
    /// (category, sub-category, direction).
    pub scenarios: Vec<WeightScenario>,
}

impl SensitivityReport {
    /// Look up one scenario's scores.
    pub fn scenario(
        &self,
        category: &str,
        sub_category: &str,
        direction: Direction,
    ) -> Option<&[RegionScore]> {
        self.scenarios
            .iter()
            .find(|s| {
                s.category == category
                    && s.sub_category == sub_category
                    && s.direction == direction
            })
            .map(|s| s.scores.as_slice())
    }
}

/// Errors from weight perturbation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensitivityError {
    /// δ must lie strictly inside (0, 1); at δ ≥ 1 the minus scenario
    /// would drive the weight to zero or below.
    #[error("perturbation delta {delta} outside (0, 1)")]
    InvalidDelta { delta: f64 },

    /// Perturbed sibling weights summed to a non-positive total.
    #[error("renormalizing '{category}' after perturbing '{sub_category}' left non-positive total {total}")]
    DegenerateRenormalization {
        category: String,
        sub_category: String,
        total: f64,
    },
}

/// Perturb every leaf weight by ±δ and rescore.
///
/// Neither input is mutated; each scenario builds its own tree with only
/// the perturbed category's weights recomputed. Deterministic for
/// identical inputs.
pub fn sensitivity_analysis(
    data: &NormalizedDataset,
    weights: &WeightTree,
    delta: f64,
) -> Result<SensitivityReport, SensitivityError> {
    if !delta.is_finite() || delta <= 0.0 || delta >= 1.0 {
        return Err(SensitivityError::InvalidDelta { delta });
    }

    let baseline = score_regions(data, weights);

    // Leaf list in tree order; Plus sorts before Minus within a leaf.
    let passes: Vec<(&str, &str, Direction)> = weights
        .iter()
        .flat_map(|(category, subs)| {
            subs.keys().flat_map(move |sub| {
                [Direction::Plus, Direction::Minus]
                    .into_iter()
                    .map(move |direction| (category.as_str(), sub.as_str(), direction))
            })
        })
        .collect();

    let scenarios = passes
        .into_par_iter()
        .map(|(category, sub_category, direction)| {
            let perturbed = perturbed_tree(weights, category, sub_category, direction, delta)?;
            Ok(WeightScenario {
                category: category.to_string(),
                sub_category: sub_category.to_string(),
                direction,
                scores: score_regions(data, &perturbed),
            })
        })
        .collect::<Result<Vec<WeightScenario>, SensitivityError>>()?;

    Ok(SensitivityReport {
        baseline,
        scenarios,
    })
}

/// New tree with one leaf scaled and its category renormalized to sum 1.
fn perturbed_tree(
    weights: &WeightTree,
    category: &str,
    sub_category: &str,
    direction: Direction,
    delta: f64,
) -> Result<WeightTree, SensitivityError> {
    let factor = match direction {
        Direction::Plus => 1.0 + delta,
        Direction::Minus => 1.0 - delta,
    };

    let subs = &weights[category];
    let mut adjusted: BTreeMap<String, f64> = subs.clone();
    if let Some(w) = adjusted.get_mut(sub_category) {
        *w *= factor;
    }

    let total: f64 = adjusted.values().sum();
    if total <= 0.0 {
        return Err(SensitivityError::DegenerateRenormalization {
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            total,
        });
    }
    for w in adjusted.values_mut() {
        *w /= total;
    }

    let mut tree = weights.clone();
    tree.insert(category.to_string(), adjusted);
    Ok(tree)
}

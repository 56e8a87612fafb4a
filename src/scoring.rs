//! Closeness-coefficient scoring over a normalized dataset and weight tree.
//!
//! Each region is placed in a region × criterion grid of weighted values,
//! measured against the per-criterion ideal (column max) and anti-ideal
//! (column min) profiles, and scored by `d- / (d+ + d-)`: distance to the
//! anti-ideal over total distance. Raw coefficients are then rescaled to
//! `[SCORE_FLOOR, 1]` across regions and ranked.
//!
//! Scoring is total: missing weights default to 1.0, missing cells to 0,
//! and the two degenerate divisions (a region equidistant from both
//! profiles, and all regions scoring identically) resolve to 0.5 and 1.0
//! respectively instead of propagating NaN.

use std::collections::{BTreeSet, HashMap};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::dataset::NormalizedDataset;
use crate::weights::WeightTree;

/// Lower bound of the rescaled score range.
pub const SCORE_FLOOR: f64 = 0.01;

/// Final score and rank for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionScore {
    pub region: String,
    /// Closeness coefficient rescaled to `[SCORE_FLOOR, 1]`.
    pub score: f64,
    /// 1-based rank by descending score. Ties share the minimum rank and
    /// the sequence then skips ahead by the tie-group size.
    pub rank: usize,
}

/// Score every region in the dataset against the weight tree.
///
/// Weight resolution is `tree[category][sub_category]`, defaulting to 1.0
/// when the pair is absent: unknown criteria are fully counted rather
/// than excluded. The grid has one column per distinct
/// (category, sub-category) pair observed anywhere in the dataset; a
/// region with no observation for a column contributes 0 there.
///
/// Output is sorted by rank, then region name. Deterministic for
/// identical inputs; neither input is mutated.
pub fn score_regions(data: &NormalizedDataset, weights: &WeightTree) -> Vec<RegionScore> {
    let observations = data.observations();
    if observations.is_empty() {
        return Vec::new();
    }

    // Lexicographic region and criterion axes.
    let mut region_set: BTreeSet<&str> = BTreeSet::new();
    let mut criterion_set: BTreeSet<(&str, &str)> = BTreeSet::new();
    for o in observations {
        region_set.insert(o.region.as_str());
        criterion_set.insert((o.category.as_str(), o.sub_category.as_str()));
    }
    let regions: Vec<&str> = region_set.into_iter().collect();
    let criteria: Vec<(&str, &str)> = criterion_set.into_iter().collect();

    let row_index: HashMap<&str, usize> = regions.iter().enumerate().map(|(i, r)| (*r, i)).collect();
    let col_index: HashMap<(&str, &str), usize> =
        criteria.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    // Flattened criterion → weight table, resolved once up front.
    let flat_weights: Vec<f64> = criteria
        .iter()
        .map(|(category, sub)| {
            weights
                .get(*category)
                .and_then(|subs| subs.get(*sub))
                .copied()
                .unwrap_or(1.0)
        })
        .collect();

    let mut grid = DMatrix::<f64>::zeros(regions.len(), criteria.len());
    for o in observations {
        let r = row_index[o.region.as_str()];
        let c = col_index[&(o.category.as_str(), o.sub_category.as_str())];
        grid[(r, c)] = o.value * flat_weights[c];
    }

    let ideal: Vec<f64> = (0..criteria.len())
        .map(|c| (0..regions.len()).map(|r| grid[(r, c)]).fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let anti_ideal: Vec<f64> = (0..criteria.len())
        .map(|c| (0..regions.len()).map(|r| grid[(r, c)]).fold(f64::INFINITY, f64::min))
        .collect();

    let raw: Vec<f64> = (0..regions.len())
        .map(|r| {
            let mut dist_ideal_sq = 0.0;
            let mut dist_anti_sq = 0.0;
            for c in 0..criteria.len() {
                dist_ideal_sq += (grid[(r, c)] - ideal[c]).powi(2);
                dist_anti_sq += (grid[(r, c)] - anti_ideal[c]).powi(2);
            }
            let dist_ideal = dist_ideal_sq.sqrt();
            let dist_anti = dist_anti_sq.sqrt();
            let total = dist_ideal + dist_anti;
            if total == 0.0 {
                // Equidistant from both profiles (single region, or every
                // column constant): neutral score.
                0.5
            } else {
                dist_anti / total
            }
        })
        .collect();

    let min_raw = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max_raw = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let rescaled: Vec<f64> = raw
        .iter()
        .map(|s| {
            if max_raw == min_raw {
                // No spread to stretch over the score range.
                1.0
            } else {
                (s - min_raw) / (max_raw - min_raw) * (1.0 - SCORE_FLOOR) + SCORE_FLOOR
            }
        })
        .collect();

    let mut ordered: Vec<(usize, f64)> = rescaled.iter().copied().enumerate().collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| regions[a.0].cmp(regions[b.0])));

    let mut out: Vec<RegionScore> = Vec::with_capacity(ordered.len());
    for (position, (region_idx, score)) in ordered.iter().enumerate() {
        let rank = match out.last() {
            Some(prev) if prev.score == *score => prev.rank,
            _ => position + 1,
        };
        out.push(RegionScore {
            region: regions[*region_idx].to_string(),
            score: *score,
            rank,
        });
    }
    out
}

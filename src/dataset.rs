//! Observation dataset and cost/benefit-aware min-max normalization.
//!
//! Raw criterion values arrive from external configuration tooling and may be
//! locale-formatted strings: embedded thousands separators (plain or
//! no-break spaces) and comma decimal marks. Parsing is strict: a single
//! unconvertible value aborts normalization with no partial result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether larger or smaller raw values are favorable for a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Smaller raw values are better (distances, fees, risk indices).
    Cost,
    /// Larger raw values are better (capacity, coverage, wages).
    Benefit,
}

/// Raw criterion value as supplied by the configuration collaborator.
///
/// Numbers pass through as-is; text is parsed leniently enough to accept
/// `"1 234,5"` and `"1\u{a0}234,5"` but nothing looser than that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One measured criterion value for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub value: RawValue,
    pub orientation: Orientation,
}

impl Observation {
    pub fn new(
        region: impl Into<String>,
        category: impl Into<String>,
        sub_category: impl Into<String>,
        value: impl Into<RawValue>,
        orientation: Orientation,
    ) -> Self {
        Self {
            region: region.into(),
            category: category.into(),
            sub_category: sub_category.into(),
            value: value.into(),
            orientation,
        }
    }
}

/// Errors from dataset construction or normalization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// Two observations share the same (region, category, sub-category) key.
    #[error("duplicate observation for {region} / {category} / {sub_category}")]
    DuplicateObservation {
        region: String,
        category: String,
        sub_category: String,
    },

    /// A raw value could not be converted to a finite number.
    #[error("unparseable value {raw:?} for {region} / {category} / {sub_category}")]
    UnparseableValue {
        region: String,
        category: String,
        sub_category: String,
        raw: String,
    },
}

/// Collection of raw observations, at most one per
/// (region, category, sub-category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate (region, category, sub-category)
    /// keys. Input order is preserved.
    pub fn new(observations: Vec<Observation>) -> Result<Self, DatasetError> {
        let mut seen: BTreeSet<(&str, &str, &str)> = BTreeSet::new();
        for o in &observations {
            let key = (
                o.region.as_str(),
                o.category.as_str(),
                o.sub_category.as_str(),
            );
            if !seen.insert(key) {
                return Err(DatasetError::DuplicateObservation {
                    region: o.region.clone(),
                    category: o.category.clone(),
                    sub_category: o.sub_category.clone(),
                });
            }
        }
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rescale every value into `[0, 1]`, orientation-aware.
    ///
    /// Values are grouped by (category, sub-category) across all regions.
    /// Within a group:
    /// - `max == min` (zero variance): every member normalizes to exactly
    ///   1.0; a criterion with no discriminating information counts as
    ///   fully satisfied for all regions;
    /// - `Cost`: `(max - value) / (max - min)`;
    /// - `Benefit`: `(value - min) / (max - min)`.
    ///
    /// The group's orientation is taken from its first observation in input
    /// order. Any unparseable value aborts the whole normalization.
    pub fn normalize(&self) -> Result<NormalizedDataset, DatasetError> {
        let parsed = self
            .observations
            .iter()
            .map(|o| {
                parse_raw_value(&o.value).ok_or_else(|| DatasetError::UnparseableValue {
                    region: o.region.clone(),
                    category: o.category.clone(),
                    sub_category: o.sub_category.clone(),
                    raw: raw_value_display(&o.value),
                })
            })
            .collect::<Result<Vec<f64>, DatasetError>>()?;

        // Group observation indices by criterion, preserving input order
        // within each group.
        let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for (idx, o) in self.observations.iter().enumerate() {
            groups
                .entry((o.category.as_str(), o.sub_category.as_str()))
                .or_default()
                .push(idx);
        }

        let mut normalized = vec![0.0; parsed.len()];
        for indices in groups.values() {
            let min = indices.iter().map(|&i| parsed[i]).fold(f64::INFINITY, f64::min);
            let max = indices
                .iter()
                .map(|&i| parsed[i])
                .fold(f64::NEG_INFINITY, f64::max);
            let orientation = self.observations[indices[0]].orientation;

            for &i in indices {
                normalized[i] = if max == min {
                    1.0
                } else {
                    match orientation {
                        Orientation::Cost => (max - parsed[i]) / (max - min),
                        Orientation::Benefit => (parsed[i] - min) / (max - min),
                    }
                };
            }
        }

        let observations = self
            .observations
            .iter()
            .zip(normalized)
            .map(|(o, value)| NormalizedObservation {
                region: o.region.clone(),
                category: o.category.clone(),
                sub_category: o.sub_category.clone(),
                value,
                orientation: o.orientation,
            })
            .collect();

        Ok(NormalizedDataset { observations })
    }
}

/// An observation whose value has been rescaled into `[0, 1]`.
///
/// Orientation is kept for audit; the direction is already folded into the
/// value, so downstream scoring ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedObservation {
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub value: f64,
    pub orientation: Orientation,
}

/// Dataset with all values in `[0, 1]`, same key structure as [`Dataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    observations: Vec<NormalizedObservation>,
}

impl NormalizedDataset {
    /// Assemble directly from already-normalized observations.
    /// [`Dataset::normalize`] is the usual producer.
    pub fn new(observations: Vec<NormalizedObservation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[NormalizedObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Parse a raw value, accepting locale-formatted text: plain and no-break
/// spaces are stripped, a comma decimal mark becomes a dot. Returns `None`
/// for anything that does not yield a finite number.
fn parse_raw_value(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(v) => v.is_finite().then_some(*v),
        RawValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, ' ' | '\u{a0}'))
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

fn raw_value_display(value: &RawValue) -> String {
    match value {
        RawValue::Number(v) => v.to_string(),
        RawValue::Text(s) => s.clone(),
    }
}

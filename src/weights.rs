//! Pairwise comparison matrices and priority-vector derivation.
//!
//! Weights come from the row geometric mean method: for a square matrix of
//! relative-importance judgments, `w_i = (Π_j a[i][j])^(1/n)` normalized to
//! sum 1. One matrix is expected per category (items = its sub-categories)
//! plus one "General" matrix comparing the categories themselves.
//!
//! Reciprocity (`a[i][j] ≈ 1/a[j][i]`) is checked but not enforced: a
//! violation produces a [`ReciprocityWarning`] that is logged and surfaced
//! to the caller while derivation continues. Non-square shapes and entries
//! outside the positive domain are fatal.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Largest tolerated `|a[i][j] - 1/a[j][i]|` before a matrix is flagged.
pub const RECIPROCITY_TOLERANCE: f64 = 0.01;

/// Category → sub-category → weight. Weights within each category sum to 1.
///
/// Built once by [`derive_weights`] and treated as immutable afterwards;
/// perturbation constructs a new tree rather than editing in place. The
/// `BTreeMap` keys give every consumer the same lexicographic iteration
/// order.
pub type WeightTree = BTreeMap<String, BTreeMap<String, f64>>;

/// Square matrix of pairwise relative-importance judgments.
///
/// Row and column labels are carried separately because the matrices are
/// authored in external spreadsheets where the two can drift apart; see
/// [`derive_weights`] for the reconciliation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseMatrix {
    pub name: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub values: DMatrix<f64>,
}

impl PairwiseMatrix {
    /// Build from nested rows with distinct row and column labels.
    ///
    /// Label counts must match the row grid's dimensions; squareness itself
    /// is checked at derivation time.
    pub fn new(
        name: impl Into<String>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, WeightError> {
        let name = name.into();
        if rows.len() != row_labels.len() || rows.iter().any(|r| r.len() != col_labels.len()) {
            return Err(WeightError::NotSquare {
                name,
                rows: rows.len(),
                cols: rows.first().map_or(col_labels.len(), Vec::len),
            });
        }
        let values = DMatrix::from_fn(row_labels.len(), col_labels.len(), |i, j| rows[i][j]);
        Ok(Self {
            name,
            row_labels,
            col_labels,
            values,
        })
    }

    /// Build from nested rows where row and column labels coincide.
    pub fn from_rows(
        name: impl Into<String>,
        labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, WeightError> {
        Self::new(name, labels.clone(), labels, rows)
    }

    /// Neutral template: ones on the diagonal, zeros elsewhere, for callers
    /// to fill in with judgments. Deriving weights from an unedited template
    /// fails on the zero entries.
    pub fn template(name: impl Into<String>, items: Vec<String>) -> Self {
        let n = items.len();
        Self {
            name: name.into(),
            row_labels: items.clone(),
            col_labels: items,
            values: DMatrix::identity(n, n),
        }
    }

    /// Number of items compared by this matrix (row count).
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }
}

/// Fatal weight-derivation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// Matrix (or its label grid) is not square.
    #[error("pairwise matrix '{name}' is not square: {rows}x{cols}")]
    NotSquare {
        name: String,
        rows: usize,
        cols: usize,
    },

    /// Entry is outside the positive domain, where the geometric mean is
    /// undefined.
    #[error("pairwise matrix '{name}' has entry {value} outside the positive domain at ({row}, {col})")]
    NonPositiveEntry {
        name: String,
        row: usize,
        col: usize,
        value: f64,
    },
}

/// Non-fatal: a matrix deviates from perfect reciprocity.
///
/// Reports the worst-offending cell; derivation proceeds with the entries
/// as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReciprocityWarning {
    pub matrix: String,
    pub row: usize,
    pub col: usize,
    /// Worst observed `|a[i][j] - 1/a[j][i]|`.
    pub deviation: f64,
}

/// Weight tree plus any warnings collected while deriving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedWeights {
    pub tree: WeightTree,
    pub warnings: Vec<ReciprocityWarning>,
}

/// Derive a normalized priority vector per matrix.
///
/// Label policy: when row labels disagree with column labels (equal
/// length), the column labels are adopted as canonical. This is the same
/// rule the spreadsheet-facing tooling applies; callers relying on row
/// labels should reconcile them before deriving.
///
/// Per matrix: fails on non-square shapes and non-positive entries, flags
/// (but tolerates) reciprocity violations, then computes row geometric
/// means in the log domain and normalizes them to sum 1. A single-item
/// matrix trivially yields weight 1.0.
pub fn derive_weights(matrices: &[PairwiseMatrix]) -> Result<DerivedWeights, WeightError> {
    let mut tree = WeightTree::new();
    let mut warnings = Vec::new();

    for matrix in matrices {
        let (labels, priorities, warning) = derive_one(matrix)?;
        if let Some(w) = warning {
            warn!(
                matrix = %w.matrix,
                deviation = w.deviation,
                "pairwise matrix deviates from reciprocity; proceeding with entries as given"
            );
            warnings.push(w);
        }
        tree.insert(
            matrix.name.clone(),
            labels.into_iter().zip(priorities).collect(),
        );
    }

    Ok(DerivedWeights { tree, warnings })
}

fn derive_one(
    matrix: &PairwiseMatrix,
) -> Result<(Vec<String>, Vec<f64>, Option<ReciprocityWarning>), WeightError> {
    let n = matrix.values.nrows();
    if n != matrix.values.ncols() || matrix.row_labels.len() != matrix.col_labels.len() {
        return Err(WeightError::NotSquare {
            name: matrix.name.clone(),
            rows: matrix.values.nrows(),
            cols: matrix.values.ncols(),
        });
    }

    // Column labels win when the two sides disagree.
    let labels = matrix.col_labels.clone();

    if n == 0 {
        return Ok((labels, Vec::new(), None));
    }

    for i in 0..n {
        for j in 0..n {
            let v = matrix.values[(i, j)];
            if !v.is_finite() || v <= 0.0 {
                return Err(WeightError::NonPositiveEntry {
                    name: matrix.name.clone(),
                    row: i,
                    col: j,
                    value: v,
                });
            }
        }
    }

    let mut warning: Option<ReciprocityWarning> = None;
    for i in 0..n {
        for j in 0..n {
            let deviation = (matrix.values[(i, j)] - 1.0 / matrix.values[(j, i)]).abs();
            if deviation > RECIPROCITY_TOLERANCE
                && warning.as_ref().map_or(true, |w| deviation > w.deviation)
            {
                warning = Some(ReciprocityWarning {
                    matrix: matrix.name.clone(),
                    row: i,
                    col: j,
                    deviation,
                });
            }
        }
    }

    // Row geometric means, computed in the log domain. Entries were just
    // validated strictly positive, so ln() is defined everywhere.
    let mut priorities: Vec<f64> = (0..n)
        .map(|i| {
            let log_sum: f64 = (0..n).map(|j| matrix.values[(i, j)].ln()).sum();
            (log_sum / n as f64).exp()
        })
        .collect();

    let total: f64 = priorities.iter().sum();
    for p in &mut priorities {
        *p /= total;
    }

    Ok((labels, priorities, warning))
}

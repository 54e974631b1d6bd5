pub mod masked;

pub use masked::{build_masked_distances, mask_shared_groups, MaskedDistances, MASKED_DISTANCE};

use rayon::prelude::*;

use crate::data::Embedding;
use crate::error::{CongaError, CongaResult};

/// Dense square distance matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn from_values(n: usize, values: Vec<f64>) -> CongaResult<Self> {
        if values.len() != n * n {
            return Err(CongaError::LengthMismatch {
                what: "distance matrix entries",
                expected: n * n,
                actual: values.len(),
            });
        }
        Ok(Self { n, values })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.n + j] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Median over all n×n entries, diagonal included
    pub fn median(&self) -> Option<f64> {
        median(&self.values)
    }

    /// Applies `f` elementwise to this matrix and `other`, which must have the same size
    pub(crate) fn zip_map(
        &self,
        other: &DistanceMatrix,
        f: impl Fn(f64, f64) -> f64,
    ) -> DistanceMatrix {
        debug_assert_eq!(self.n, other.n);
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| f(a, b))
            .collect();
        DistanceMatrix { n: self.n, values }
    }
}

/// Euclidean distances between every pair of embedding rows
///
/// Rows are computed in parallel; each entry depends only on its own pair,
/// so the result is deterministic.
pub fn pairwise_euclidean(embedding: &Embedding) -> DistanceMatrix {
    let n = embedding.rows();
    let values: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = embedding.row(i);
            (0..n).map(move |j| euclidean(a, embedding.row(j)))
        })
        .collect();
    DistanceMatrix { n, values }
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Median of a slice (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

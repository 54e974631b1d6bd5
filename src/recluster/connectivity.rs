use std::collections::BTreeMap;

use crate::distance::DistanceMatrix;

const SIGMA_SEARCH_ITERATIONS: usize = 64;
const SIGMA_TOLERANCE: f64 = 1e-5;
const MIN_SIGMA_SCALE: f64 = 1e-3;

/// Neighbor count used on the combined distance: `max(1, min(10, m / 2))`
pub fn recluster_num_neighbors(subset_size: usize) -> usize {
    (subset_size / 2).min(10).max(1)
}

/// Symmetric weighted adjacency with no self loops
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborGraph {
    pub adjacency: Vec<Vec<(usize, f64)>>,
}

impl NeighborGraph {
    pub fn size(&self) -> usize {
        self.adjacency.len()
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.adjacency[i]
            .iter()
            .find(|(k, _)| *k == j)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }
}

/// Each row's `k` nearest columns sorted by distance, self included
///
/// Row `i` always starts with `i` itself at distance zero.
pub fn knn_from_dense(distances: &DistanceMatrix, k: usize) -> (Vec<Vec<usize>>, Vec<Vec<f64>>) {
    let n = distances.size();
    let k = k.min(n);
    let mut indices = Vec::with_capacity(n);
    let mut dists = Vec::with_capacity(n);
    for i in 0..n {
        let row = distances.row(i);
        let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        order.sort_by(|&a, &b| row[a].total_cmp(&row[b]).then(a.cmp(&b)));
        let mut nbrs = vec![i];
        nbrs.extend(order.into_iter().take(k.saturating_sub(1)));
        dists.push(nbrs.iter().map(|&j| if j == i { 0.0 } else { row[j] }).collect());
        indices.push(nbrs);
    }
    (indices, dists)
}

/// Fuzzy-simplicial connectivity weights from a kNN graph
///
/// Each clone gets a local offset `rho` (distance to its nearest other
/// neighbor) and bandwidth `sigma` chosen so its membership strengths sum
/// to `log2(k)`; directed weights are then combined by probabilistic OR.
pub fn fuzzy_connectivities(knn_indices: &[Vec<usize>], knn_dists: &[Vec<f64>]) -> NeighborGraph {
    let n = knn_indices.len();
    let mut directed: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];

    for i in 0..n {
        let others: Vec<f64> = knn_indices[i]
            .iter()
            .zip(&knn_dists[i])
            .filter(|(&j, _)| j != i)
            .map(|(_, &d)| d)
            .collect();
        let (rho, sigma) = smooth_knn(&others, knn_indices[i].len());

        for (&j, &d) in knn_indices[i].iter().zip(&knn_dists[i]) {
            if j == i {
                continue;
            }
            let weight = if d - rho <= 0.0 || sigma == 0.0 {
                1.0
            } else {
                (-(d - rho) / sigma).exp()
            };
            directed[i].insert(j, weight);
        }
    }

    let mut adjacency: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for i in 0..n {
        for (&j, &w_ij) in &directed[i] {
            let w_ji = directed[j].get(&i).copied().unwrap_or(0.0);
            let combined = w_ij + w_ji - w_ij * w_ji;
            adjacency[i].insert(j, combined);
            adjacency[j].insert(i, combined);
        }
    }

    NeighborGraph {
        adjacency: adjacency
            .into_iter()
            .map(|edges| edges.into_iter().collect())
            .collect(),
    }
}

/// Local offset and bandwidth for one clone's neighbor distances
fn smooth_knn(dists: &[f64], k: usize) -> (f64, f64) {
    if dists.is_empty() {
        return (0.0, 0.0);
    }
    let target = (k as f64).log2();
    let rho = dists
        .iter()
        .copied()
        .filter(|&d| d > 0.0)
        .fold(f64::INFINITY, f64::min);
    let rho = if rho.is_finite() { rho } else { 0.0 };

    let (mut lo, mut hi, mut mid) = (0.0, f64::INFINITY, 1.0);
    for _ in 0..SIGMA_SEARCH_ITERATIONS {
        let psum: f64 = dists
            .iter()
            .map(|&d| {
                let d = d - rho;
                if d > 0.0 {
                    (-d / mid).exp()
                } else {
                    1.0
                }
            })
            .sum();
        if (psum - target).abs() < SIGMA_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
        }
    }

    let mean = dists.iter().sum::<f64>() / dists.len() as f64;
    let sigma = if rho > 0.0 {
        mid.max(MIN_SIGMA_SCALE * mean)
    } else {
        mid
    };
    (rho, sigma)
}

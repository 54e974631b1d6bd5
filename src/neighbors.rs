use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::config::check_fraction;
use crate::data::Space;
use crate::distance::{DistanceMatrix, MaskedDistances, MASKED_DISTANCE};
use crate::error::{CongaError, CongaResult};
use crate::TARGET_NEIGHBORS;

/// Neighborhood size for a fraction of the population, never below one
pub fn num_neighbors(fraction: f64, population: usize) -> usize {
    ((fraction * population as f64).floor() as usize).max(1)
}

/// The `k` nearest clones of every clone in one space, row-major n×k
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSets {
    k: usize,
    indices: Vec<usize>,
}

impl NeighborSets {
    pub fn new(k: usize, indices: Vec<usize>) -> Self {
        Self { k, indices }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.indices.len() / self.k
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn row(&self, i: usize) -> &[usize] {
        &self.indices[i * self.k..(i + 1) * self.k]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.indices.chunks(self.k.max(1))
    }
}

/// Neighbor sets for one fraction in both spaces
#[derive(Debug, Clone)]
pub struct FractionNeighbors {
    pub fraction: f64,
    pub gex: NeighborSets,
    pub tcr: NeighborSets,
}

impl FractionNeighbors {
    pub fn get(&self, space: Space) -> &NeighborSets {
        match space {
            Space::Gex => &self.gex,
            Space::Tcr => &self.tcr,
        }
    }
}

/// Neighbor sets for every requested fraction, all held at once
#[derive(Debug, Clone, Default)]
pub struct NeighborIndex {
    pub fractions: Vec<FractionNeighbors>,
}

/// Extracts the `k` lowest-distance columns of every row
///
/// Only the k smallest are guaranteed; their order within the row is
/// whatever the partial selection leaves. With a `tie_seed`, candidates are
/// shuffled per row before selection so ties are not resolved by input order.
///
/// # Arguments
/// * `distances` - Group-masked distance matrix
/// * `k` - Neighbors per clone
/// * `tie_seed` - Optional seed for tie shuffling
///
/// # Returns
/// * `Ok(NeighborSets)` - n×k neighbor indices
/// * `Err` - If some row has fewer than `k` unmasked candidates
pub fn extract_neighbors(
    distances: &DistanceMatrix,
    k: usize,
    tie_seed: Option<u64>,
) -> CongaResult<NeighborSets> {
    let n = distances.size();
    if k == 0 {
        return Ok(NeighborSets::new(0, Vec::new()));
    }
    let mut rng = tie_seed.map(StdRng::seed_from_u64);
    let mut indices = Vec::with_capacity(n * k);
    let mut candidates: Vec<usize> = (0..n).collect();

    for i in 0..n {
        let row = distances.row(i);
        let eligible = row.iter().filter(|d| **d != MASKED_DISTANCE).count();
        if k > eligible {
            return Err(CongaError::NeighborhoodTooLarge {
                entity: i,
                k,
                eligible,
            });
        }

        candidates.clear();
        candidates.extend(0..n);
        if let Some(rng) = rng.as_mut() {
            candidates.shuffle(rng);
        }
        candidates.select_nth_unstable_by(k - 1, |&a, &b| row[a].total_cmp(&row[b]));
        indices.extend_from_slice(&candidates[..k]);
    }

    Ok(NeighborSets { k, indices })
}

/// Builds GEX and TCR neighbor sets for every fraction
pub fn build_neighbor_index(
    distances: &MaskedDistances,
    fractions: &[f64],
    tie_seed: Option<u64>,
) -> CongaResult<NeighborIndex> {
    let n = distances.size();
    let mut index = NeighborIndex::default();

    for &fraction in fractions {
        check_fraction(fraction)?;
        let k = num_neighbors(fraction, n);
        info!(
            target: TARGET_NEIGHBORS,
            "Computing neighbors: nbr_frac={} num_neighbors={} num_clones={}", fraction, k, n
        );
        let gex = extract_neighbors(distances.get(Space::Gex), k, tie_seed)?;
        let tcr = extract_neighbors(distances.get(Space::Tcr), k, tie_seed)?;
        index.fractions.push(FractionNeighbors { fraction, gex, tcr });
    }

    Ok(index)
}

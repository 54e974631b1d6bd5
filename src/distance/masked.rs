use tracing::{debug, info};

use super::{pairwise_euclidean, DistanceMatrix};
use crate::data::{Dataset, Space};
use crate::groups::ChainGroups;
use crate::TARGET_DISTANCE;

/// Distance assigned to pairs that must never be neighbors
pub const MASKED_DISTANCE: f64 = f64::INFINITY;

/// Group-masked distance matrices for both spaces
///
/// Only obtainable through [`build_masked_distances`], so neighbor queries
/// can never observe unmasked distances.
#[derive(Debug, Clone)]
pub struct MaskedDistances {
    gex: DistanceMatrix,
    tcr: DistanceMatrix,
}

impl MaskedDistances {
    pub fn get(&self, space: Space) -> &DistanceMatrix {
        match space {
            Space::Gex => &self.gex,
            Space::Tcr => &self.tcr,
        }
    }

    pub fn size(&self) -> usize {
        self.gex.size()
    }

    /// Number of unmasked entries in row `i` (identical in both spaces)
    pub fn eligible_count(&self, i: usize) -> usize {
        self.gex
            .row(i)
            .iter()
            .filter(|d| **d != MASKED_DISTANCE)
            .count()
    }
}

/// Computes both Euclidean distance matrices and masks same-group pairs
///
/// # Arguments
/// * `dataset` - Clones with their GEX and TCR embeddings
/// * `groups` - Alpha/beta chain groups, one entry per clone
///
/// # Returns
/// * Masked matrices for both spaces
pub fn build_masked_distances(dataset: &Dataset, groups: &ChainGroups) -> MaskedDistances {
    info!(target: TARGET_DISTANCE, "Computing gex distances for {} clones", dataset.len());
    let mut gex = pairwise_euclidean(&dataset.gex);
    info!(target: TARGET_DISTANCE, "Computing tcr distances for {} clones", dataset.len());
    let mut tcr = pairwise_euclidean(&dataset.tcr);

    let masked = mask_shared_groups(&mut gex, groups);
    mask_shared_groups(&mut tcr, groups);
    debug!(
        target: TARGET_DISTANCE,
        "Masked {} same-group entries per space (self pairs included)", masked
    );

    MaskedDistances { gex, tcr }
}

/// Overwrites row `i` wherever column `j` shares an alpha or beta group with `i`
///
/// Masking is driven by the row's own groups; each clone only ever consults
/// its own row when looking for neighbors.
///
/// # Returns
/// * Number of entries masked
pub fn mask_shared_groups(matrix: &mut DistanceMatrix, groups: &ChainGroups) -> usize {
    let n = matrix.size();
    let mut masked = 0;
    for i in 0..n {
        for j in 0..n {
            if groups.shares_group(i, j) {
                matrix.set(i, j, MASKED_DISTANCE);
                masked += 1;
            }
        }
    }
    masked
}

use std::collections::{BTreeMap, BTreeSet};

use crate::data::CloneRecord;

/// Per-clone alpha and beta group ids
///
/// Clones with the same alpha chain share an alpha group, clones with the
/// same beta chain share a beta group; the two sides are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainGroups {
    pub alpha: Vec<usize>,
    pub beta: Vec<usize>,
}

impl ChainGroups {
    /// Derives groups from the clones' chain keys
    pub fn from_clones(clones: &[CloneRecord]) -> Self {
        let alpha_keys: Vec<String> = clones.iter().map(|c| c.alpha_key()).collect();
        let beta_keys: Vec<String> = clones.iter().map(|c| c.beta_key()).collect();
        Self {
            alpha: enumerate_sorted(&alpha_keys),
            beta: enumerate_sorted(&beta_keys),
        }
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// True when `j` shares either chain with `i` (including `i == j`)
    pub fn shares_group(&self, i: usize, j: usize) -> bool {
        self.alpha[i] == self.alpha[j] || self.beta[i] == self.beta[j]
    }

    /// Number of clones that `i` may legitimately count as neighbors
    pub fn eligible_count(&self, i: usize) -> usize {
        (0..self.len()).filter(|&j| !self.shares_group(i, j)).count()
    }
}

/// Maps each key to the rank of its value among the sorted distinct keys
///
/// Ids are therefore independent of input order.
pub fn enumerate_sorted<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let distinct: BTreeSet<&K> = keys.iter().collect();
    let ids: BTreeMap<&K, usize> = distinct
        .into_iter()
        .enumerate()
        .map(|(id, key)| (key, id))
        .collect();
    keys.iter().map(|k| ids[k]).collect()
}

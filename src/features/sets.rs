use std::collections::BTreeSet;

use crate::neighbors::NeighborSets;

/// `{i} ∪ nbrs[i]` for every clone
pub fn neighborhood_sets(nbrs: &NeighborSets) -> Vec<Vec<usize>> {
    nbrs.rows()
        .enumerate()
        .map(|(i, row)| {
            let mut set = Vec::with_capacity(row.len() + 1);
            set.push(i);
            set.extend_from_slice(row);
            set
        })
        .collect()
}

/// One set per cluster, held by its first member; every other clone gets an empty set
pub fn cluster_sets(clusters: &[u32]) -> Vec<Vec<usize>> {
    keyed_sets(clusters)
}

/// One set per distinct key, held by the first clone carrying it
pub fn keyed_sets<K: Ord>(keys: &[K]) -> Vec<Vec<usize>> {
    let mut seen = BTreeSet::new();
    keys.iter()
        .map(|key| {
            if seen.insert(key) {
                members(keys, key)
            } else {
                Vec::new()
            }
        })
        .collect()
}

/// Gene name without its allele, e.g. `TRBV7-9*01` -> `TRBV7-9`
pub fn strip_allele(gene: &str) -> &str {
    gene.split('*').next().unwrap_or(gene)
}

/// Indices whose key equals `key`
pub fn members<K: PartialEq>(keys: &[K], key: &K) -> Vec<usize> {
    keys.iter()
        .enumerate()
        .filter(|(_, k)| *k == key)
        .map(|(i, _)| i)
        .collect()
}

/// Good clones whose key equals `key`
pub fn good_members<K: PartialEq>(keys: &[K], good: &[bool], key: &K) -> Vec<usize> {
    members(keys, key)
        .into_iter()
        .filter(|&i| good[i])
        .collect()
}

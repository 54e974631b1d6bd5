use std::collections::BTreeMap;

use super::connectivity::NeighborGraph;

const MAX_LEVELS: usize = 32;
const MAX_PASSES: usize = 100;

/// Multi-level Louvain community detection
///
/// Nodes are visited in index order, so the result is deterministic.
/// Communities are numbered by decreasing size (ties by first member).
pub fn louvain(graph: &NeighborGraph, resolution: f64) -> Vec<usize> {
    let n = graph.size();
    let mut membership: Vec<usize> = (0..n).collect();
    let mut level: Vec<BTreeMap<usize, f64>> = graph
        .adjacency
        .iter()
        .map(|edges| edges.iter().copied().collect())
        .collect();

    for _ in 0..MAX_LEVELS {
        let (communities, moved) = local_moving(&level, resolution);
        if !moved {
            break;
        }
        for node in membership.iter_mut() {
            *node = communities[*node];
        }
        level = aggregate(&level, &communities);
    }

    relabel_by_size(&membership)
}

/// Moves nodes between communities until modularity stops improving
///
/// # Returns
/// * Compact community id per node and whether any node moved
fn local_moving(adjacency: &[BTreeMap<usize, f64>], resolution: f64) -> (Vec<usize>, bool) {
    let n = adjacency.len();
    let degree: Vec<f64> = adjacency.iter().map(|edges| edges.values().sum()).collect();
    let total: f64 = degree.iter().sum();
    let mut community: Vec<usize> = (0..n).collect();
    if total <= 0.0 {
        return (community, false);
    }

    let mut community_degree = degree.clone();
    let mut moved_any = false;

    for _ in 0..MAX_PASSES {
        let mut moved = false;
        for i in 0..n {
            let current = community[i];
            community_degree[current] -= degree[i];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for (&j, &w) in &adjacency[i] {
                if j != i {
                    *links.entry(community[j]).or_insert(0.0) += w;
                }
            }

            let gain = |c: usize, link: f64| {
                link - resolution * community_degree[c] * degree[i] / total
            };
            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
            for (&c, &link) in &links {
                let g = gain(c, link);
                if g > best_gain + 1e-12 {
                    best = c;
                    best_gain = g;
                }
            }

            community_degree[best] += degree[i];
            if best != current {
                community[i] = best;
                moved = true;
                moved_any = true;
            }
        }
        if !moved {
            break;
        }
    }

    (compact(&community), moved_any)
}

/// Collapses each community into a single node, keeping internal weight as a self loop
fn aggregate(adjacency: &[BTreeMap<usize, f64>], community: &[usize]) -> Vec<BTreeMap<usize, f64>> {
    let size = community.iter().max().map(|c| c + 1).unwrap_or(0);
    let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); size];
    for (i, edges) in adjacency.iter().enumerate() {
        for (&j, &w) in edges {
            *merged[community[i]].entry(community[j]).or_insert(0.0) += w;
        }
    }
    merged
}

fn compact(labels: &[usize]) -> Vec<usize> {
    let mut ids: BTreeMap<usize, usize> = BTreeMap::new();
    labels
        .iter()
        .map(|&label| {
            let next = ids.len();
            *ids.entry(label).or_insert(next)
        })
        .collect()
}

fn relabel_by_size(labels: &[usize]) -> Vec<usize> {
    let mut sizes: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        sizes.entry(label).or_insert((0, i)).0 += 1;
    }
    let mut order: Vec<(usize, usize, usize)> = sizes
        .into_iter()
        .map(|(label, (size, first))| (label, size, first))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    let rank: BTreeMap<usize, usize> = order
        .iter()
        .enumerate()
        .map(|(new, &(label, _, _))| (label, new))
        .collect();
    labels.iter().map(|label| rank[label]).collect()
}

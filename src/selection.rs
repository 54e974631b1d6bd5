use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::overlap::ScoreTriple;
use crate::TARGET_SELECTION;

/// Minimum cluster size scaled to the population size
///
/// Populations up to `reference_size` use `nominal` unchanged; larger ones
/// scale it proportionally, rounding half up.
pub fn adaptive_min_cluster_size(num_clones: usize, nominal: usize, reference_size: usize) -> usize {
    if num_clones <= reference_size || reference_size == 0 {
        nominal
    } else {
        (0.5 + nominal as f64 * num_clones as f64 / reference_size as f64) as usize
    }
}

/// Flags clones with at least one score at or above zero
pub fn good_mask(scores: &[ScoreTriple]) -> Vec<bool> {
    scores.iter().map(|s| s.max() >= 0.0).collect()
}

/// Outcome of thresholding the score triples
#[derive(Debug, Clone)]
pub struct GoodSelection {
    pub mask: Vec<bool>,
    pub min_cluster_size: usize,
}

impl GoodSelection {
    pub fn num_good(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn good_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Computes the good mask and the adaptive minimum cluster size
pub fn select_good(
    scores: &[ScoreTriple],
    nominal_min_size: usize,
    reference_size: usize,
) -> GoodSelection {
    let mask = good_mask(scores);
    let min_cluster_size = adaptive_min_cluster_size(scores.len(), nominal_min_size, reference_size);
    let selection = GoodSelection {
        mask,
        min_cluster_size,
    };
    info!(
        target: TARGET_SELECTION,
        "num_good: {} of {} clones, min_cluster_size: {}",
        selection.num_good(),
        scores.len(),
        min_cluster_size
    );
    selection
}

/// A (GEX cluster, TCR cluster) combination with its good-clone count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterPair {
    pub gex_cluster: u32,
    pub tcr_cluster: u32,
    pub count: usize,
}

/// Counts good clones per cluster pair
pub fn count_cluster_pairs(
    gex_clusters: &[u32],
    tcr_clusters: &[u32],
    good: &[bool],
) -> BTreeMap<(u32, u32), usize> {
    let mut counts = BTreeMap::new();
    for ((&g, &t), &is_good) in gex_clusters.iter().zip(tcr_clusters).zip(good) {
        if is_good {
            *counts.entry((g, t)).or_insert(0) += 1;
        }
    }
    counts
}

/// Cluster pairs with at least `min_size` good clones, largest first
pub fn select_cluster_pairs(
    counts: &BTreeMap<(u32, u32), usize>,
    min_size: usize,
) -> Vec<ClusterPair> {
    let mut pairs: Vec<ClusterPair> = counts
        .iter()
        .filter(|(_, &count)| count >= min_size)
        .map(|(&(gex_cluster, tcr_cluster), &count)| ClusterPair {
            gex_cluster,
            tcr_cluster,
            count,
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then((a.gex_cluster, a.tcr_cluster).cmp(&(b.gex_cluster, b.tcr_cluster)))
    });
    info!(
        target: TARGET_SELECTION,
        "num_good_cluster_pairs: {} (of {} pairs with good clones, min size {})",
        pairs.len(),
        counts.len(),
        min_size
    );
    pairs
}

/// Observed vs. independence-expected clone counts for one cluster pair
#[derive(Debug, Clone, Serialize)]
pub struct ClusterInteraction {
    pub gex_cluster: u32,
    pub tcr_cluster: u32,
    pub observed: usize,
    pub expected: f64,
    /// Observed over expected
    pub enrichment: f64,
    pub gex_cluster_size: usize,
    pub tcr_cluster_size: usize,
}

/// Cross-tabulates all clones by cluster pair
pub fn cluster_interactions(gex_clusters: &[u32], tcr_clusters: &[u32]) -> Vec<ClusterInteraction> {
    let n = gex_clusters.len().min(tcr_clusters.len());
    if n == 0 {
        return Vec::new();
    }
    let everyone = vec![true; n];
    let pair_counts = count_cluster_pairs(gex_clusters, tcr_clusters, &everyone);

    let mut gex_sizes: BTreeMap<u32, usize> = BTreeMap::new();
    let mut tcr_sizes: BTreeMap<u32, usize> = BTreeMap::new();
    for (&g, &t) in gex_clusters.iter().zip(tcr_clusters) {
        *gex_sizes.entry(g).or_insert(0) += 1;
        *tcr_sizes.entry(t).or_insert(0) += 1;
    }

    pair_counts
        .into_iter()
        .map(|((g, t), observed)| {
            let gex_cluster_size = gex_sizes[&g];
            let tcr_cluster_size = tcr_sizes[&t];
            let expected = gex_cluster_size as f64 * tcr_cluster_size as f64 / n as f64;
            ClusterInteraction {
                gex_cluster: g,
                tcr_cluster: t,
                observed,
                expected,
                enrichment: observed as f64 / expected,
                gex_cluster_size,
                tcr_cluster_size,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::floor_score;

    #[test]
    fn test_adaptive_min_cluster_size() {
        assert_eq!(adaptive_min_cluster_size(500, 5, 5000), 5);
        assert_eq!(adaptive_min_cluster_size(5000, 5, 5000), 5);
        assert_eq!(adaptive_min_cluster_size(10000, 5, 5000), 10);
        assert_eq!(adaptive_min_cluster_size(50000, 5, 5000), 50);
        assert_eq!(adaptive_min_cluster_size(5500, 5, 5000), 6);
    }

    #[test]
    fn test_good_mask_uses_any_column() {
        let floor = floor_score(1000);
        let scores = vec![
            ScoreTriple([floor; 3]),
            ScoreTriple([floor, 0.0, floor]),
            ScoreTriple([floor, floor, 2.5]),
            ScoreTriple([-0.01, -0.5, floor]),
        ];
        assert_eq!(good_mask(&scores), vec![false, true, true, false]);

        let selection = select_good(&scores, 5, 5000);
        assert_eq!(selection.num_good(), 2);
        assert_eq!(selection.good_indices(), vec![1, 2]);
        assert_eq!(selection.min_cluster_size, 5);
    }

    #[test]
    fn test_cluster_pair_counts_only_good_clones() {
        let gex = [0, 0, 0, 1, 1, 2];
        let tcr = [5, 5, 6, 5, 5, 6];
        let good = [true, true, true, false, true, false];
        let counts = count_cluster_pairs(&gex, &tcr, &good);
        assert_eq!(counts.get(&(0, 5)), Some(&2));
        assert_eq!(counts.get(&(0, 6)), Some(&1));
        assert_eq!(counts.get(&(1, 5)), Some(&1));
        assert_eq!(counts.get(&(2, 6)), None);
        assert_eq!(counts.values().sum::<usize>(), 4);
    }

    #[test]
    fn test_cluster_pair_threshold() {
        let mut gex = vec![3; 4];
        let mut tcr = vec![7; 4];
        let mut good = vec![true; 4];
        gex.extend([1, 1]);
        tcr.extend([2, 2]);
        good.extend([true, false]);

        let pairs = select_cluster_pairs(&count_cluster_pairs(&gex, &tcr, &good), 5);
        assert!(pairs.is_empty());

        gex.push(3);
        tcr.push(7);
        good.push(true);
        let pairs = select_cluster_pairs(&count_cluster_pairs(&gex, &tcr, &good), 5);
        assert_eq!(
            pairs,
            vec![ClusterPair {
                gex_cluster: 3,
                tcr_cluster: 7,
                count: 5
            }]
        );
    }

    #[test]
    fn test_cluster_interactions() {
        let gex = [0, 0, 1, 1];
        let tcr = [0, 0, 1, 0];
        let table = cluster_interactions(&gex, &tcr);
        assert_eq!(table.len(), 3);
        let first = &table[0];
        assert_eq!((first.gex_cluster, first.tcr_cluster, first.observed), (0, 0, 2));
        assert_eq!(first.expected, 1.5);
        assert!((first.enrichment - 4.0 / 3.0).abs() < 1e-12);
    }
}

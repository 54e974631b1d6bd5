use anyhow::Result;

use super::types::OverlapRow;
use crate::error::CongaError;
use crate::groups::ChainGroups;
use crate::neighbors::NeighborSets;
use crate::stats::{expected_overlap, ln_upper_tail, neg_log10_from_ln};

/// Significance test for the agreement of two per-clone sets
///
/// Implementations return one row per clone that was tested and whose
/// population-scaled p-value does not exceed `pval_threshold`. An empty
/// result is legitimate and means "no evidence".
pub trait OverlapTest {
    /// Compares each clone's neighbors in one space with its neighbors in the other
    fn neighbor_neighbor(
        &self,
        groups: &ChainGroups,
        nbrs_a: &NeighborSets,
        nbrs_b: &NeighborSets,
        pval_threshold: f64,
    ) -> Result<Vec<OverlapRow>>;

    /// Compares each clone's neighbors in one space with its cluster in the other
    fn neighbor_cluster(
        &self,
        groups: &ChainGroups,
        nbrs: &NeighborSets,
        clusters: &[u32],
        pval_threshold: f64,
    ) -> Result<Vec<OverlapRow>>;
}

/// Hypergeometric upper-tail test over each clone's eligible candidates
///
/// The null population for clone `i` is every clone that is neither `i`
/// nor shares a chain group with `i`. P-values are multiplied by the
/// number of clones before thresholding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HypergeometricOverlap;

impl OverlapTest for HypergeometricOverlap {
    fn neighbor_neighbor(
        &self,
        groups: &ChainGroups,
        nbrs_a: &NeighborSets,
        nbrs_b: &NeighborSets,
        pval_threshold: f64,
    ) -> Result<Vec<OverlapRow>> {
        let n = groups.len();
        check_len("neighbor sets", n, nbrs_a.len())?;
        check_len("neighbor sets", n, nbrs_b.len())?;

        let mut in_b = vec![false; n];
        let mut rows = Vec::new();
        for i in 0..n {
            for &j in nbrs_b.row(i) {
                in_b[j] = true;
            }
            let overlap = nbrs_a.row(i).iter().filter(|&&j| in_b[j]).count();
            for &j in nbrs_b.row(i) {
                in_b[j] = false;
            }
            if overlap == 0 {
                continue;
            }

            let population = groups.eligible_count(i);
            let (k_a, k_b) = (nbrs_a.k(), nbrs_b.k());
            let ln_pvalue =
                ln_upper_tail(population as u64, k_a as u64, k_b as u64, overlap as u64);
            let ln_score = ln_pvalue + (n as f64).ln();
            if ln_score.is_finite() && ln_score <= pval_threshold.ln() {
                rows.push(OverlapRow {
                    clone_index: i,
                    conga_score: conga_score_from_ln(ln_score),
                    significance: neg_log10_from_ln(ln_score),
                    overlap,
                    expected_overlap: expected_overlap(population as u64, k_a as u64, k_b as u64),
                    nbr_size: k_a,
                    reference_size: k_b,
                    population,
                });
            }
        }
        Ok(rows)
    }

    fn neighbor_cluster(
        &self,
        groups: &ChainGroups,
        nbrs: &NeighborSets,
        clusters: &[u32],
        pval_threshold: f64,
    ) -> Result<Vec<OverlapRow>> {
        let n = groups.len();
        check_len("neighbor sets", n, nbrs.len())?;
        check_len("cluster labels", n, clusters.len())?;

        let mut rows = Vec::new();
        for i in 0..n {
            let cluster = clusters[i];
            let overlap = nbrs.row(i).iter().filter(|&&j| clusters[j] == cluster).count();
            if overlap == 0 {
                continue;
            }

            let (mut population, mut cluster_size) = (0usize, 0usize);
            for j in 0..n {
                if !groups.shares_group(i, j) {
                    population += 1;
                    if clusters[j] == cluster {
                        cluster_size += 1;
                    }
                }
            }

            let k = nbrs.k();
            let ln_pvalue = ln_upper_tail(
                population as u64,
                cluster_size as u64,
                k as u64,
                overlap as u64,
            );
            let ln_score = ln_pvalue + (n as f64).ln();
            if ln_score.is_finite() && ln_score <= pval_threshold.ln() {
                rows.push(OverlapRow {
                    clone_index: i,
                    conga_score: conga_score_from_ln(ln_score),
                    significance: neg_log10_from_ln(ln_score),
                    overlap,
                    expected_overlap: expected_overlap(
                        population as u64,
                        cluster_size as u64,
                        k as u64,
                    ),
                    nbr_size: k,
                    reference_size: cluster_size,
                    population,
                });
            }
        }
        Ok(rows)
    }
}

/// Scaled p-value from its log, kept strictly positive when it underflows
fn conga_score_from_ln(ln_score: f64) -> f64 {
    ln_score.exp().max(f64::MIN_POSITIVE)
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CongaError::LengthMismatch {
            what,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::{OverlapType, ScoreAccumulator};

    /// Clones with unique chains so nothing but self is excluded
    fn singleton_groups(n: usize) -> ChainGroups {
        ChainGroups {
            alpha: (0..n).collect(),
            beta: (0..n).collect(),
        }
    }

    #[test]
    fn test_perfect_neighbor_agreement_is_significant() {
        // 40 clones in 4 tight blocks of 10; both spaces agree on blocks
        let n = 40;
        let groups = singleton_groups(n);
        let mut indices = Vec::new();
        for i in 0..n {
            let block = i / 10;
            indices.extend((block * 10..block * 10 + 10).filter(|&j| j != i).take(4));
        }
        let nbrs = NeighborSets::new(4, indices);

        let rows = HypergeometricOverlap
            .neighbor_neighbor(&groups, &nbrs, &nbrs, 1.0)
            .unwrap();
        assert_eq!(rows.len(), n);
        for row in &rows {
            assert_eq!(row.overlap, 4);
            assert_eq!(row.population, 39);
            assert!(row.conga_score > 0.0 && row.conga_score <= 1.0);
            assert!(row.excess() > 0.0);
        }
    }

    #[test]
    fn test_overwhelming_agreement_stays_finite() {
        // 10 blocks of 301 clones; each clone's 300 neighbors are its block in both spaces
        let (n, k) = (3010, 300);
        let groups = singleton_groups(n);
        let mut indices = Vec::with_capacity(n * k);
        for i in 0..n {
            let block = i / (k + 1);
            indices.extend((block * (k + 1)..(block + 1) * (k + 1)).filter(|&j| j != i));
        }
        let nbrs = NeighborSets::new(k, indices);

        let rows = HypergeometricOverlap
            .neighbor_neighbor(&groups, &nbrs, &nbrs, 1.0)
            .unwrap();
        assert_eq!(rows.len(), n);
        for row in &rows {
            assert_eq!(row.overlap, k);
            assert!(row.conga_score > 0.0 && row.conga_score <= 1.0);
            assert!(row.significance.is_finite());
            assert!(row.significance > 400.0);
        }

        let mut accumulator = ScoreAccumulator::new(n, 1);
        for row in &rows {
            accumulator.record(row.clone_index, OverlapType::NbrNbr, 0, row.significance);
        }
        let scores = accumulator.reduce();
        assert!(scores.iter().all(|s| s.get(OverlapType::NbrNbr).is_finite()));
        assert!(scores.iter().all(|s| s.get(OverlapType::NbrNbr) > 400.0));
    }

    #[test]
    fn test_disjoint_neighbors_return_nothing() {
        let groups = singleton_groups(6);
        let a = NeighborSets::new(1, vec![1, 0, 3, 2, 5, 4]);
        let b = NeighborSets::new(1, vec![2, 3, 4, 5, 0, 1]);
        let rows = HypergeometricOverlap
            .neighbor_neighbor(&groups, &a, &b, 1.0)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_neighbor_cluster_counts_cluster_mates() {
        let n = 30;
        let groups = singleton_groups(n);
        let clusters: Vec<u32> = (0..n).map(|i| (i / 10) as u32).collect();
        let mut indices = Vec::new();
        for i in 0..n {
            let block = i / 10;
            indices.extend((block * 10..block * 10 + 10).filter(|&j| j != i).take(3));
        }
        let nbrs = NeighborSets::new(3, indices);

        let rows = HypergeometricOverlap
            .neighbor_cluster(&groups, &nbrs, &clusters, 1.0)
            .unwrap();
        assert_eq!(rows.len(), n);
        assert!(rows.iter().all(|r| r.overlap == 3 && r.reference_size == 9));
    }

    #[test]
    fn test_same_group_clones_leave_the_null_population() {
        let groups = ChainGroups {
            alpha: vec![0, 0, 1, 2, 3],
            beta: vec![0, 1, 2, 3, 4],
        };
        let clusters = vec![0, 0, 0, 1, 1];
        let nbrs = NeighborSets::new(1, vec![2, 2, 0, 4, 3]);
        let rows = HypergeometricOverlap
            .neighbor_cluster(&groups, &nbrs, &clusters, f64::INFINITY)
            .unwrap();
        let first = rows.iter().find(|r| r.clone_index == 0).unwrap();
        assert_eq!(first.population, 3);
        assert_eq!(first.reference_size, 1);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let groups = singleton_groups(3);
        let nbrs = NeighborSets::new(1, vec![1, 0, 0]);
        assert!(HypergeometricOverlap
            .neighbor_cluster(&groups, &nbrs, &[0, 1], 1.0)
            .is_err());
    }
}

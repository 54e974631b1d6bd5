use anyhow::{Context, Result};
use tracing::{debug, info};

use super::significance::OverlapTest;
use super::types::{OverlapRecord, OverlapRow, OverlapType, ScoreTriple};
use crate::data::{Dataset, Space};
use crate::groups::ChainGroups;
use crate::neighbors::NeighborIndex;
use crate::TARGET_OVERLAP;

/// The overlap tests report everything; aggregation happens here
pub const OVERLAP_PVAL_THRESHOLD: f64 = 1.0;

/// Score of a clone for which no test beat chance: `-log10(n)`
pub fn floor_score(num_clones: usize) -> f64 {
    -(num_clones as f64).log10()
}

/// Per-(clone, overlap type, fraction) significance, reduced by max at the end
///
/// Every cell starts at the floor score and only ever increases, so the
/// reduction does not depend on the order fractions are scored in.
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    num_clones: usize,
    num_fractions: usize,
    floor: f64,
    cells: Vec<f64>,
}

impl ScoreAccumulator {
    pub fn new(num_clones: usize, num_fractions: usize) -> Self {
        let floor = floor_score(num_clones);
        Self {
            num_clones,
            num_fractions,
            floor,
            cells: vec![floor; num_clones * OverlapType::ALL.len() * num_fractions],
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    fn cell(&self, clone_index: usize, overlap_type: OverlapType, fraction_index: usize) -> usize {
        (clone_index * OverlapType::ALL.len() + overlap_type.column()) * self.num_fractions
            + fraction_index
    }

    /// Folds one `-log10(conga_score)` into the cell of the clone it belongs to
    pub fn record(
        &mut self,
        clone_index: usize,
        overlap_type: OverlapType,
        fraction_index: usize,
        significance: f64,
    ) {
        let cell = self.cell(clone_index, overlap_type, fraction_index);
        self.cells[cell] = self.cells[cell].max(significance);
    }

    pub fn get(&self, clone_index: usize, overlap_type: OverlapType, fraction_index: usize) -> f64 {
        self.cells[self.cell(clone_index, overlap_type, fraction_index)]
    }

    /// Maximum over fractions for every clone and overlap type
    pub fn reduce(&self) -> Vec<ScoreTriple> {
        (0..self.num_clones)
            .map(|i| {
                let mut triple = [self.floor; 3];
                for overlap_type in OverlapType::ALL {
                    for f in 0..self.num_fractions {
                        let value = self.get(i, overlap_type, f);
                        let slot = &mut triple[overlap_type.column()];
                        *slot = slot.max(value);
                    }
                }
                ScoreTriple(triple)
            })
            .collect()
    }
}

/// Scores plus the long-form table of every reported test
#[derive(Debug, Clone)]
pub struct OverlapResults {
    pub scores: Vec<ScoreTriple>,
    pub records: Vec<OverlapRecord>,
}

/// Runs all three overlap types at every neighborhood fraction
///
/// # Arguments
/// * `test` - Overlap significance test
/// * `dataset` - Clones, for cluster labels and record metadata
/// * `groups` - Chain groups defining the null populations
/// * `index` - Neighbor sets for every fraction
///
/// # Returns
/// * `Ok(OverlapResults)` - Per-clone score triples and tagged result rows
/// * `Err` - If the test itself fails
pub fn score_overlaps(
    test: &dyn OverlapTest,
    dataset: &Dataset,
    groups: &ChainGroups,
    index: &NeighborIndex,
) -> Result<OverlapResults> {
    let gex_clusters = dataset.clusters(Space::Gex);
    let tcr_clusters = dataset.clusters(Space::Tcr);
    let mut accumulator = ScoreAccumulator::new(dataset.len(), index.fractions.len());
    let mut records = Vec::new();

    for (fraction_index, neighbors) in index.fractions.iter().enumerate() {
        let nbr_frac = neighbors.fraction;
        for overlap_type in OverlapType::ALL {
            let rows = match overlap_type {
                OverlapType::NbrNbr => test.neighbor_neighbor(
                    groups,
                    &neighbors.gex,
                    &neighbors.tcr,
                    OVERLAP_PVAL_THRESHOLD,
                ),
                OverlapType::ClusterNbr => test.neighbor_cluster(
                    groups,
                    &neighbors.tcr,
                    &gex_clusters,
                    OVERLAP_PVAL_THRESHOLD,
                ),
                OverlapType::NbrCluster => test.neighbor_cluster(
                    groups,
                    &neighbors.gex,
                    &tcr_clusters,
                    OVERLAP_PVAL_THRESHOLD,
                ),
            }
            .with_context(|| {
                format!(
                    "Overlap test {} failed at nbr_frac {}",
                    overlap_type, nbr_frac
                )
            })?;

            if rows.is_empty() {
                info!(
                    target: TARGET_OVERLAP,
                    "No {} results at nbr_frac {}; scores unchanged", overlap_type, nbr_frac
                );
                continue;
            }

            let recorded = fold_rows(
                &mut accumulator,
                &mut records,
                dataset,
                &rows,
                overlap_type,
                fraction_index,
                nbr_frac,
            );
            info!(
                target: TARGET_OVERLAP,
                "{} at nbr_frac {}: {} significant clones", overlap_type, nbr_frac, recorded
            );
        }
    }

    let scores = accumulator.reduce();
    Ok(OverlapResults { scores, records })
}

fn fold_rows(
    accumulator: &mut ScoreAccumulator,
    records: &mut Vec<OverlapRecord>,
    dataset: &Dataset,
    rows: &[OverlapRow],
    overlap_type: OverlapType,
    fraction_index: usize,
    nbr_frac: f64,
) -> usize {
    let mut recorded = 0;
    for row in rows {
        let Some(clone) = dataset.clones.get(row.clone_index) else {
            debug!(
                target: TARGET_OVERLAP,
                "Ignoring {} row for unknown clone index {}", overlap_type, row.clone_index
            );
            continue;
        };
        accumulator.record(row.clone_index, overlap_type, fraction_index, row.significance);
        records.push(OverlapRecord::new(row, clone, nbr_frac, overlap_type));
        recorded += 1;
    }
    recorded
}

pub mod sets;

// Re-exports
pub use rank_test::{MannWhitney, RankRow, RankTest, DEFAULT_MIN_SET_SIZE};
pub use sets::{cluster_sets, good_members, keyed_sets, members, neighborhood_sets, strip_allele};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::data::{CloneRecord, FeatureMatrix};
use crate::neighbors::NeighborSets;
use crate::recluster::SubsetTag;
use crate::TARGET_FEATURES;

/// Every ranking is reported in full and filtered downstream
pub const RANK_PVAL_THRESHOLD: f64 = 1.0;

/// The four gene segments of a paired receptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcrSegment {
    Va,
    Ja,
    Vb,
    Jb,
}

impl TcrSegment {
    pub const ALL: [TcrSegment; 4] = [TcrSegment::Va, TcrSegment::Ja, TcrSegment::Vb, TcrSegment::Jb];

    /// The clone's gene for this segment, allele removed
    pub fn gene(self, clone: &CloneRecord) -> &str {
        let gene = match self {
            TcrSegment::Va => &clone.va,
            TcrSegment::Ja => &clone.ja,
            TcrSegment::Vb => &clone.vb,
            TcrSegment::Jb => &clone.jb,
        };
        strip_allele(gene)
    }
}

impl fmt::Display for TcrSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcrSegment::Va => write!(f, "va"),
            TcrSegment::Ja => write!(f, "ja"),
            TcrSegment::Vb => write!(f, "vb"),
            TcrSegment::Jb => write!(f, "jb"),
        }
    }
}

/// The differential-feature tables the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureAnalysis {
    /// GEX features of each TCR neighborhood
    TcrNbrhoodGenes,
    /// GEX features of each TCR cluster
    TcrClusterGenes,
    /// GEX features of the clones sharing each segment gene
    TcrSegmentGenes(TcrSegment),
    /// TCR scores of each GEX neighborhood
    GexNbrhoodScores,
    /// TCR scores of each GEX cluster
    GexClusterScores,
    GoodClusterPairGenes,
    GoodClusterPairTcrScores,
    /// GEX features of the good clones in each re-clustered cluster
    GoodAvgClusterGenes(SubsetTag),
}

impl FeatureAnalysis {
    /// Gene tables only report features raised in the set
    pub fn upregulated_only(self) -> bool {
        !matches!(
            self,
            FeatureAnalysis::GexNbrhoodScores
                | FeatureAnalysis::GexClusterScores
                | FeatureAnalysis::GoodClusterPairTcrScores
        )
    }
}

impl fmt::Display for FeatureAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureAnalysis::TcrNbrhoodGenes => write!(f, "tcr_nbrhood_genes"),
            FeatureAnalysis::TcrClusterGenes => write!(f, "tcr_cluster_genes"),
            FeatureAnalysis::TcrSegmentGenes(segment) => write!(f, "tcr_segment_genes_{}", segment),
            FeatureAnalysis::GexNbrhoodScores => write!(f, "gex_nbrhood_scores"),
            FeatureAnalysis::GexClusterScores => write!(f, "gex_cluster_scores"),
            FeatureAnalysis::GoodClusterPairGenes => write!(f, "good_cluster_pair_genes"),
            FeatureAnalysis::GoodClusterPairTcrScores => write!(f, "good_cluster_pair_tcr_scores"),
            FeatureAnalysis::GoodAvgClusterGenes(tag) => write!(f, "good_avg{}_cluster_genes", tag),
        }
    }
}

/// A ranked feature tagged with the analysis and the set it describes
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRecord {
    pub analysis: String,
    pub nbr_frac: f64,
    /// Only neighborhood sets correspond to a single clone
    pub clone_index: Option<usize>,
    pub group: String,
    pub feature: String,
    pub statistic: f64,
    pub mwu_pvalue: f64,
    pub mwu_pvalue_adj: f64,
    pub mean_in: f64,
    pub mean_out: f64,
    pub set_size: usize,
}

/// Labelled sets of clones to rank
pub struct SetCollection {
    pub sets: Vec<Vec<usize>>,
    pub labels: Vec<String>,
    /// Whether set `i` is the neighborhood of clone `i`
    pub per_clone: bool,
}

impl SetCollection {
    /// Neighborhood of every clone, labelled by clone id
    pub fn neighborhoods(clones: &[CloneRecord], nbrs: &NeighborSets) -> Self {
        Self {
            sets: neighborhood_sets(nbrs),
            labels: clones.iter().map(|c| c.clone_id.clone()).collect(),
            per_clone: true,
        }
    }

    /// One set per cluster, labelled by cluster id
    pub fn clusters(clusters: &[u32]) -> Self {
        Self {
            sets: cluster_sets(clusters),
            labels: clusters.iter().map(|c| c.to_string()).collect(),
            per_clone: false,
        }
    }

    /// One set per distinct gene of `segment`, labelled by gene
    pub fn segments(clones: &[CloneRecord], segment: TcrSegment) -> Self {
        let genes: Vec<&str> = clones.iter().map(|c| segment.gene(c)).collect();
        Self {
            sets: keyed_sets(&genes),
            labels: genes.iter().map(|g| g.to_string()).collect(),
            per_clone: false,
        }
    }

    /// Explicit groups, e.g. the good members of each selected cluster pair
    pub fn groups(groups: Vec<(String, Vec<usize>)>) -> Self {
        let (labels, sets) = groups.into_iter().unzip();
        Self {
            sets,
            labels,
            per_clone: false,
        }
    }
}

/// Runs `test` over `collection` and tags the surviving rows
///
/// # Arguments
/// * `test` - the rank test
/// * `features` - per-clone feature columns
/// * `collection` - sets to rank, with labels
/// * `analysis` - which table the rows belong to
/// * `nbr_frac` - neighbor fraction of the sets, `0.0` for cluster-based sets
pub fn rank_sets(
    test: &dyn RankTest,
    features: &FeatureMatrix,
    collection: &SetCollection,
    analysis: FeatureAnalysis,
    nbr_frac: f64,
) -> Result<Vec<FeatureRecord>> {
    let rows = test
        .rank_features(features, &collection.sets, RANK_PVAL_THRESHOLD)
        .with_context(|| format!("Failed to rank features for {}", analysis))?;
    let total = rows.len();

    let records: Vec<FeatureRecord> = rows
        .into_iter()
        .filter(|row| !analysis.upregulated_only() || row.statistic > 0.0)
        .map(|row| FeatureRecord {
            analysis: analysis.to_string(),
            nbr_frac,
            clone_index: collection.per_clone.then_some(row.clone_index),
            group: collection
                .labels
                .get(row.clone_index)
                .cloned()
                .unwrap_or_default(),
            feature: row.feature,
            statistic: row.statistic,
            mwu_pvalue: row.mwu_pvalue,
            mwu_pvalue_adj: row.mwu_pvalue_adj,
            mean_in: row.mean_in,
            mean_out: row.mean_out,
            set_size: row.set_size,
        })
        .collect();

    info!(
        target: TARGET_FEATURES,
        "{} (nbr_frac {}): kept {} of {} ranked rows over {} sets",
        analysis,
        nbr_frac,
        records.len(),
        total,
        collection.sets.iter().filter(|s| !s.is_empty()).count()
    );
    Ok(records)
}

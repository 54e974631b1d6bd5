// Module declarations
pub mod combined;
pub mod connectivity;
pub mod louvain;
pub mod projection;

// Re-exports
pub use combined::{combined_distance, DegenerateSubset};
pub use connectivity::{fuzzy_connectivities, knn_from_dense, recluster_num_neighbors, NeighborGraph};
pub use louvain::louvain;
pub use projection::classical_mds;

use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

use crate::data::{Dataset, Space};
use crate::distance::{pairwise_euclidean, DistanceMatrix};
use crate::TARGET_RECLUSTER;

pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Community assignment and 2-D layout for one subset, in subset order
#[derive(Debug, Clone, PartialEq)]
pub struct Reclustering {
    pub clusters: Vec<usize>,
    pub projection: Vec<[f64; 2]>,
}

/// Turns a connectivity graph into clusters and a planar embedding
pub trait ReclusterProvider {
    fn embed_and_cluster(
        &self,
        graph: &NeighborGraph,
        combined: &DistanceMatrix,
    ) -> Result<Reclustering>;
}

/// Louvain on the connectivity graph, classical MDS on the combined distances
#[derive(Debug, Clone, Copy)]
pub struct GraphReclusterer {
    pub resolution: f64,
}

impl Default for GraphReclusterer {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl ReclusterProvider for GraphReclusterer {
    fn embed_and_cluster(
        &self,
        graph: &NeighborGraph,
        combined: &DistanceMatrix,
    ) -> Result<Reclustering> {
        Ok(Reclustering {
            clusters: louvain(graph, self.resolution),
            projection: classical_mds(combined),
        })
    }
}

/// Which clones a re-clustering pass was run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetTag {
    Good,
    Full,
}

impl fmt::Display for SubsetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsetTag::Good => write!(f, "good"),
            SubsetTag::Full => write!(f, "full"),
        }
    }
}

/// Re-clustering results mapped back onto the whole population
///
/// Clones outside the pass's subset have `None` in both vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ReclusterPass {
    pub tag: SubsetTag,
    pub clusters: Vec<Option<u32>>,
    pub projection: Vec<Option<[f64; 2]>>,
}

impl ReclusterPass {
    pub fn subset_size(&self) -> usize {
        self.clusters.iter().filter(|c| c.is_some()).count()
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.iter().flatten().collect::<BTreeSet<_>>().len()
    }

    /// Good clones per new cluster
    pub fn good_counts(&self, good: &[bool]) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for (cluster, &is_good) in self.clusters.iter().zip(good) {
            if let (Some(c), true) = (cluster, is_good) {
                *counts.entry(*c).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Clusters holding at least `min_size` good clones
    pub fn good_clusters(&self, good: &[bool], min_size: usize) -> Vec<u32> {
        self.good_counts(good)
            .into_iter()
            .filter(|(_, count)| *count >= min_size)
            .map(|(cluster, _)| cluster)
            .collect()
    }
}

/// Re-clusters `subset` on the median-normalized combined GEX/TCR distance
///
/// # Arguments
/// * `provider` - community detection and layout
/// * `dataset` - the full population
/// * `tag` - label of the pass
/// * `subset` - population indices to re-cluster, in order
///
/// # Returns
/// * `Ok(None)` when the subset is degenerate, after logging why
pub fn recluster_subset(
    provider: &dyn ReclusterProvider,
    dataset: &Dataset,
    tag: SubsetTag,
    subset: &[usize],
) -> Result<Option<ReclusterPass>> {
    let m = subset.len();
    let gex = pairwise_euclidean(&dataset.embedding(Space::Gex).subset(subset));
    let tcr = pairwise_euclidean(&dataset.embedding(Space::Tcr).subset(subset));
    debug!(
        target: TARGET_RECLUSTER,
        "{}: gex median {:?}, tcr median {:?}",
        tag,
        gex.median(),
        tcr.median()
    );

    let combined = match combined_distance(&gex, &tcr) {
        Ok(combined) => combined,
        Err(reason) => {
            info!(target: TARGET_RECLUSTER, "skipping {} re-clustering: {}", tag, reason);
            return Ok(None);
        }
    };

    let k = recluster_num_neighbors(m);
    let (knn_indices, knn_dists) = knn_from_dense(&combined, k);
    let graph = fuzzy_connectivities(&knn_indices, &knn_dists);
    let result = provider.embed_and_cluster(&graph, &combined)?;
    if result.clusters.len() != m || result.projection.len() != m {
        bail!(
            "{} re-clustering returned {} clusters and {} positions for {} clones",
            tag,
            result.clusters.len(),
            result.projection.len(),
            m
        );
    }

    let mut clusters = vec![None; dataset.len()];
    let mut projection = vec![None; dataset.len()];
    for (sub, &full) in subset.iter().enumerate() {
        clusters[full] = Some(result.clusters[sub] as u32);
        projection[full] = Some(result.projection[sub]);
    }

    let pass = ReclusterPass {
        tag,
        clusters,
        projection,
    };
    info!(
        target: TARGET_RECLUSTER,
        "{} re-clustering: {} clones, {} neighbors, {} clusters",
        tag,
        m,
        k,
        result.clusters.iter().max().map(|c| c + 1).unwrap_or(0)
    );
    Ok(Some(pass))
}

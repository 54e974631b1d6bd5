use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::data::{Dataset, FeatureMatrix, Space};
use crate::distance::build_masked_distances;
use crate::features::{
    good_members, rank_sets, FeatureAnalysis, FeatureRecord, MannWhitney, RankTest, SetCollection,
    TcrSegment,
};
use crate::groups::ChainGroups;
use crate::neighbors::{build_neighbor_index, NeighborIndex};
use crate::output::{summary_path, tsv_path, write_json, write_tsv, FinalObs};
use crate::overlap::{floor_score, score_overlaps, HypergeometricOverlap, OverlapTest, ScoreTriple};
use crate::recluster::{recluster_subset, GraphReclusterer, ReclusterPass, ReclusterProvider, SubsetTag};
use crate::selection::{
    cluster_interactions, count_cluster_pairs, select_cluster_pairs, select_good, ClusterPair,
    GoodSelection,
};
use crate::{TARGET_DATA, TARGET_FEATURES, TARGET_OVERLAP, TARGET_PIPELINE, TARGET_RECLUSTER};

/// The pluggable statistical routines a run delegates to
pub struct Collaborators {
    pub overlap: Box<dyn OverlapTest>,
    pub rank: Box<dyn RankTest>,
    pub recluster: Box<dyn ReclusterProvider>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            overlap: Box::new(HypergeometricOverlap),
            rank: Box::new(MannWhitney::default()),
            recluster: Box::new(GraphReclusterer::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub tag: String,
    pub subset_size: usize,
    pub num_clusters: usize,
    pub num_good_clusters: usize,
}

/// Counts and settings of a finished run, written as `{prefix}_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub num_clones_loaded: usize,
    pub num_clones_excluded: usize,
    pub num_clones: usize,
    pub nbr_fracs: Vec<f64>,
    pub min_cluster_size: usize,
    pub num_good: usize,
    pub num_overlap_records: usize,
    pub good_cluster_pairs: Vec<ClusterPair>,
    pub recluster_passes: Vec<PassSummary>,
    pub artifacts: Vec<String>,
}

/// Writes artifacts under one prefix and remembers what was written
struct Artifacts<'a> {
    prefix: &'a str,
    written: Vec<String>,
}

impl<'a> Artifacts<'a> {
    fn new(prefix: &'a str) -> Self {
        Self {
            prefix,
            written: Vec::new(),
        }
    }

    fn tsv<T: Serialize>(&mut self, stem: &str, records: &[T]) -> Result<()> {
        let path = tsv_path(self.prefix, stem);
        write_tsv(&path, records)?;
        self.remember(&path);
        Ok(())
    }

    fn remember(&mut self, path: &Path) {
        self.written.push(path.display().to_string());
    }
}

/// Runs the whole analysis on a loaded dataset
///
/// # Arguments
/// * `config` - Validated run settings
/// * `dataset` - All loaded clones
/// * `collaborators` - Overlap test, rank test and re-clustering provider
///
/// # Returns
/// * `Ok(RunSummary)` - After every artifact has been written
/// * `Err` - On invalid input or an I/O failure; nothing is scored after a precondition fails
pub fn run(config: &RunConfig, dataset: Dataset, collaborators: &Collaborators) -> Result<RunSummary> {
    let started_at = Utc::now();
    config.validate().context("Invalid run configuration")?;
    let mut artifacts = Artifacts::new(&config.outfile_prefix);

    // 1. Drop excluded GEX clusters
    let num_clones_loaded = dataset.len();
    let (dataset, num_clones_excluded) = if config.exclude_gex_clusters.is_empty() {
        (dataset, 0)
    } else {
        let (kept, removed) = dataset
            .without_gex_clusters(&config.exclude_gex_clusters)
            .context("No clones left after excluding GEX clusters")?;
        info!(
            target: TARGET_DATA,
            "excluded {} clones in gex clusters {:?}", removed, config.exclude_gex_clusters
        );
        (kept, removed)
    };
    let n = dataset.len();
    info!(target: TARGET_DATA, "num_clones: {}", n);

    // 2. Chain groups, masked distances and neighbor sets
    let groups = ChainGroups::from_clones(&dataset.clones);
    let masked = build_masked_distances(&dataset, &groups);
    let index = build_neighbor_index(&masked, &config.nbr_fracs, config.tie_seed)
        .context("Failed to build neighbor sets")?;

    let gex_clusters = dataset.clusters(Space::Gex);
    let tcr_clusters = dataset.clusters(Space::Tcr);
    artifacts.tsv(
        "cluster_interactions",
        &cluster_interactions(&gex_clusters, &tcr_clusters),
    )?;

    // 3. Neighborhood overlap scores
    let (scores, num_overlap_records) = if config.analyses.nbrhood_overlaps {
        let results = score_overlaps(collaborators.overlap.as_ref(), &dataset, &groups, &index)?;
        artifacts.tsv("graph_graph_overlaps", &results.records)?;
        (results.scores, results.records.len())
    } else {
        info!(
            target: TARGET_OVERLAP,
            "neighborhood overlaps not requested; every clone keeps the floor score"
        );
        (vec![ScoreTriple([floor_score(n); 3]); n], 0)
    };

    // 4. Good clones and the adaptive minimum cluster size
    let selection = select_good(
        &scores,
        config.min_cluster_size,
        config.min_cluster_size_repsize,
    );
    let min_size = selection.min_cluster_size;

    // 5. Neighborhood and cluster feature rankings
    run_rank_analyses(config, &dataset, &index, collaborators, &mut artifacts)?;

    // 6. Good cluster pairs
    let pair_counts = count_cluster_pairs(&gex_clusters, &tcr_clusters, &selection.mask);
    let pairs = select_cluster_pairs(&pair_counts, min_size);
    artifacts.tsv("good_cluster_pairs", &pairs)?;
    rank_good_cluster_pairs(&dataset, &selection, &pairs, collaborators, &mut artifacts)?;

    // 7. Re-clustering on the combined distance
    let (passes, recluster_passes) =
        run_recluster_passes(config, &dataset, &selection, collaborators, &mut artifacts)?;

    // 8. Per-clone table and summary
    let final_obs = FinalObs {
        dataset: &dataset,
        groups: &groups,
        scores: &scores,
        good: &selection.mask,
        passes: &passes,
    };
    let final_obs_path = tsv_path(&config.outfile_prefix, "final_obs");
    final_obs.write(&final_obs_path)?;
    artifacts.remember(&final_obs_path);

    let finished_at = Utc::now();
    let summary_file = summary_path(&config.outfile_prefix);
    artifacts.remember(&summary_file);
    let summary = RunSummary {
        started_at,
        finished_at,
        elapsed_seconds: (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
        num_clones_loaded,
        num_clones_excluded,
        num_clones: n,
        nbr_fracs: config.nbr_fracs.clone(),
        min_cluster_size: min_size,
        num_good: selection.num_good(),
        num_overlap_records,
        good_cluster_pairs: pairs,
        recluster_passes,
        artifacts: artifacts.written,
    };
    write_json(&summary_file, &summary)?;

    info!(
        target: TARGET_DATA,
        "run took {:.3} minutes",
        summary.elapsed_seconds / 60.0
    );
    Ok(summary)
}

fn run_rank_analyses(
    config: &RunConfig,
    dataset: &Dataset,
    index: &NeighborIndex,
    collaborators: &Collaborators,
    artifacts: &mut Artifacts,
) -> Result<()> {
    let test = collaborators.rank.as_ref();

    if config.analyses.tcr_nbrhood_genes {
        let analysis = FeatureAnalysis::TcrNbrhoodGenes;
        if let Some(features) = require(&dataset.gex_features, analysis) {
            let ranked = index
                .fractions
                .iter()
                .map(|fraction| {
                    let sets = SetCollection::neighborhoods(&dataset.clones, &fraction.tcr);
                    rank_sets(test, features, &sets, analysis, fraction.fraction)
                })
                .collect::<Result<Vec<_>>>()
                .map(|per_fraction| per_fraction.concat());
            if let Some(records) = skip_on_error(analysis, ranked) {
                artifacts.tsv("tcr_nbrhood_genes", &records)?;
            }
        }
    }

    if config.analyses.tcr_cluster_genes {
        let analysis = FeatureAnalysis::TcrClusterGenes;
        if let Some(features) = require(&dataset.gex_features, analysis) {
            let sets = SetCollection::clusters(&dataset.clusters(Space::Tcr));
            let ranked = rank_sets(test, features, &sets, analysis, 0.0);
            if let Some(records) = skip_on_error(analysis, ranked) {
                artifacts.tsv("tcr_cluster_genes", &records)?;
            }
        }
    }

    if config.analyses.tcr_segment_genes {
        let analysis = FeatureAnalysis::TcrSegmentGenes(TcrSegment::Va);
        if let Some(features) = require(&dataset.gex_features, analysis) {
            // each segment is corrected for its own tests
            let mut records = Vec::new();
            for segment in TcrSegment::ALL {
                let analysis = FeatureAnalysis::TcrSegmentGenes(segment);
                let sets = SetCollection::segments(&dataset.clones, segment);
                let ranked = rank_sets(test, features, &sets, analysis, 0.0);
                if let Some(ranked) = skip_on_error(analysis, ranked) {
                    records.extend(ranked);
                }
            }
            artifacts.tsv("tcr_segment_genes", &records)?;
        }
    }

    if config.analyses.gex_nbrhood_scores {
        let analysis = FeatureAnalysis::GexNbrhoodScores;
        if let Some(scores) = require(&dataset.tcr_scores, analysis) {
            let ranked = index
                .fractions
                .iter()
                .map(|fraction| {
                    let sets = SetCollection::neighborhoods(&dataset.clones, &fraction.gex);
                    rank_sets(test, scores, &sets, analysis, fraction.fraction)
                })
                .collect::<Result<Vec<_>>>()
                .map(|per_fraction| per_fraction.concat());
            if let Some(records) = skip_on_error(analysis, ranked) {
                artifacts.tsv("gex_nbrhood_scores", &records)?;
            }
        }
    }

    if config.analyses.gex_cluster_scores {
        let analysis = FeatureAnalysis::GexClusterScores;
        if let Some(scores) = require(&dataset.tcr_scores, analysis) {
            let sets = SetCollection::clusters(&dataset.clusters(Space::Gex));
            let ranked = rank_sets(test, scores, &sets, analysis, 0.0);
            if let Some(records) = skip_on_error(analysis, ranked) {
                artifacts.tsv("gex_cluster_scores", &records)?;
            }
        }
    }

    Ok(())
}

fn rank_good_cluster_pairs(
    dataset: &Dataset,
    selection: &GoodSelection,
    pairs: &[ClusterPair],
    collaborators: &Collaborators,
    artifacts: &mut Artifacts,
) -> Result<()> {
    if pairs.is_empty() {
        info!(
            target: TARGET_FEATURES,
            "no cluster pair reaches {} good clones; skipping pair rankings",
            selection.min_cluster_size
        );
        return Ok(());
    }

    let keys: Vec<(u32, u32)> = dataset
        .clones
        .iter()
        .map(|c| (c.gex_cluster, c.tcr_cluster))
        .collect();
    let groups: Vec<(String, Vec<usize>)> = pairs
        .iter()
        .map(|pair| {
            let key = (pair.gex_cluster, pair.tcr_cluster);
            (
                format!("{}_{}", pair.gex_cluster, pair.tcr_cluster),
                good_members(&keys, &selection.mask, &key),
            )
        })
        .collect();
    let sets = SetCollection::groups(groups);

    let test = collaborators.rank.as_ref();
    let analysis = FeatureAnalysis::GoodClusterPairGenes;
    if let Some(features) = require(&dataset.gex_features, analysis) {
        let ranked = rank_sets(test, features, &sets, analysis, 0.0);
        if let Some(records) = skip_on_error(analysis, ranked) {
            artifacts.tsv("good_cluster_pair_genes", &records)?;
        }
    }
    let analysis = FeatureAnalysis::GoodClusterPairTcrScores;
    if let Some(scores) = require(&dataset.tcr_scores, analysis) {
        let ranked = rank_sets(test, scores, &sets, analysis, 0.0);
        if let Some(records) = skip_on_error(analysis, ranked) {
            artifacts.tsv("good_cluster_pair_tcr_scores", &records)?;
        }
    }
    Ok(())
}

fn run_recluster_passes(
    config: &RunConfig,
    dataset: &Dataset,
    selection: &GoodSelection,
    collaborators: &Collaborators,
    artifacts: &mut Artifacts,
) -> Result<(Vec<ReclusterPass>, Vec<PassSummary>)> {
    let mut passes = Vec::new();
    let mut summaries = Vec::new();
    let min_size = selection.min_cluster_size;

    let tags: Vec<SubsetTag> = [
        (SubsetTag::Good, config.analyses.recluster_good),
        (SubsetTag::Full, config.analyses.recluster_full),
    ]
    .into_iter()
    .filter(|(_, enabled)| *enabled)
    .map(|(tag, _)| tag)
    .collect();
    if tags.is_empty() {
        return Ok((passes, summaries));
    }
    if selection.num_good() < min_size {
        info!(
            target: TARGET_RECLUSTER,
            "skipping re-clustering: {} good clones, need {}",
            selection.num_good(),
            min_size
        );
        return Ok((passes, summaries));
    }

    for tag in tags {
        let subset: Vec<usize> = match tag {
            SubsetTag::Good => selection.good_indices(),
            SubsetTag::Full => (0..dataset.len()).collect(),
        };
        let outcome = recluster_subset(collaborators.recluster.as_ref(), dataset, tag, &subset);
        let Some(pass) = skip_on_error(format!("{} re-clustering", tag), outcome).flatten() else {
            continue;
        };

        let good_clusters = pass.good_clusters(&selection.mask, min_size);
        info!(
            target: TARGET_RECLUSTER,
            "{} re-clustering: cluster good counts {:?}",
            tag,
            pass.good_counts(&selection.mask)
        );
        let analysis = FeatureAnalysis::GoodAvgClusterGenes(tag);
        if good_clusters.is_empty() {
            info!(
                target: TARGET_RECLUSTER,
                "{} re-clustering: no cluster reaches {} good clones; skipping {}",
                tag,
                min_size,
                analysis
            );
        } else if let Some(features) = require(&dataset.gex_features, analysis) {
            let groups = good_clusters
                .iter()
                .map(|&cluster| {
                    (
                        // same numbering as the clusters_avg column
                        (cluster + 1).to_string(),
                        good_members(&pass.clusters, &selection.mask, &Some(cluster)),
                    )
                })
                .collect();
            let ranked: Result<Vec<FeatureRecord>> = rank_sets(
                collaborators.rank.as_ref(),
                features,
                &SetCollection::groups(groups),
                analysis,
                0.0,
            );
            if let Some(records) = skip_on_error(analysis, ranked) {
                artifacts.tsv(&analysis.to_string(), &records)?;
            }
        }

        summaries.push(PassSummary {
            tag: tag.to_string(),
            subset_size: pass.subset_size(),
            num_clusters: pass.num_clusters(),
            num_good_clusters: good_clusters.len(),
        });
        passes.push(pass);
    }

    Ok((passes, summaries))
}

/// Logs a failed optional step and lets the run carry on without it
fn skip_on_error<T>(step: impl fmt::Display, outcome: Result<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(target: TARGET_PIPELINE, "skipping {}: {:#}", step, err);
            None
        }
    }
}

fn require(matrix: &Option<FeatureMatrix>, analysis: FeatureAnalysis) -> Option<&FeatureMatrix> {
    if matrix.is_none() {
        info!(
            target: TARGET_FEATURES,
            "skipping {}: required feature table was not loaded", analysis
        );
    }
    matrix.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Analyses;
    use crate::data::{fixtures::clone, Embedding};
    use crate::distance::DistanceMatrix;
    use crate::features::RankRow;
    use crate::neighbors::NeighborSets;
    use crate::overlap::OverlapRow;
    use crate::recluster::{NeighborGraph, Reclustering};
    use anyhow::bail;
    use std::fs;

    struct UnavailableLayout;

    impl ReclusterProvider for UnavailableLayout {
        fn embed_and_cluster(
            &self,
            _graph: &NeighborGraph,
            _combined: &DistanceMatrix,
        ) -> Result<Reclustering> {
            bail!("layout backend unavailable")
        }
    }

    struct UnavailableRanking;

    impl RankTest for UnavailableRanking {
        fn rank_features(
            &self,
            _features: &FeatureMatrix,
            _sets: &[Vec<usize>],
            _pval_threshold: f64,
        ) -> Result<Vec<RankRow>> {
            bail!("ranking backend unavailable")
        }
    }

    /// Reports every clone below `cutoff` as maximally significant in nbr_nbr
    struct CutoffOverlap {
        cutoff: usize,
    }

    impl OverlapTest for CutoffOverlap {
        fn neighbor_neighbor(
            &self,
            groups: &ChainGroups,
            nbrs_a: &NeighborSets,
            _nbrs_b: &NeighborSets,
            _pval_threshold: f64,
        ) -> Result<Vec<OverlapRow>> {
            Ok((0..self.cutoff.min(groups.len()))
                .map(|clone_index| OverlapRow {
                    clone_index,
                    conga_score: 1e-3,
                    significance: 3.0,
                    overlap: nbrs_a.k(),
                    expected_overlap: 0.1,
                    nbr_size: nbrs_a.k(),
                    reference_size: nbrs_a.k(),
                    population: groups.len(),
                })
                .collect())
        }

        fn neighbor_cluster(
            &self,
            _groups: &ChainGroups,
            _nbrs: &NeighborSets,
            _clusters: &[u32],
            _pval_threshold: f64,
        ) -> Result<Vec<OverlapRow>> {
            Ok(Vec::new())
        }
    }

    fn dataset() -> Dataset {
        let clones = (0..20)
            .map(|i| clone(i, &format!("A{}", i), &format!("B{}", i), (i % 2) as u32, (i % 2) as u32))
            .collect();
        let rows = |scale: f64| (0..20).map(|i| vec![i as f64 * scale, (i % 4) as f64]).collect();
        Dataset::new(
            clones,
            Embedding::from_rows("gex", rows(1.0)).unwrap(),
            Embedding::from_rows("tcr", rows(2.0)).unwrap(),
            None,
            None,
        )
        .unwrap()
    }

    fn config(prefix: &str) -> RunConfig {
        RunConfig {
            outfile_prefix: prefix.to_string(),
            nbr_fracs: vec![0.1, 0.2],
            min_cluster_size: 3,
            analyses: Analyses {
                nbrhood_overlaps: true,
                recluster_good: true,
                recluster_full: true,
                ..Analyses::default()
            },
            ..RunConfig::default()
        }
    }

    fn collaborators(cutoff: usize) -> Collaborators {
        Collaborators {
            overlap: Box::new(CutoffOverlap { cutoff }),
            ..Collaborators::default()
        }
    }

    #[test]
    fn test_good_clones_drive_pairs_and_reclustering() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let summary = run(&config(&prefix), dataset(), &collaborators(8)).unwrap();

        assert_eq!(summary.num_clones, 20);
        assert_eq!(summary.num_good, 8);
        assert_eq!(summary.min_cluster_size, 3);
        // clones 0..8 alternate between pairs (0,0) and (1,1)
        assert_eq!(summary.good_cluster_pairs.len(), 2);
        assert!(summary.good_cluster_pairs.iter().all(|p| p.count == 4));
        assert_eq!(summary.num_overlap_records, 16);

        let tags: Vec<&str> = summary.recluster_passes.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["good", "full"]);
        assert_eq!(summary.recluster_passes[0].subset_size, 8);
        assert_eq!(summary.recluster_passes[1].subset_size, 20);

        for stem in ["cluster_interactions", "graph_graph_overlaps", "good_cluster_pairs", "final_obs"] {
            assert!(tsv_path(&prefix, stem).exists(), "missing {}", stem);
        }
        assert!(summary_path(&prefix).exists());

        let final_obs = fs::read_to_string(tsv_path(&prefix, "final_obs")).unwrap();
        let header: Vec<&str> = final_obs.lines().next().unwrap().split('\t').collect();
        assert!(header.contains(&"clusters_avg_good"));
        assert!(header.contains(&"X_umap_avg_full_2"));
        // a clone outside the good subset is encoded as cluster 0 in the good pass
        let column = header.iter().position(|h| *h == "clusters_avg_good").unwrap();
        let last: Vec<&str> = final_obs.lines().last().unwrap().split('\t').collect();
        assert_eq!(last[column], "0");
    }

    #[test]
    fn test_failed_reclustering_still_writes_final_table() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let collaborators = Collaborators {
            recluster: Box::new(UnavailableLayout),
            ..collaborators(8)
        };
        let summary = run(&config(&prefix), dataset(), &collaborators).unwrap();

        assert!(summary.recluster_passes.is_empty());
        assert_eq!(summary.num_good, 8);
        assert!(tsv_path(&prefix, "final_obs").exists());
        assert!(summary_path(&prefix).exists());
        let final_obs = fs::read_to_string(tsv_path(&prefix, "final_obs")).unwrap();
        assert!(!final_obs.contains("clusters_avg"));
    }

    #[test]
    fn test_failed_ranking_skips_only_that_table() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let base = dataset();
        let features =
            FeatureMatrix::new("genes", vec!["CD8A".into()], (0..20).map(|i| vec![i as f64]).collect())
                .unwrap();
        let dataset = Dataset::new(base.clones, base.gex, base.tcr, Some(features), None).unwrap();

        let mut config = config(&prefix);
        config.analyses.tcr_cluster_genes = true;
        config.analyses.tcr_segment_genes = true;
        let collaborators = Collaborators {
            rank: Box::new(UnavailableRanking),
            ..collaborators(8)
        };
        let summary = run(&config, dataset, &collaborators).unwrap();

        assert!(!tsv_path(&prefix, "tcr_cluster_genes").exists());
        assert!(!tsv_path(&prefix, "good_cluster_pair_genes").exists());
        assert_eq!(summary.recluster_passes.len(), 2);
        assert!(tsv_path(&prefix, "good_cluster_pairs").exists());
        assert!(tsv_path(&prefix, "final_obs").exists());
        assert!(summary_path(&prefix).exists());
    }

    #[test]
    fn test_too_few_good_clones_skip_reclustering() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let summary = run(&config(&prefix), dataset(), &collaborators(2)).unwrap();

        assert_eq!(summary.num_good, 2);
        assert!(summary.good_cluster_pairs.is_empty());
        assert!(summary.recluster_passes.is_empty());
        let final_obs = fs::read_to_string(tsv_path(&prefix, "final_obs")).unwrap();
        assert!(!final_obs.contains("clusters_avg"));
    }

    #[test]
    fn test_disabled_overlaps_leave_floor_scores() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let mut config = config(&prefix);
        config.analyses.nbrhood_overlaps = false;
        let summary = run(&config, dataset(), &collaborators(20)).unwrap();

        assert_eq!(summary.num_good, 0);
        assert_eq!(summary.num_overlap_records, 0);
        assert!(!tsv_path(&prefix, "graph_graph_overlaps").exists());
    }

    #[test]
    fn test_excluded_clusters_are_removed_first() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        let mut config = config(&prefix);
        config.exclude_gex_clusters = vec![1];
        let summary = run(&config, dataset(), &collaborators(0)).unwrap();

        assert_eq!(summary.num_clones_loaded, 20);
        assert_eq!(summary.num_clones_excluded, 10);
        assert_eq!(summary.num_clones, 10);
    }
}
